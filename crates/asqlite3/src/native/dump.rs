// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL text dump of a database.

use asqlite3_core::AsqliteError;
use rusqlite::Connection;

/// Produce the statements that recreate the database behind `conn`, wrapped in
/// a single transaction.
pub(crate) fn iterdump(conn: &Connection) -> Result<Vec<String>, AsqliteError> {
    let mut lines = vec!["BEGIN TRANSACTION;".to_string()];
    let mut writable_schema = false;
    let mut sequence = Vec::new();

    for (name, sql) in schema_entries(conn, "\"type\" == 'table' ORDER BY \"name\"")? {
        if name == "sqlite_sequence" {
            sequence = sequence_lines(conn)?;
            continue;
        } else if name == "sqlite_stat1" {
            lines.push("ANALYZE \"sqlite_master\";".to_string());
        } else if name.starts_with("sqlite_") {
            continue;
        } else if sql.starts_with("CREATE VIRTUAL TABLE") {
            if !writable_schema {
                writable_schema = true;
                lines.push("PRAGMA writable_schema=ON;".to_string());
            }
            lines.push(format!(
                "INSERT INTO sqlite_master(type,name,tbl_name,rootpage,sql)VALUES('table',{0},{0},0,{1});",
                quote_literal(&name),
                quote_literal(&sql),
            ));
        } else {
            lines.push(format!("{sql};"));
        }
        table_rows(conn, &name, &mut lines)?;
    }

    for (_, sql) in schema_entries(conn, "\"type\" IN ('index', 'trigger', 'view')")? {
        lines.push(format!("{sql};"));
    }
    if writable_schema {
        lines.push("PRAGMA writable_schema=OFF;".to_string());
    }
    // Sequence values go last so the row inserts above cannot bump them.
    lines.extend(sequence);
    lines.push("COMMIT;".to_string());
    Ok(lines)
}

fn schema_entries(conn: &Connection, filter: &str) -> Result<Vec<(String, String)>, AsqliteError> {
    let query = format!(
        "SELECT \"name\", \"sql\" FROM \"sqlite_master\" WHERE \"sql\" NOT NULL AND {filter}"
    );
    let mut stmt = conn.prepare(&query)?;
    let entries = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn sequence_lines(conn: &Connection) -> Result<Vec<String>, AsqliteError> {
    let mut lines = vec!["DELETE FROM \"sqlite_sequence\";".to_string()];
    let mut stmt = conn.prepare("SELECT \"name\", \"seq\" FROM \"sqlite_sequence\"")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (table, seq) = row?;
        lines.push(format!(
            "INSERT INTO \"sqlite_sequence\" VALUES({},{seq});",
            quote_literal(&table)
        ));
    }
    Ok(lines)
}

/// One `INSERT` per row, rendered by the engine's `quote()`.
fn table_rows(conn: &Connection, table: &str, lines: &mut Vec<String>) -> Result<(), AsqliteError> {
    let ident = quote_identifier(table);
    let columns = conn
        .prepare(&format!("PRAGMA table_info({ident})"))?
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if columns.is_empty() {
        return Ok(());
    }

    let values = columns
        .iter()
        .map(|column| format!("quote({})", quote_identifier(column)))
        .collect::<Vec<_>>()
        .join(" || ',' || ");
    let prefix = quote_literal(&format!("INSERT INTO {ident} VALUES("));
    let mut stmt = conn.prepare(&format!("SELECT {prefix} || {values} || ')' FROM {ident}"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    for row in rows {
        lines.push(format!("{};", row?));
    }
    Ok(())
}

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn replay(lines: &[String]) -> Connection {
        let fresh = Connection::open_in_memory().unwrap();
        fresh.execute_batch(&lines.join("\n")).unwrap();
        fresh
    }

    #[test]
    fn empty_database_dumps_an_empty_transaction() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(iterdump(&conn).unwrap(), vec!["BEGIN TRANSACTION;", "COMMIT;"]);
    }

    #[test]
    fn one_table_one_row() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(a, b); INSERT INTO t VALUES (1, 'it''s');")
            .unwrap();
        assert_eq!(
            iterdump(&conn).unwrap(),
            vec![
                "BEGIN TRANSACTION;",
                "CREATE TABLE t(a, b);",
                "INSERT INTO \"t\" VALUES(1,'it''s');",
                "COMMIT;",
            ]
        );
    }

    #[test]
    fn schema_objects_and_values_survive_a_replay() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE \"odd \"\"name\"\"\"(id INTEGER PRIMARY KEY AUTOINCREMENT, v);
             INSERT INTO \"odd \"\"name\"\"\"(v) VALUES (NULL), (2.5), (x'00ff'), ('text');
             CREATE INDEX odd_v ON \"odd \"\"name\"\"\"(v);
             CREATE VIEW odd_view AS SELECT v FROM \"odd \"\"name\"\"\";
             CREATE TRIGGER odd_trg AFTER DELETE ON \"odd \"\"name\"\"\" BEGIN SELECT 1; END;",
        )
        .unwrap();

        let lines = iterdump(&conn).unwrap();
        assert_eq!(lines.last().map(String::as_str), Some("COMMIT;"));
        let delete_at = lines
            .iter()
            .position(|l| l == "DELETE FROM \"sqlite_sequence\";")
            .unwrap();
        assert!(lines[delete_at + 1].starts_with("INSERT INTO \"sqlite_sequence\""));

        let fresh = replay(&lines);
        let dump_of_dump = iterdump(&fresh).unwrap();
        assert_eq!(lines, dump_of_dump);

        let types: Vec<String> = fresh
            .prepare("SELECT typeof(v) FROM \"odd \"\"name\"\"\" ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(types, vec!["null", "real", "blob", "text"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn quoted_literals_read_back_unchanged(text in "[^\\x00]{0,24}") {
            let conn = Connection::open_in_memory().unwrap();
            let back: String = conn
                .query_row(&format!("SELECT {}", quote_literal(&text)), [], |r| r.get(0))
                .unwrap();
            prop_assert_eq!(back, text);
        }

        #[test]
        fn quoted_identifiers_name_real_tables(name in "[^\\x00]{1,16}") {
            prop_assume!(!name.to_ascii_lowercase().starts_with("sqlite_"));
            let conn = Connection::open_in_memory().unwrap();
            let ident = quote_identifier(&name);
            conn.execute_batch(&format!("CREATE TABLE {ident}(x); INSERT INTO {ident} VALUES (1);"))
                .unwrap();
            let lines = iterdump(&conn).unwrap();
            let fresh = replay(&lines);
            let count: i64 = fresh
                .query_row(&format!("SELECT COUNT(*) FROM {ident}"), [], |r| r.get(0))
                .unwrap();
            prop_assert_eq!(count, 1);
        }
    }
}
