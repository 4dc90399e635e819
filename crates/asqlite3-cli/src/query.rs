// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `asqlite3 query` and `asqlite3 script` command implementation.

use std::io::{Read, Write};
use std::path::Path;

use asqlite3::{AsqliteError, Connection, Params, Value};
use tracing::debug;

/// Build the parameter set from command-line values. Both lists empty means
/// no parameters.
pub fn parse_params(positional: &[String], named: &[String]) -> Result<Option<Params>, AsqliteError> {
    if !named.is_empty() {
        let pairs = named
            .iter()
            .map(|pair| {
                pair.split_once('=')
                    .map(|(name, value)| (name.to_string(), parse_value(value)))
                    .ok_or_else(|| {
                        AsqliteError::Usage(format!("named parameter `{pair}` must be name=value"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Some(Params::Named(pairs)));
    }
    if positional.is_empty() {
        return Ok(None);
    }
    Ok(Some(Params::Positional(
        positional.iter().map(|v| parse_value(v)).collect(),
    )))
}

/// Integers and reals are bound as numbers, `NULL` as null, anything else as text.
pub fn parse_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else if let Ok(n) = raw.parse::<i64>() {
        Value::Integer(n)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Real(f)
    } else {
        Value::Text(raw.to_string())
    }
}

pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}

/// Run `sql` and write returned rows tab-separated to `out`.
pub async fn run_query<W: Write>(
    conn: &Connection,
    sql: &str,
    params: Option<Params>,
    header: bool,
    out: &mut W,
) -> Result<(), AsqliteError> {
    let cur = conn.execute(sql, params).await?;
    if header && let Some(columns) = cur.description() {
        writeln!(out, "{}", columns.join("\t")).map_err(io_error)?;
    }
    let rows = cur.fetchall().await?;
    for row in &rows {
        let line = row
            .values()
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(out, "{line}").map_err(io_error)?;
    }
    // An implicit transaction opened by the statement ends with the command.
    if conn.in_transaction().await? {
        conn.commit().await?;
    }
    if cur.description().is_none() && cur.rowcount() >= 0 {
        eprintln!("{} row(s) changed", cur.rowcount());
    }
    debug!(rows = rows.len(), "query complete");
    Ok(())
}

pub fn read_script(path: &Path) -> Result<String, AsqliteError> {
    let mut script = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut script)
            .map_err(io_error)?;
    } else {
        script = std::fs::read_to_string(path)
            .map_err(|e| AsqliteError::Usage(format!("cannot read {}: {e}", path.display())))?;
    }
    Ok(script)
}

pub async fn run_script(conn: &Connection, script: String) -> Result<(), AsqliteError> {
    conn.executescript(script).await?;
    if conn.in_transaction().await? {
        conn.commit().await?;
    }
    debug!("script complete");
    Ok(())
}

pub(crate) fn io_error(e: std::io::Error) -> AsqliteError {
    AsqliteError::Internal(format!("output failed: {e}"))
}
