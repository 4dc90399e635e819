// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `asqlite3 dump` command implementation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use asqlite3::{AsqliteError, Connection};
use futures::StreamExt;

use crate::query::io_error;

/// Write the SQL dump to `output`, or standard output when `None`.
pub async fn run_dump(conn: &Connection, output: Option<&Path>) -> Result<(), AsqliteError> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| AsqliteError::Usage(format!("cannot create {}: {e}", path.display())))?;
            let mut out = BufWriter::new(file);
            let lines = write_dump(conn, &mut out).await?;
            out.flush().map_err(io_error)?;
            eprintln!("Dump complete: {lines} statements written to {}", path.display());
            Ok(())
        }
        None => {
            let mut out = std::io::stdout().lock();
            write_dump(conn, &mut out).await.map(|_| ())
        }
    }
}

/// Stream dump lines into `out`. Returns the number of lines written.
pub async fn write_dump<W: Write>(conn: &Connection, out: &mut W) -> Result<usize, AsqliteError> {
    let mut lines = conn.iterdump();
    let mut written = 0;
    while let Some(line) = lines.next().await {
        writeln!(out, "{}", line?).map_err(io_error)?;
        written += 1;
    }
    Ok(written)
}
