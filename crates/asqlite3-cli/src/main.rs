// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! asqlite3 - run SQL against a database through the async connection layer.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod backup;
mod dump;
mod query;

use std::path::PathBuf;

use asqlite3::AsqliteError;
use asqlite3_config::Asqlite3Config;
use clap::{Parser, Subcommand};
use tracing::debug;

/// asqlite3 - async SQLite from the command line.
#[derive(Parser, Debug)]
#[command(name = "asqlite3", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database to open, overriding `connection.database`.
    #[arg(long, short = 'd', global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one statement and print the rows it returns.
    Query {
        sql: String,
        /// Positional parameter; repeat for each `?`.
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,
        /// Named parameter as `name=value`.
        #[arg(long = "named", short = 'n', conflicts_with = "params")]
        named: Vec<String>,
        /// Print the column names first.
        #[arg(long)]
        header: bool,
    },
    /// Run a script of semicolon-separated statements.
    Script {
        /// Script file; `-` reads standard input.
        file: PathBuf,
    },
    /// Write the database as SQL text.
    Dump {
        /// Output file; standard output when omitted.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Copy the database into another database file.
    Backup { target: PathBuf },
    /// Replace the database contents with those of another database file.
    Restore { source: PathBuf },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => asqlite3_config::load_and_validate_path(path),
        None => asqlite3_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            asqlite3_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    if let Some(database) = cli.database.clone() {
        config.connection.database = database;
    }

    init_tracing(&config.logging.level);
    debug!(database = %config.connection.database, "configuration loaded");

    if let Err(e) = run(cli.command, config).await {
        eprintln!("asqlite3: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Asqlite3Config) -> Result<(), AsqliteError> {
    let conn = asqlite3::connect_with(config.connection).await?;
    conn.scope(|conn| async move {
        match command {
            Commands::Query {
                sql,
                params,
                named,
                header,
            } => {
                let params = query::parse_params(&params, &named)?;
                let mut out = std::io::stdout().lock();
                query::run_query(&conn, &sql, params, header, &mut out).await
            }
            Commands::Script { file } => {
                let script = query::read_script(&file)?;
                query::run_script(&conn, script).await
            }
            Commands::Dump { output } => dump::run_dump(&conn, output.as_deref()).await,
            Commands::Backup { target } => backup::run_backup(&conn, &target).await,
            Commands::Restore { source } => backup::run_restore(&conn, &source).await,
        }
    })
    .await
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("asqlite3={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
