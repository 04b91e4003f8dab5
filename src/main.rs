use pagedb::repl;
use pagedb::storage;

use clap::Parser;
use std::fs::OpenOptions;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "mysqlite", version = VERSION, about = "Tiny B+tree-backed database.")]
struct Cli {
    /// Path to the database file. Created if it does not already exist.
    db_path: String,
}

fn main() {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("mysqlite.log")
        .expect("failed to open log file");

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut table = match storage::Table::open(&cli.db_path) {
        Ok(table) => table,
        Err(e) => {
            repl::print_error(&format!("unable to open database: {}", e));
            std::process::exit(1);
        }
    };

    let exit_code = repl::run(&mut table);
    std::process::exit(exit_code);
}
