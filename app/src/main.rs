//! FILENAME: app/src/main.rs
// PURPOSE: Entry point. Opens the configured stock database and reports what it holds.

use std::path::PathBuf;

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(stockbook_lib::CONFIG_FILE));

    match stockbook_lib::run(&config_path) {
        Ok(session) => {
            let rows = session.table().map(|t| t.len()).unwrap_or(0);
            println!("{} rows, {} aliases", rows, session.aliases().len());
            if let Some(log_path) = stockbook_lib::get_log_path() {
                println!("Log: {}", log_path.display());
            }
        }
        Err(e) => {
            eprintln!("stockbook: {}", e);
            std::process::exit(1);
        }
    }
}
