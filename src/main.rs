use std::path::Path;
use std::process;

use hash_tables::logger::initialize_logger;
use hash_tables::{AppConfig, TableConfig};
use log::{error, info, warn};

use crate::event_loop::terminal_event_loop::{show_help, TerminalEventLoop};
use crate::event_loop::EventLoop;

mod event_loop;

const CONFIG_PATH: &str = "config.toml";

fn init() -> TableConfig {
    if !Path::new(CONFIG_PATH).exists() {
        warn!("{} not found, using default table settings", CONFIG_PATH);
        return TableConfig::default();
    }

    match AppConfig::load(CONFIG_PATH) {
        Ok(config) => config.table,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

fn main() {
    initialize_logger();
    println!("=== Interactive Hash Table Shell ===");

    let config = init();
    let mut table = match config.build::<String, String>() {
        Ok(table) => table,
        Err(e) => {
            error!("Failed to create table: {}", e);
            process::exit(1);
        }
    };

    println!("✓ Table initialized");
    println!("  - Strategy: {}", config.strategy);
    println!("  - Initial capacity: {}", config.initial_capacity);
    println!("  - Load factor threshold: {}", config.load_factor_threshold);
    info!("shell started with {} table", config.strategy);

    println!("\nEntering interactive mode...");
    show_help();

    let mut event_loop = TerminalEventLoop {};
    if let Err(e) = event_loop.run(table.as_mut(), config.strategy) {
        error!("Event loop failed: {}", e);
        process::exit(1);
    }
}
