//! `tasklist` entry point.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::BufRead;
use std::sync::mpsc;
use tasklist_cli::config::{AppConfig, Cli};
use tasklist_cli::repl::Repl;
use tasklist_core::{
    core_version, init_logging, Controller, SqliteSlot, SystemClock, TaskPersistence, TaskStore,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::resolve(&cli)?;

    // Logging is optional for an interactive session.
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok version={} db_path={}",
        core_version(),
        config.db_path.display()
    );

    let slot = SqliteSlot::open(&config.db_path)
        .with_context(|| format!("failed to open task database `{}`", config.db_path.display()))?;
    let store = TaskStore::open(TaskPersistence::new(slot), SystemClock);
    let controller = Controller::new(store, chrono::Local);

    let (sender, lines) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });

    println!("tasklist {} - type :help for commands", core_version());
    Repl::new(controller, lines, std::io::stdout()).run()
}
