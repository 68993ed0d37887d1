mod app;
mod config;
mod controller;
mod display;
mod error;
mod menu;

use std::fs::File;

use simplelog::{Config, LevelFilter, WriteLogger};

fn main() {
    let log_file = File::create("/tmp/valise.log").expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    if let Err(err) = app::run() {
        log::error!("fatal: {err}");
        eprintln!("Error: {err}");
        app::render_failure();
        std::process::exit(1);
    }
}
