pub mod api;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod models;
pub mod tui;

use clap::Parser;

use crate::config::{AdminConfig, Cli};
use crate::error::AdminError;

fn main() {
    let cli = Cli::parse();
    let config = AdminConfig::from_cli(&cli);

    if let Err(e) = logging::init(&config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // TUI 线程用 Handle::block_on 等待请求，IO 驱动需要由工作线程推进
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let backend = match api::HttpBackend::new(&config.base_url) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };
    if config.userid.is_empty() {
        tracing::warn!("no userid configured, requests will be rejected locally");
    }
    tracing::info!(base_url = %backend.base_url(), userid = %config.userid, "starting");

    let mut page = core::PageController::new(backend, config.userid.clone(), &config.download_dir);
    let result = match cli.command {
        None => {
            let mut app = tui::App::new(page, runtime.handle().clone());
            app.run().map_err(AdminError::from)
        }
        Some(command) => runtime.block_on(commands::run(&mut page, command)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
