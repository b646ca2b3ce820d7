//! `scenegeo-cli` – scenegeo demo runner
//!
//! 1. Loads `~/.scenegeo/config.toml`, writing the defaults on first run.
//! 2. Starts a positioning session with a recording renderer and a simulated
//!    pose.
//! 3. Places a ring of annotated points of interest and walks the viewer
//!    north through them, printing the event stream.
//! 4. Intercepts **Ctrl-C** to end the walk early and shut down cleanly.

mod config;
mod demo;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use tracing::{error, warn};

fn main() -> ExitCode {
    // Before the Tokio runtime exists; see telemetry::init_tracing.
    let _guard = scenegeo_runtime::init_tracing("scenegeo");

    print_banner();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the walk …".yellow().bold());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    println!(
        "  {} estimates · scene limit {} m · {} Hz\n",
        format!("{:?}", cfg.engine.estimate_method).bold(),
        cfg.engine.scene_limit,
        cfg.tick_hz
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to start Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(demo::run(cfg, shutdown)) {
        Ok(()) => {
            println!("  {}", "✓ Session closed.".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {}", "Demo failed".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ____                       ______         "#.bold().cyan());
    println!("{}", r#"  / __/______ ___  ___ ___ _/ ___/__ ___   "#.bold().cyan());
    println!("{}", r#" _\ \/ __/ -_) _ \/ -_) _ `/ (_ / -_) _ \  "#.bold().cyan());
    println!("{}", r#"/___/\__/\__/_//_/\__/\_, /\___/\__/\___/  "#.bold().cyan());
    println!("{}", r#"                     /___/                 "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "scenegeo".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Geolocated points of interest in a tracked AR scene");
    println!();
}
