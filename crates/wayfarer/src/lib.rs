//! # Wayfarer Game Server - Main Entry Point
//!
//! Multi-world grid exploration server. This entry point handles CLI
//! parsing, configuration loading, and application lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! wayfarer
//!
//! # Specify custom configuration
//! wayfarer --config production.toml
//!
//! # Override specific settings
//! wayfarer --resources /opt/wayfarer/maps --port 9000 --log-level debug
//!
//! # Headless operation (no world requires a VSID)
//! wayfarer --no-visualizer
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created. The
//! `[[worlds]]` manifest lists the worlds to boot; at most one may set
//! `visualize = true`.
//!
//! ## Signal Handling
//!
//! The server drains gracefully on SIGINT (Ctrl+C) and SIGTERM; a second
//! signal exits immediately.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the Wayfarer game server.
///
/// Handles the complete application lifecycle:
/// 1. Command-line argument parsing
/// 2. Configuration loading for logging settings
/// 3. Logging system initialization
/// 4. Application creation and execution
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration early so logging honors its settings.
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {e:?}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export configuration types for potential library usage.
pub use config::{AppConfig as Config, HostSettings, LimitSettings, LoggingSettings, WorldEntry};
