//! Command-line interface handling for the Wayfarer game server.
//!
//! This module provides command-line argument parsing using the `clap`
//! crate. The CLI only injects plain values that override the configuration
//! file; all behavior lives behind the configuration types.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// This structure holds all the command-line options that can be used to
/// override configuration file settings or provide runtime parameters.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the map resources directory
    pub resources_path: Option<PathBuf>,
    /// Optional override for the primary world's port
    pub port: Option<u16>,
    /// Whether to force all worlds headless (no VSID requirement)
    pub no_visualizer: bool,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    ///
    /// # Returns
    ///
    /// A `CliArgs` instance containing all parsed command-line options.
    pub fn parse() -> Self {
        let matches = Command::new("Wayfarer Game Server")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Multi-world grid exploration server for client agents")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("config.toml"),
            )
            .arg(
                Arg::new("resources")
                    .short('r')
                    .long("resources")
                    .value_name("DIR")
                    .help("Directory containing world map images"),
            )
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .value_parser(clap::value_parser!(u16))
                    .help("Port of the primary world"),
            )
            .arg(
                Arg::new("no-visualizer")
                    .long("no-visualizer")
                    .help("Run every world headless; no world will require a VSID")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .expect("Default config path should always be set"),
            ),
            resources_path: matches.get_one::<String>("resources").map(PathBuf::from),
            port: matches.get_one::<u16>("port").copied(),
            no_visualizer: matches.get_flag("no-visualizer"),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}
