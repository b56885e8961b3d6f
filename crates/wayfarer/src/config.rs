//! Configuration management for the Wayfarer game server.
//!
//! This module handles loading, validation, and conversion of server
//! configuration from TOML files and command-line arguments. One
//! configuration file describes the whole host: shared session limits,
//! logging, and the manifest of worlds to boot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use wayfarer_event_system::ConsoleColor;
use world_server::ServerConfig;

fn default_resources_path() -> String {
    "resources".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_challenge_port_start() -> u16 {
    8081
}

fn default_max_sessions_per_client() -> usize {
    20
}

fn default_idle_timeout_secs() -> u64 {
    5
}

fn default_sweep_interval_ms() -> u64 {
    1000
}

fn default_action_cooldown_ms() -> u64 {
    50
}

fn default_body_read_timeout_secs() -> u64 {
    2
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host-wide server settings
    pub server: HostSettings,
    /// Session limit settings shared by every world
    #[serde(default)]
    pub limits: LimitSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
    /// Manifest of worlds to boot; when empty, a single default world is
    /// synthesized from the host settings
    #[serde(default)]
    pub worlds: Vec<WorldEntry>,
}

/// Host-wide server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettings {
    /// Base directory for world map images
    #[serde(default = "default_resources_path")]
    pub resources_path: String,
    /// Port of the primary world
    #[serde(default = "default_port")]
    pub port: u16,
    /// First port handed to manifest worlds that do not pin one
    #[serde(default = "default_challenge_port_start")]
    pub challenge_port_start: u16,
    /// When true, no world is visualized and none requires a VSID
    #[serde(default)]
    pub no_visualizer: bool,
}

/// Session limit settings applied to every world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Maximum live sessions a single client may hold per world
    #[serde(default = "default_max_sessions_per_client")]
    pub max_sessions_per_client: usize,
    /// Seconds without a successful move before a session is evicted
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Idle sweep interval in milliseconds
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Post-move cooldown in milliseconds
    #[serde(default = "default_action_cooldown_ms")]
    pub action_cooldown_ms: u64,
    /// Bound on reading a request body, in seconds
    #[serde(default = "default_body_read_timeout_secs")]
    pub body_read_timeout_secs: u64,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_sessions_per_client: default_max_sessions_per_client(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_ms: default_sweep_interval_ms(),
            action_cooldown_ms: default_action_cooldown_ms(),
            body_read_timeout_secs: default_body_read_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

/// One world in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldEntry {
    /// Display name of the world
    pub name: String,
    /// Accent color used when presenting this world
    pub color: ConsoleColor,
    /// Port to serve on; unpinned worlds draw from `challenge_port_start`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Map image file, relative to the resources directory
    pub map: String,
    /// Whether the visualization sink attaches to this world
    #[serde(default)]
    pub visualize: bool,
}

/// A world entry with its port assigned and visualizer policy applied.
#[derive(Debug, Clone)]
pub struct ResolvedWorld {
    pub name: String,
    pub color: ConsoleColor,
    pub port: u16,
    pub map: String,
    pub visualize: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: HostSettings {
                resources_path: default_resources_path(),
                port: default_port(),
                challenge_port_start: default_challenge_port_start(),
                no_visualizer: false,
            },
            limits: LimitSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
            worlds: vec![WorldEntry {
                name: "main".to_string(),
                color: ConsoleColor::Cyan,
                port: None,
                map: "main.png".to_string(),
                visualize: true,
            }],
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at
    /// the specified path and returns the default configuration.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Resolves the world manifest: assigns ports to unpinned worlds and
    /// applies the `no_visualizer` override.
    ///
    /// The first world without a pinned port gets the primary port; later
    /// ones draw sequentially from `challenge_port_start`.
    pub fn resolved_worlds(&self) -> Vec<ResolvedWorld> {
        let entries: Vec<WorldEntry> = if self.worlds.is_empty() {
            vec![WorldEntry {
                name: "main".to_string(),
                color: ConsoleColor::Cyan,
                port: None,
                map: "main.png".to_string(),
                visualize: !self.server.no_visualizer,
            }]
        } else {
            self.worlds.clone()
        };

        let mut primary_taken = false;
        let mut next_challenge_port = self.server.challenge_port_start;
        entries
            .into_iter()
            .map(|entry| {
                let port = match entry.port {
                    Some(port) => port,
                    None if !primary_taken => {
                        primary_taken = true;
                        self.server.port
                    }
                    None => {
                        let port = next_challenge_port;
                        next_challenge_port += 1;
                        port
                    }
                };
                ResolvedWorld {
                    name: entry.name,
                    color: entry.color,
                    port,
                    map: entry.map,
                    visualize: entry.visualize && !self.server.no_visualizer,
                }
            })
            .collect()
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing
    /// the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.resources_path.is_empty() {
            return Err("Resources path cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!("Invalid log level: {}", self.logging.level));
        }

        let worlds = self.resolved_worlds();
        let visualized = worlds.iter().filter(|world| world.visualize).count();
        if visualized > 1 {
            return Err(format!(
                "At most one world may be visualized, found {visualized}"
            ));
        }

        let mut names = std::collections::HashSet::new();
        let mut ports = std::collections::HashSet::new();
        for world in &worlds {
            if world.name.is_empty() {
                return Err("World names cannot be empty".to_string());
            }
            if !names.insert(world.name.clone()) {
                return Err(format!("Duplicate world name: {}", world.name));
            }
            if !ports.insert(world.port) {
                return Err(format!("Duplicate world port: {}", world.port));
            }
            if world.map.is_empty() {
                return Err(format!("World '{}' has no map file", world.name));
            }
        }

        Ok(())
    }

    /// Converts one resolved world into the server core's configuration and
    /// the absolute path of its map.
    pub fn to_server_config(
        &self,
        world: &ResolvedWorld,
    ) -> Result<(ServerConfig, PathBuf), Box<dyn std::error::Error>> {
        let bind_address = format!("0.0.0.0:{}", world.port).parse()?;
        let map_path = PathBuf::from(&self.server.resources_path).join(&world.map);
        Ok((
            ServerConfig {
                name: world.name.clone(),
                bind_address,
                visualize: world.visualize,
                max_sessions_per_client: self.limits.max_sessions_per_client,
                idle_timeout_secs: self.limits.idle_timeout_secs,
                sweep_interval_ms: self.limits.sweep_interval_ms,
                action_cooldown_ms: self.limits.action_cooldown_ms,
                body_read_timeout_secs: self.limits.body_read_timeout_secs,
                max_body_bytes: self.limits.max_body_bytes,
            },
            map_path,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_visualizes_one_world() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let worlds = config.resolved_worlds();
        assert_eq!(worlds.len(), 1);
        assert_eq!(worlds[0].port, 8080);
        assert!(worlds[0].visualize);
    }

    #[test]
    fn no_visualizer_strips_the_vsid_requirement() {
        let mut config = AppConfig::default();
        config.server.no_visualizer = true;
        let worlds = config.resolved_worlds();
        assert!(worlds.iter().all(|world| !world.visualize));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unpinned_worlds_draw_from_the_challenge_port_range() {
        let mut config = AppConfig::default();
        config.worlds = vec![
            WorldEntry {
                name: "main".to_string(),
                color: ConsoleColor::Cyan,
                port: None,
                map: "main.png".to_string(),
                visualize: true,
            },
            WorldEntry {
                name: "cave".to_string(),
                color: ConsoleColor::DarkYellow,
                port: None,
                map: "cave.png".to_string(),
                visualize: false,
            },
            WorldEntry {
                name: "spire".to_string(),
                color: ConsoleColor::Green,
                port: Some(9100),
                map: "spire.png".to_string(),
                visualize: false,
            },
        ];

        let ports: Vec<u16> = config.resolved_worlds().iter().map(|w| w.port).collect();
        assert_eq!(ports, vec![8080, 8081, 9100]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn two_visualized_worlds_are_rejected() {
        let mut config = AppConfig::default();
        config.worlds = vec![
            WorldEntry {
                name: "a".to_string(),
                color: ConsoleColor::Cyan,
                port: Some(9000),
                map: "a.png".to_string(),
                visualize: true,
            },
            WorldEntry {
                name: "b".to_string(),
                color: ConsoleColor::Red,
                port: Some(9001),
                map: "b.png".to_string(),
                visualize: true,
            },
        ];
        assert!(config.validate().is_err());

        // Suppressing the visualizer resolves the conflict.
        config.server.no_visualizer = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_ports_and_names_are_rejected() {
        let mut config = AppConfig::default();
        config.worlds = vec![
            WorldEntry {
                name: "a".to_string(),
                color: ConsoleColor::Cyan,
                port: Some(9000),
                map: "a.png".to_string(),
                visualize: false,
            },
            WorldEntry {
                name: "a".to_string(),
                color: ConsoleColor::Red,
                port: Some(9001),
                map: "b.png".to_string(),
                visualize: false,
            },
        ];
        assert!(config.validate().unwrap_err().contains("Duplicate world name"));

        config.worlds[1].name = "b".to_string();
        config.worlds[1].port = Some(9000);
        assert!(config.validate().unwrap_err().contains("Duplicate world port"));
    }

    #[test]
    fn server_config_conversion_carries_the_limits() {
        let mut config = AppConfig::default();
        config.limits.max_sessions_per_client = 3;
        config.limits.action_cooldown_ms = 10;
        let world = &config.resolved_worlds()[0];
        let (server_config, map_path) = config.to_server_config(world).unwrap();
        assert_eq!(server_config.max_sessions_per_client, 3);
        assert_eq!(server_config.action_cooldown_ms, 10);
        assert_eq!(server_config.bind_address.port(), 8080);
        assert!(map_path.ends_with("resources/main.png"));
    }

    #[tokio::test]
    async fn missing_config_file_is_created_with_defaults() {
        let path = std::env::temp_dir().join(format!(
            "wayfarer-config-{}.toml",
            std::process::id()
        ));
        tokio::fs::remove_file(&path).await.ok();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert!(config.validate().is_ok());

        // A second load reads the file that was just written.
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.server.port, config.server.port);
        tokio::fs::remove_file(&path).await.ok();
    }
}
