//! Server configuration types and defaults.
//!
//! This module contains the per-world configuration structure and default
//! values used to initialize and customize world behavior.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for a single world server.
///
/// Contains all necessary parameters to run one world: network settings,
/// presentation policy, and the session limits enforced by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Display name of this world
    pub name: String,

    /// The socket address to bind the world's HTTP listener to
    pub bind_address: SocketAddr,

    /// Whether a visualization sink is attached to this world.
    ///
    /// A visualized world rejects `/connect` requests that carry no visual
    /// identifier, and treats White as the console background color when
    /// validating identifiers against the reserved table.
    pub visualize: bool,

    /// Maximum number of live sessions a single client may hold
    pub max_sessions_per_client: usize,

    /// Seconds without a successful move before a session is evicted
    pub idle_timeout_secs: u64,

    /// Interval of the idle sweep in milliseconds
    pub sweep_interval_ms: u64,

    /// Cooldown applied after each executed move, in milliseconds
    pub action_cooldown_ms: u64,

    /// Bound on reading a request body, in seconds
    pub body_read_timeout_secs: u64,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn action_cooldown(&self) -> Duration {
        Duration::from_millis(self.action_cooldown_ms)
    }

    pub fn body_read_timeout(&self) -> Duration {
        Duration::from_secs(self.body_read_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            bind_address: "127.0.0.1:8080".parse().expect("Invalid default bind address"),
            visualize: false,
            max_sessions_per_client: 20,
            idle_timeout_secs: 5,
            sweep_interval_ms: 1000,
            action_cooldown_ms: 50,
            body_read_timeout_secs: 2,
            max_body_bytes: 64 * 1024, // 64KB
        }
    }
}
