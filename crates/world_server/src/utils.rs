//! Convenience factory functions for the world server.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::grid::Grid;
use crate::server::WorldServer;
use std::sync::Arc;
use wayfarer_event_system::{create_event_system, ShutdownState};

/// Creates a world server over `grid` with default configuration.
///
/// A convenience for development and testing; the world gets its own event
/// system and shutdown state.
pub fn create_server(grid: Arc<Grid>) -> Result<WorldServer, ServerError> {
    create_server_with_config(ServerConfig::default(), grid)
}

/// Creates a world server over `grid` with the provided configuration.
pub fn create_server_with_config(
    config: ServerConfig,
    grid: Arc<Grid>,
) -> Result<WorldServer, ServerError> {
    WorldServer::new(config, grid, create_event_system(), ShutdownState::new())
}
