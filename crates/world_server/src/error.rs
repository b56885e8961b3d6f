//! Error types and handling for the world server.
//!
//! This module defines the error types that can occur during server
//! operations, providing clear categorization of different failure modes.

/// Enumeration of possible server errors.
///
/// Categorizes errors into network, configuration, map-loading and internal
/// failures to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration errors detected while wiring a world
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failures while loading or decoding a world map
    #[error("Map error: {0}")]
    Map(String),

    /// Internal server errors including event system issues
    #[error("Internal error: {0}")]
    Internal(String),
}
