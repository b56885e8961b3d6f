//! Core world server implementation.
//!
//! This module contains the `WorldServer` struct that wires one world
//! together: the immutable grid, the session registry, the idle sweeper,
//! and the HTTP listener. It provides infrastructure only; everything an
//! observer needs arrives through the world's event system.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::grid::Grid;
use crate::registry::SessionRegistry;
use crate::server::handlers;
use crate::sweeper::spawn_sweeper;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use wayfarer_event_system::{
    current_timestamp, EventSystem, ShutdownState, WorldStartedEvent,
};

/// One world: a grid served on one HTTP port with its own registry.
///
/// # Architecture
///
/// * **Grid**: immutable map shared by every session of the world
/// * **Session Registry**: admission, quotas, identifier uniqueness, revocation
/// * **Action Queues**: per-session serialization with the move cooldown
/// * **Idle Sweeper**: background eviction of inactive sessions
/// * **Event System**: typed notifications for sinks (logger, visualizer)
///
/// The server core contains no presentation logic; the visualizer and log
/// widget subscribe to the event system like any other observer.
pub struct WorldServer {
    config: ServerConfig,
    grid: Arc<Grid>,
    events: Arc<EventSystem>,
    registry: Arc<SessionRegistry>,
    shutdown: ShutdownState,
}

impl WorldServer {
    /// Creates a new world server over an already-loaded grid.
    ///
    /// # Arguments
    ///
    /// * `config` - World configuration (bind address, limits, presentation policy)
    /// * `grid` - The world's map
    /// * `events` - Event system shared with this world's sinks
    /// * `shutdown` - Process-wide shutdown state
    pub fn new(
        config: ServerConfig,
        grid: Arc<Grid>,
        events: Arc<EventSystem>,
        shutdown: ShutdownState,
    ) -> Result<Self, ServerError> {
        let registry = SessionRegistry::new(
            config.clone(),
            grid.clone(),
            events.clone(),
            shutdown.clone(),
        )?;
        Ok(Self {
            config,
            grid,
            events,
            registry,
            shutdown,
        })
    }

    /// Starts the world: binds the configured address and serves until
    /// shutdown is initiated.
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!(
                    "Failed to bind {} for world '{}': {e}",
                    self.config.bind_address, self.config.name
                ))
            })?;
        self.serve_on(listener).await
    }

    /// Serves the world on an already-bound listener.
    ///
    /// Wires the registry's death watch, emits `world_started`, spawns the
    /// idle sweeper, and runs the accept loop with graceful shutdown.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<(), ServerError> {
        self.registry
            .register_death_watch()
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(e.to_string()))?;
        info!(
            "🚀 Starting world '{}' on {} ({}x{} cells{})",
            self.config.name,
            local_addr,
            self.grid.width(),
            self.grid.height(),
            if self.config.visualize { ", visualized" } else { "" }
        );

        self.events
            .emit(
                "world_started",
                &WorldStartedEvent {
                    world: self.config.name.clone(),
                    bind_address: local_addr.to_string(),
                    width: self.grid.width(),
                    height: self.grid.height(),
                    timestamp: current_timestamp(),
                },
            )
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        let sweeper = spawn_sweeper(self.registry.clone(), self.shutdown.clone());

        let app = handlers::router(self.registry.clone());
        let shutdown = self.shutdown.clone();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.wait_until_initiated().await })
        .await
        .map_err(|e| ServerError::Network(format!("HTTP server error: {e}")))?;

        // The sweeper observes the same shutdown state and stops on its own.
        sweeper.await.ok();
        info!("World '{}' stopped", self.config.name);
        Ok(())
    }

    /// Gets a reference to this world's event system.
    pub fn event_system(&self) -> Arc<EventSystem> {
        self.events.clone()
    }

    /// Gets a reference to this world's session registry.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Gets this world's configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
