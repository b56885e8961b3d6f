//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct - the world host. It loads
//! the manifest, boots one `WorldServer` per configured world, attaches the
//! logging sink to every world's event stream, and coordinates graceful
//! shutdown across all of them.

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::logging::display_banner;
use crate::signals::{setup_signal_handlers, setup_signal_handlers_silent};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use wayfarer_event_system::{
    create_event_system, AgentDiedEvent, EventSystem, SessionConnectedEvent, ShutdownState,
};
use world_server::{load_grid, SessionRegistry, WorldServer};

/// One booted world and the pieces the host keeps a handle on.
struct WorldHandle {
    name: String,
    server: Arc<WorldServer>,
    registry: Arc<SessionRegistry>,
}

/// The world host: owns every configured world and the shared shutdown state.
pub struct Application {
    config: AppConfig,
    worlds: Vec<WorldHandle>,
    shutdown: ShutdownState,
}

impl Application {
    /// Creates the application: loads configuration, validates it, loads
    /// every world's map, and wires the logging sinks.
    ///
    /// # Arguments
    ///
    /// * `args` - Parsed command-line arguments
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(resources) = args.resources_path {
            config.server.resources_path = resources.to_string_lossy().to_string();
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        if args.no_visualizer {
            config.server.no_visualizer = true;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let shutdown = ShutdownState::new();
        let mut worlds = Vec::new();
        for world in config.resolved_worlds() {
            let (server_config, map_path) = config.to_server_config(&world)?;
            let grid = Arc::new(load_grid(&map_path)?);
            let events = create_event_system();
            register_log_sink(&events).await?;

            let server = Arc::new(WorldServer::new(
                server_config,
                grid,
                events,
                shutdown.clone(),
            )?);
            info!(
                "🌍 World '{}' ({}) ready on port {}{}",
                world.name,
                world.color,
                world.port,
                if world.visualize { " [visualized]" } else { "" }
            );
            worlds.push(WorldHandle {
                name: world.name,
                registry: server.registry(),
                server,
            });
        }

        Ok(Self {
            config,
            worlds,
            shutdown,
        })
    }

    /// Runs the application until a shutdown signal arrives, then drains.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Wayfarer Game Server");
        info!(
            "📂 Resources: {} | Worlds: {}",
            self.config.server.resources_path,
            self.worlds.len()
        );

        let mut server_handles: Vec<(String, JoinHandle<()>)> = Vec::new();
        for world in &self.worlds {
            let server = world.server.clone();
            let name = world.name.clone();
            server_handles.push((
                world.name.clone(),
                tokio::spawn(async move {
                    if let Err(e) = server.start().await {
                        error!("❌ World '{name}' failed: {e}");
                        std::process::exit(1);
                    }
                }),
            ));
        }

        let monitoring_handle = self.spawn_monitoring();

        info!("✅ Wayfarer is now running!");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Wait for the first shutdown signal.
        let signal_state = setup_signal_handlers().await?;
        if signal_state.is_shutdown_initiated() {
            self.shutdown.initiate_shutdown();
        }

        // A second signal skips the drain entirely.
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up second-signal handler: {e}");
                return;
            }
            warn!("Shutdown signal received again! Exiting immediately.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        monitoring_handle.abort();

        for (name, handle) in server_handles {
            match tokio::time::timeout(Duration::from_secs(8), handle).await {
                Ok(_) => info!("✅ World '{name}' stopped"),
                Err(_) => warn!("⏰ World '{name}' did not stop within timeout"),
            }
        }

        self.shutdown.complete_shutdown();
        self.log_final_statistics().await;
        info!("✅ Wayfarer shutdown complete");
        Ok(())
    }

    /// Spawns the periodic health log: live session counts per world.
    fn spawn_monitoring(&self) -> JoinHandle<()> {
        let registries: Vec<(String, Arc<SessionRegistry>)> = self
            .worlds
            .iter()
            .map(|world| (world.name.clone(), world.registry.clone()))
            .collect();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut total = 0;
                let mut parts = Vec::with_capacity(registries.len());
                for (name, registry) in &registries {
                    let count = registry.live_session_count().await;
                    total += count;
                    parts.push(format!("{name}={count}"));
                }
                info!(
                    "📊 System Health - {total} live session(s) [{}]",
                    parts.join(", ")
                );
            }
        })
    }

    async fn log_final_statistics(&self) {
        for world in &self.worlds {
            info!(
                "  - World '{}': {} session(s) still registered",
                world.name,
                world.registry.live_session_count().await
            );
        }
    }
}

/// Attaches the host's logging sink to one world's event stream.
///
/// Sinks only observe; a failure here is a wiring bug, not a runtime hazard.
async fn register_log_sink(events: &Arc<EventSystem>) -> Result<(), Box<dyn std::error::Error>> {
    events
        .on("session_connected", |event: SessionConnectedEvent| {
            info!(
                "👋 {} ({}) connected to world '{}' as session {}{}",
                event.username,
                event.client_id,
                event.world,
                event.sid,
                match &event.identifier {
                    Some(identifier) => format!(" rendered as {identifier}"),
                    None => String::new(),
                }
            );
            Ok(())
        })
        .await?;

    events
        .on("agent_died", |event: AgentDiedEvent| {
            info!(
                "💀 Agent {} died in world '{}': {}",
                event.sid, event.world, event.reason
            );
            Ok(())
        })
        .await?;

    Ok(())
}
