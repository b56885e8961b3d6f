//! Idle-session sweeper.
//!
//! A background task per world that periodically asks the registry to kill
//! sessions whose last successful move is older than the idle timeout. The
//! kill funnels through the normal death path, so eviction is observable as
//! an `agent_died` with the idle reason followed by deregistration.

use crate::registry::SessionRegistry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;
use wayfarer_event_system::ShutdownState;

/// Spawns the idle sweep loop for a world.
///
/// The loop runs until shutdown is initiated; the sweep interval and idle
/// timeout come from the registry's configuration.
pub fn spawn_sweeper(registry: Arc<SessionRegistry>, shutdown: ShutdownState) -> JoinHandle<()> {
    let period = registry.config().sweep_interval();
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // The first tick of a tokio interval fires immediately; consume it so
        // sweeps start one full period after boot.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_until_initiated() => break,
            }
            if shutdown.is_shutdown_initiated() {
                break;
            }
            registry.evict_idle().await;
        }
        debug!(
            "Idle sweeper for world '{}' stopped",
            registry.world_name()
        );
    })
}
