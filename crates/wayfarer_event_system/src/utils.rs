//! Utility functions shared across the event system and its consumers.

use crate::system::EventSystem;
use std::sync::Arc;

/// Returns the current Unix timestamp in seconds.
///
/// All events use this function for timestamp generation so observers see a
/// consistent clock.
///
/// # Panics
///
/// Panics if the system clock is set to a time before the Unix epoch.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Creates a new event system instance ready for handler registration.
///
/// Each world owns exactly one event system; sharing the returned `Arc`
/// between the world's server core and its presentation sinks is the intended
/// usage.
pub fn create_event_system() -> Arc<EventSystem> {
    Arc::new(EventSystem::new())
}
