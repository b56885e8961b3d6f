//! # Event Traits and Core Events
//!
//! This module defines the event infrastructure and the built-in event types
//! emitted by the server core. It includes the fundamental [`Event`] trait,
//! handler abstractions, and the infrastructure events presentation layers
//! subscribe to.
//!
//! ## Design Principles
//!
//! - **Type Safety**: All events are strongly typed with compile-time guarantees
//! - **Serialization**: Built-in JSON serialization for logging and transport
//! - **Isolation**: Handler failures are logged, never propagated to emitters

use crate::types::{ClientId, DeathReason, SessionId, Tile, Vector, VisualIdentifier};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;

/// Errors that can occur during event processing.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Handler execution failed: {0}")]
    HandlerExecution(String),
}

/// Core trait that all events must implement.
///
/// Most types get this through the blanket implementation below: any
/// `Serialize + DeserializeOwned + Debug` type is an event with JSON payload
/// encoding.
pub trait Event: Send + Sync + std::fmt::Debug {
    /// Returns a stable type name for this event, used in handler names and logs.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Serializes the event for dispatch to handlers.
    fn serialize(&self) -> Result<Vec<u8>, EventError>;

    /// Deserializes an event from its dispatched payload.
    fn deserialize(data: &[u8]) -> Result<Self, EventError>
    where
        Self: Sized;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + std::fmt::Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(EventError::Serialization)
    }

    fn deserialize(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(EventError::Serialization)
    }
}

/// Object-safe handler invoked with the serialized event payload.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one event occurrence.
    async fn handle(&self, data: &[u8]) -> Result<(), EventError>;

    /// Returns a human-readable name for this handler for debugging.
    fn handler_name(&self) -> &str;
}

/// Type-safe wrapper bridging a synchronous closure to [`EventHandler`].
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn(T)>,
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    /// Creates a new typed event handler.
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event + 'static,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    async fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        match T::deserialize(data) {
            Ok(event) => (self.handler)(event),
            Err(e) => {
                // A payload/type mismatch means this handler was registered
                // under the wrong key; skip it rather than poisoning emit.
                tracing::warn!(
                    "Handler '{}' (expects '{}') failed to deserialize event: {}",
                    self.name,
                    std::any::type_name::<T>(),
                    e
                );
                Ok(())
            }
        }
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Type-safe wrapper bridging an async closure to [`EventHandler`].
///
/// Used where the subscriber needs to await (e.g. the registry taking its
/// world lock to deregister a dead session).
pub struct AsyncTypedEventHandler<T, F, Fut>
where
    T: Event,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), EventError>> + Send,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn(T) -> Fut>,
}

impl<T, F, Fut> AsyncTypedEventHandler<T, F, Fut>
where
    T: Event,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), EventError>> + Send,
{
    /// Creates a new async typed event handler.
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> EventHandler for AsyncTypedEventHandler<T, F, Fut>
where
    T: Event + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), EventError>> + Send,
{
    async fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        match T::deserialize(data) {
            Ok(event) => (self.handler)(event).await,
            Err(e) => {
                tracing::warn!(
                    "Handler '{}' (expects '{}') failed to deserialize event: {}",
                    self.name,
                    std::any::type_name::<T>(),
                    e
                );
                Ok(())
            }
        }
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Core Server Events
// ============================================================================

/// Event emitted when a world starts serving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldStartedEvent {
    /// Name of the world that started
    pub world: String,
    /// Socket address the world is listening on
    pub bind_address: String,
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// Unix timestamp when the world started
    pub timestamp: u64,
}

/// Event emitted when a new session is admitted by a world's registry.
///
/// Carries the sanitized username suitable for display; the raw username is
/// never forwarded to observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConnectedEvent {
    /// Identifier of the new session
    pub sid: SessionId,
    /// Name of the world the session belongs to
    pub world: String,
    /// Client identity (`ip:port`) derived from the peer socket
    pub client_id: ClientId,
    /// Sanitized display username
    pub username: String,
    /// Visual identifier, when one was supplied
    pub identifier: Option<VisualIdentifier>,
    /// Unix timestamp of admission
    pub timestamp: u64,
}

/// Event emitted for every accepted (non-rejected) agent step, including the
/// final step that kills the agent. Emitted before any death event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMovedEvent {
    /// Identifier of the moving session
    pub sid: SessionId,
    /// Name of the world the session belongs to
    pub world: String,
    /// Position before the step
    pub from: Vector,
    /// Position after the step
    pub to: Vector,
    /// Unix timestamp of the step
    pub timestamp: u64,
}

/// Event emitted exactly once when an agent transitions from alive to dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDiedEvent {
    /// Identifier of the dead session
    pub sid: SessionId,
    /// Name of the world the session belonged to
    pub world: String,
    /// Why the agent died
    pub reason: DeathReason,
    /// The trap tile that killed the agent, if the death was a trap step
    pub discovered: Option<Tile>,
    /// Unix timestamp of death
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConsoleColor;

    #[test]
    fn events_round_trip_through_payload_encoding() {
        let event = AgentDiedEvent {
            sid: SessionId::new(),
            world: "main".to_string(),
            reason: DeathReason::Trap,
            discovered: Some(Tile::new("##").unwrap()),
            timestamp: 7,
        };
        let bytes = Event::serialize(&event).unwrap();
        let back: AgentDiedEvent = Event::deserialize(&bytes).unwrap();
        assert_eq!(back.sid, event.sid);
        assert_eq!(back.reason, DeathReason::Trap);
        assert_eq!(back.discovered, event.discovered);
    }

    #[test]
    fn connected_event_carries_optional_identifier() {
        let event = SessionConnectedEvent {
            sid: SessionId::new(),
            world: "main".to_string(),
            client_id: ClientId::from("127.0.0.1:4242"),
            username: "alice".to_string(),
            identifier: Some(VisualIdentifier::new("[]", ConsoleColor::Magenta).unwrap()),
            timestamp: 0,
        };
        let bytes = Event::serialize(&event).unwrap();
        let back: SessionConnectedEvent = Event::deserialize(&bytes).unwrap();
        assert_eq!(back.identifier, event.identifier);
        assert_eq!(back.client_id, event.client_id);
    }
}
