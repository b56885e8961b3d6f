//! Core event system implementation.
//!
//! The [`EventSystem`] is the hub every world emits into: the server core
//! publishes `session_connected`, `agent_moved` and `agent_died`
//! occurrences, and presentation layers (logging sink, visualizer) plus the
//! registry's own deregistration hook subscribe to them.
//!
//! Uses `DashMap` for lock-free concurrent access to the handler table, so
//! emission from many request tasks never contends on a registry-wide lock.

use crate::events::{AsyncTypedEventHandler, Event, EventError, EventHandler, TypedEventHandler};
use compact_str::CompactString;
use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error};

/// The event system that manages handler registration and event dispatch.
///
/// Handlers are keyed by event name. Emission serializes the event once,
/// then runs every registered handler concurrently; a failing handler is
/// logged and does not affect the emitter or its sibling handlers.
pub struct EventSystem {
    handlers: DashMap<CompactString, Vec<Arc<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("event_keys", &self.handlers.len())
            .finish()
    }
}

impl EventSystem {
    /// Creates a new event system with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Registers a synchronous handler for the named event.
    ///
    /// # Arguments
    ///
    /// * `event_name` - The event key (e.g. `"agent_died"`)
    /// * `handler` - Closure invoked with each occurrence
    pub async fn on<T, F>(&self, event_name: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let handler_name = format!("{}::{}", event_name, T::type_name());
        let typed = TypedEventHandler::new(handler_name, handler);
        self.register(event_name, Arc::new(typed));
        Ok(())
    }

    /// Registers an asynchronous handler for the named event.
    ///
    /// Emission awaits the returned future, so subscribers that must complete
    /// before the emitter proceeds (such as registry deregistration on death)
    /// use this form.
    pub async fn on_async<T, F, Fut>(&self, event_name: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), EventError>> + Send + 'static,
    {
        let handler_name = format!("{}::{}", event_name, T::type_name());
        let typed = AsyncTypedEventHandler::new(handler_name, handler);
        self.register(event_name, Arc::new(typed));
        Ok(())
    }

    /// Emits an event to all handlers registered for `event_name`.
    ///
    /// All handlers run concurrently; emission returns once every handler has
    /// finished. Handler errors are logged and swallowed.
    pub async fn emit<T>(&self, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let data = Arc::new(event.serialize()?);

        let event_handlers = self
            .handlers
            .get(event_name)
            .map(|entry| entry.value().clone());

        let Some(event_handlers) = event_handlers else {
            debug!("No handlers for event: {event_name}");
            return Ok(());
        };

        let mut futures = FuturesUnordered::new();
        for handler in event_handlers {
            let data = data.clone();
            futures.push(async move {
                if let Err(e) = handler.handle(&data).await {
                    error!("Handler {} failed: {}", handler.handler_name(), e);
                }
            });
        }
        while futures.next().await.is_some() {}

        Ok(())
    }

    /// Returns the number of handlers registered for `event_name`.
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers
            .get(event_name)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    fn register(&self, event_name: &str, handler: Arc<dyn EventHandler>) {
        self.handlers
            .entry(CompactString::from(event_name))
            .or_default()
            .push(handler);
        debug!("Registered handler for {event_name}");
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping {
        n: usize,
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_handler_receives_emitted_event() {
        let events = EventSystem::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_handler = seen.clone();

        events
            .on("ping", move |event: Ping| {
                seen_in_handler.fetch_add(event.n, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        events.emit("ping", &Ping { n: 3 }).await.unwrap();
        events.emit("ping", &Ping { n: 4 }).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn async_handler_completes_before_emit_returns() {
        let events = EventSystem::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_handler = seen.clone();

        events
            .on_async("ping", move |event: Ping| {
                let seen = seen_in_handler.clone();
                async move {
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    seen.store(event.n, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap();

        events.emit("ping", &Ping { n: 9 }).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn emit_without_handlers_is_a_no_op() {
        let events = EventSystem::new();
        events.emit("nobody_home", &Ping { n: 1 }).await.unwrap();
        assert_eq!(events.handler_count("nobody_home"), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failing_handler_does_not_poison_siblings() {
        let events = EventSystem::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_handler = seen.clone();

        events
            .on("ping", |_: Ping| {
                Err(EventError::HandlerExecution("boom".to_string()))
            })
            .await
            .unwrap();
        events
            .on("ping", move |_: Ping| {
                seen_in_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        events.emit("ping", &Ping { n: 1 }).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
