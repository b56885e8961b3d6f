//! # Wayfarer Event System
//!
//! Typed event infrastructure and core types for the Wayfarer exploration
//! server. The server core emits infrastructure events (`session_connected`,
//! `agent_moved`, `agent_died`, `world_started`) into a per-world
//! [`EventSystem`]; presentation layers subscribe without the core knowing
//! about them, and the registry's own death-driven deregistration rides the
//! same bus.
//!
//! ## Event Flow
//!
//! 1. The connection handler admits a session → `session_connected`
//! 2. Every accepted step → `agent_moved`
//! 3. The alive→dead transition → `agent_died`, exactly once
//!
//! Handlers never propagate errors back to emitters; a misbehaving sink
//! cannot take a world down.

mod events;
mod shutdown;
mod system;
mod types;
mod utils;

pub use events::{
    AgentDiedEvent, AgentMovedEvent, AsyncTypedEventHandler, Event, EventError, EventHandler,
    SessionConnectedEvent, TypedEventHandler, WorldStartedEvent,
};
pub use shutdown::ShutdownState;
pub use system::EventSystem;
pub use types::{
    is_admissible_glyph, ClientId, ConsoleColor, DeathReason, IdentifierError, SessionId, Tile,
    TileError, TileWire, Vector, VisualIdentifier,
};
pub use utils::{create_event_system, current_timestamp};
