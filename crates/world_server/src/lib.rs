//! # World Server - Session and Connection Core
//!
//! A single "world" of the Wayfarer exploration game: a fixed grid of empty
//! and trap cells served over HTTP, with server-side sessions that step
//! agents through the grid one move at a time.
//!
//! ## Architecture Overview
//!
//! * **Grid** - immutable tile map loaded from a raster image at startup
//! * **LocalSession** - one agent's position, alive flag and discovered tile
//! * **SessionRegistry** - admission (quota, identifier uniqueness), lookup,
//!   and death-driven revocation, guarded by one lock per world
//! * **ActionQueue** - per-session worker serializing moves and applying the
//!   post-action cooldown
//! * **IdleSweeper** - periodic eviction of inactive sessions
//! * **ConnectionHandler** - POST-only JSON endpoints `/connect` and `/move`
//!
//! ## Request Flow
//!
//! 1. The handler gates on method, reads the body under a timeout, parses JSON
//! 2. `/connect` goes to the registry's admission path
//! 3. `/move` with a known sid is appended to that session's action queue;
//!    the queue worker executes the move, sleeps the cooldown, and releases
//!    the response
//! 4. Deaths emit `agent_died`, which deregisters the session; later moves
//!    for that sid are rejected
//!
//! ## Error Handling
//!
//! Every fault raised while handling a request is converted at the route
//! boundary into `{"success": false, "message": "..."}` with HTTP 200; only
//! non-POST requests receive a bare HTTP 404.

pub mod config;
pub mod error;
pub mod grid;
pub mod map;
pub mod queue;
pub mod registry;
pub mod reserved;
pub mod sanitize;
pub mod server;
pub mod session;
pub mod sweeper;
pub mod utils;
pub mod wire;


pub use config::ServerConfig;
pub use error::ServerError;
pub use grid::{Cell, Grid};
pub use map::load_grid;
pub use registry::{ConnectError, SessionRegistry};
pub use server::WorldServer;
pub use session::{is_admissible, LocalSession, MovementResult, ADMISSIBLE_MOVES};
pub use utils::{create_server, create_server_with_config};
