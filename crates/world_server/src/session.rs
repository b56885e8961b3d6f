//! Local agent session.
//!
//! A [`LocalSession`] owns one agent on one grid: its position, its alive
//! flag, and the tile discovered by its most recent fatal step. Sessions
//! emit `agent_moved` for every accepted step and `agent_died` exactly once
//! on the alive→dead transition; the registry's deregistration hook and the
//! presentation sinks both ride those events.
//!
//! Mutation is guarded externally: the session lives behind a lock held by
//! the session's queue worker (moves) or the idle sweeper (kills).

use crate::grid::Grid;
use std::sync::Arc;
use wayfarer_event_system::{
    current_timestamp, AgentDiedEvent, AgentMovedEvent, DeathReason, EventSystem, SessionId, Tile,
    Vector,
};

/// The nine admissible movement vectors.
///
/// Diagonals are disallowed to keep the game grid-aligned; the length-2
/// "jumps" let agents skip a cell without probing it.
pub const ADMISSIBLE_MOVES: [Vector; 9] = [
    Vector { x: 0, y: 0 },
    Vector { x: 1, y: 0 },
    Vector { x: -1, y: 0 },
    Vector { x: 0, y: 1 },
    Vector { x: 0, y: -1 },
    Vector { x: 2, y: 0 },
    Vector { x: -2, y: 0 },
    Vector { x: 0, y: 2 },
    Vector { x: 0, y: -2 },
];

/// Returns true if `movement` is one of the nine admissible vectors.
pub fn is_admissible(movement: Vector) -> bool {
    (movement.y == 0 && (-2..=2).contains(&movement.x))
        || (movement.x == 0 && (-2..=2).contains(&movement.y))
}

/// Outcome of one movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementResult {
    /// True if the move executed (position changed, possibly fatally)
    pub moved: bool,
    /// True if the agent is still alive after the attempt
    pub alive: bool,
    /// Tile discovered by this move; only set when the move was a trap death
    pub discovered: Option<Tile>,
}

/// One agent bound to one grid.
#[derive(Debug)]
pub struct LocalSession {
    sid: SessionId,
    world: String,
    grid: Arc<Grid>,
    events: Arc<EventSystem>,
    location: Vector,
    alive: bool,
    discovered: Option<Tile>,
}

impl LocalSession {
    /// Creates a live session at the spawn position `(0, 0)`.
    pub fn new(sid: SessionId, world: String, grid: Arc<Grid>, events: Arc<EventSystem>) -> Self {
        Self {
            sid,
            world,
            grid,
            events,
            location: Vector::ZERO,
            alive: true,
            discovered: None,
        }
    }

    pub fn sid(&self) -> SessionId {
        self.sid
    }

    pub fn location(&self) -> Vector {
        self.location
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Tile discovered by the most recent fatal step, if any.
    pub fn discovered_tile(&self) -> Option<Tile> {
        self.discovered
    }

    /// Attempts to move the agent by `movement`.
    ///
    /// # Contract
    ///
    /// * Dead session: `{moved: false, alive: false}`, no side effects.
    /// * Inadmissible vector: `{moved: false, alive: true}`, no side effects.
    /// * Otherwise the position advances and `agent_moved` fires; stepping
    ///   out of bounds or onto a trap then kills the agent (`agent_died`,
    ///   exactly once, after the move event).
    pub async fn move_by(&mut self, movement: Vector) -> MovementResult {
        if !self.alive {
            return MovementResult {
                moved: false,
                alive: false,
                discovered: None,
            };
        }
        if !is_admissible(movement) {
            return MovementResult {
                moved: false,
                alive: true,
                discovered: None,
            };
        }

        let previous = self.location;
        self.location = previous + movement;

        self.emit_moved(previous, self.location).await;

        if !self.grid.contains(self.location) {
            self.kill(DeathReason::OutOfBounds).await;
            return MovementResult {
                moved: true,
                alive: false,
                discovered: None,
            };
        }

        if let Some(tile) = self.grid.tile_at(self.location) {
            self.discovered = Some(tile);
            self.kill(DeathReason::Trap).await;
            return MovementResult {
                moved: true,
                alive: false,
                discovered: Some(tile),
            };
        }

        MovementResult {
            moved: true,
            alive: true,
            discovered: None,
        }
    }

    /// Kills the agent, emitting `agent_died` exactly once.
    ///
    /// Idempotent at the state level: killing a dead session does nothing.
    pub async fn kill(&mut self, reason: DeathReason) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.events
            .emit(
                "agent_died",
                &AgentDiedEvent {
                    sid: self.sid,
                    world: self.world.clone(),
                    reason,
                    discovered: self.discovered,
                    timestamp: current_timestamp(),
                },
            )
            .await
            .ok();
    }

    async fn emit_moved(&self, from: Vector, to: Vector) {
        self.events
            .emit(
                "agent_moved",
                &AgentMovedEvent {
                    sid: self.sid,
                    world: self.world.clone(),
                    from,
                    to,
                    timestamp: current_timestamp(),
                },
            )
            .await
            .ok();
    }
}
