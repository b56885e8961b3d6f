//! Per-session action queue.
//!
//! Each live session owns a single-consumer queue and a worker task: the
//! connection handler appends one job per `/move` request, the worker pops
//! jobs one at a time, executes the move, sleeps out the per-session
//! cooldown, and only then releases the response. This serializes all moves
//! of a session (at most one `LocalSession` move in flight per sid) and
//! throttles per-session throughput.
//!
//! On shutdown the worker stops between jobs; queued continuations that have
//! not run are dropped, which surfaces to waiting handlers as a closed
//! response channel.

use crate::registry::SessionRegistry;
use crate::wire::MoveResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;
use wayfarer_event_system::{SessionId, ShutdownState, Vector};

/// One pending `/move` and the channel its response is released on.
#[derive(Debug)]
pub struct MoveJob {
    pub movement: Vector,
    pub respond: oneshot::Sender<MoveResponse>,
}

/// Spawns the queue worker for a session and returns its submission handle.
///
/// The worker exits when the session's record is removed (all senders
/// dropped) or when shutdown is initiated.
pub(crate) fn spawn_worker(
    sid: SessionId,
    registry: Arc<SessionRegistry>,
    shutdown: ShutdownState,
    cooldown: Duration,
) -> mpsc::UnboundedSender<MoveJob> {
    let (tx, mut rx) = mpsc::unbounded_channel::<MoveJob>();

    tokio::spawn(async move {
        loop {
            let job = tokio::select! {
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
                _ = shutdown.wait_until_initiated() => break,
            };

            let response = registry.execute_move(sid, job.movement).await;

            // Cooldown runs after the move but before the response is
            // released; it is deliberately not canceled on shutdown.
            tokio::time::sleep(cooldown).await;

            if job.respond.send(response).is_err() {
                trace!("Move response for session {sid} dropped by the requester");
            }
        }
        trace!("Action queue worker for session {sid} stopped");
    });

    tx
}
