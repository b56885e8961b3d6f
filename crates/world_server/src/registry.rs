//! Session registry: admission, lookup and revocation for one world.
//!
//! The registry owns every live session of a world and enforces the
//! admission rules: per-client quota, visual-identifier uniqueness, and the
//! VSID requirement of visualized worlds. A single `RwLock` guards both maps
//! (`sessions` by sid, `client_sessions` by client); per-session state lives
//! behind its own lock inside each record and is only touched from the
//! session's queue worker or the idle sweeper.
//!
//! Revocation is death-driven: the registry subscribes to `agent_died` on
//! the world's event bus, so a session killed by a trap, the map edge or the
//! idle sweeper is deregistered through the same path.

use crate::config::ServerConfig;
use crate::grid::Grid;
use crate::queue::{spawn_worker, MoveJob};
use crate::reserved::ReservedIdentifiers;
use crate::sanitize::{clean_identifier_text, clean_username};
use crate::session::LocalSession;
use crate::wire::{MoveResponse, VsidPayload};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{debug, info, warn};
use wayfarer_event_system::{
    current_timestamp, AgentDiedEvent, ClientId, DeathReason, EventError, EventSystem,
    SessionConnectedEvent, SessionId, ShutdownState, VisualIdentifier,
};

/// Reasons a `/connect` request is not granted a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// The world is visualized and the request carried no visual identifier
    #[error("This server requires VSID to connect. None present.")]
    VsidRequired,

    /// Another live session of this world already renders the same identifier
    #[error("Identifier already in use")]
    IdentifierInUse,

    /// The client already holds the maximum number of live sessions
    #[error("Too many sessions")]
    TooManySessions,

    /// The supplied identifier is malformed or reserved; reported to the
    /// client through the uniform exception shape
    #[error("{0}")]
    Invalid(String),
}

/// Registry entry for one live session.
#[derive(Debug)]
struct SessionRecord {
    client_id: ClientId,
    session: Arc<Mutex<LocalSession>>,
    identifier: Option<VisualIdentifier>,
    /// Advances only on a move that executed and left the agent alive.
    last_activity: Instant,
    queue: mpsc::UnboundedSender<MoveJob>,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<SessionId, SessionRecord>,
    client_sessions: HashMap<ClientId, HashSet<SessionId>>,
}

/// Per-world session registry.
pub struct SessionRegistry {
    world: String,
    grid: Arc<Grid>,
    events: Arc<EventSystem>,
    config: ServerConfig,
    reserved: ReservedIdentifiers,
    shutdown: ShutdownState,
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("world", &self.world)
            .finish()
    }
}

impl SessionRegistry {
    /// Creates the registry for one world.
    ///
    /// Compiles the reserved-identifier table from the world's map glyphs;
    /// call [`SessionRegistry::register_death_watch`] afterwards to wire
    /// death-driven deregistration.
    pub fn new(
        config: ServerConfig,
        grid: Arc<Grid>,
        events: Arc<EventSystem>,
        shutdown: ShutdownState,
    ) -> Result<Arc<Self>, crate::error::ServerError> {
        let reserved = ReservedIdentifiers::new(config.visualize, grid.glyphs())?;
        Ok(Arc::new(Self {
            world: config.name.clone(),
            grid,
            events,
            config,
            reserved,
            shutdown,
            state: RwLock::new(RegistryState::default()),
        }))
    }

    /// Subscribes the registry to `agent_died` so every kill path funnels
    /// into deregistration.
    pub async fn register_death_watch(self: &Arc<Self>) -> Result<(), EventError> {
        let registry = Arc::downgrade(self);
        self.events
            .on_async("agent_died", move |event: AgentDiedEvent| {
                let registry = registry.clone();
                async move {
                    if let Some(registry) = registry.upgrade() {
                        registry.remove_session(event.sid).await;
                    }
                    Ok(())
                }
            })
            .await
    }

    /// Admits a new session for `client_id`.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Peer identity injected by the connection handler
    /// * `vsid` - Optional visual identifier payload from the request body
    /// * `raw_username` - Unsanitized username from the request body
    ///
    /// # Returns
    ///
    /// The new session's id, or a [`ConnectError`] naming the admission rule
    /// that rejected the request.
    pub async fn connect(
        self: &Arc<Self>,
        client_id: ClientId,
        vsid: Option<VsidPayload>,
        raw_username: &str,
    ) -> Result<SessionId, ConnectError> {
        let username = clean_username(raw_username);

        let identifier = match vsid {
            Some(payload) => {
                let text = clean_identifier_text(&payload.identifier_str);
                let identifier = VisualIdentifier::new(text, payload.color)
                    .map_err(|e| ConnectError::Invalid(e.to_string()))?;
                if self.reserved.is_reserved(&identifier) {
                    return Err(ConnectError::Invalid("Identifier is reserved".to_string()));
                }
                Some(identifier)
            }
            None if self.config.visualize => return Err(ConnectError::VsidRequired),
            None => None,
        };

        let sid = SessionId::new();
        {
            let mut state = self.state.write().await;

            if let Some(ref identifier) = identifier {
                let collision = state
                    .sessions
                    .values()
                    .any(|record| record.identifier.as_ref() == Some(identifier));
                if collision {
                    return Err(ConnectError::IdentifierInUse);
                }
            }

            let owned = state
                .client_sessions
                .get(&client_id)
                .map_or(0, |sids| sids.len());
            if owned >= self.config.max_sessions_per_client {
                return Err(ConnectError::TooManySessions);
            }

            let session = Arc::new(Mutex::new(LocalSession::new(
                sid,
                self.world.clone(),
                self.grid.clone(),
                self.events.clone(),
            )));
            let queue = spawn_worker(
                sid,
                Arc::clone(self),
                self.shutdown.clone(),
                self.config.action_cooldown(),
            );

            state.sessions.insert(
                sid,
                SessionRecord {
                    client_id: client_id.clone(),
                    session,
                    identifier: identifier.clone(),
                    last_activity: Instant::now(),
                    queue,
                },
            );
            state
                .client_sessions
                .entry(client_id.clone())
                .or_default()
                .insert(sid);
        }

        info!(
            "🔗 Session {sid} for {client_id} joined world '{}'",
            self.world
        );

        self.events
            .emit(
                "session_connected",
                &SessionConnectedEvent {
                    sid,
                    world: self.world.clone(),
                    client_id,
                    username,
                    identifier,
                    timestamp: current_timestamp(),
                },
            )
            .await
            .ok();

        Ok(sid)
    }

    /// Appends a move to the session's action queue.
    ///
    /// The append happens under the world lock, so per-session ordering
    /// follows lookup order. Returns `None` for an unknown sid: such
    /// requests are answered inline by the caller, without queueing or
    /// cooldown.
    pub async fn enqueue_move(
        &self,
        sid: SessionId,
        movement: wayfarer_event_system::Vector,
    ) -> Option<oneshot::Receiver<MoveResponse>> {
        let state = self.state.read().await;
        let record = state.sessions.get(&sid)?;
        let (respond, receiver) = oneshot::channel();
        record.queue.send(MoveJob { movement, respond }).ok()?;
        Some(receiver)
    }

    /// Executes one move for `sid`. Called only from the session's queue
    /// worker, which guarantees at most one execution in flight per session.
    pub async fn execute_move(
        &self,
        sid: SessionId,
        movement: wayfarer_event_system::Vector,
    ) -> MoveResponse {
        let session = {
            let state = self.state.read().await;
            match state.sessions.get(&sid) {
                Some(record) => record.session.clone(),
                None => return MoveResponse::no_living_agent(),
            }
        };

        // The session lock is taken without the world lock held; the death
        // watch re-acquires the world lock while this emit is in progress.
        let result = {
            let mut session = session.lock().await;
            session.move_by(movement).await
        };

        if result.moved && result.alive {
            let mut state = self.state.write().await;
            if let Some(record) = state.sessions.get_mut(&sid) {
                record.last_activity = Instant::now();
            }
        }

        MoveResponse::executed(result)
    }

    /// Removes a session's record; invoked by the death watch.
    pub async fn remove_session(&self, sid: SessionId) {
        let mut state = self.state.write().await;
        match state.sessions.remove(&sid) {
            Some(record) => {
                if let Some(sids) = state.client_sessions.get_mut(&record.client_id) {
                    sids.remove(&sid);
                    if sids.is_empty() {
                        state.client_sessions.remove(&record.client_id);
                    }
                }
                info!("❌ Session {sid} left world '{}'", self.world);
            }
            None => {
                warn!(
                    "Deregistration requested for unknown session {sid} in world '{}'",
                    self.world
                );
            }
        }
    }

    /// Kills every session idle longer than the configured timeout.
    pub async fn evict_idle(&self) {
        let cutoff = self.config.idle_timeout();
        let now = Instant::now();
        let expired: Vec<(SessionId, Arc<Mutex<LocalSession>>)> = {
            let state = self.state.read().await;
            state
                .sessions
                .iter()
                .filter(|(_, record)| now.duration_since(record.last_activity) > cutoff)
                .map(|(sid, record)| (*sid, record.session.clone()))
                .collect()
        };

        for (sid, session) in expired {
            debug!("💤 Evicting idle session {sid} from world '{}'", self.world);
            session.lock().await.kill(DeathReason::Idle).await;
        }
    }

    /// Number of live sessions in this world.
    pub async fn live_session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Number of live sessions currently owned by `client_id`.
    pub async fn client_session_count(&self, client_id: &ClientId) -> usize {
        self.state
            .read()
            .await
            .client_sessions
            .get(client_id)
            .map_or(0, |sids| sids.len())
    }

    pub fn world_name(&self) -> &str {
        &self.world
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) async fn last_activity(&self, sid: SessionId) -> Option<Instant> {
        self.state
            .read()
            .await
            .sessions
            .get(&sid)
            .map(|record| record.last_activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::NO_LIVING_AGENT;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wayfarer_event_system::{create_event_system, ConsoleColor, Tile, Vector};

    fn test_grid() -> Arc<Grid> {
        Arc::new(Grid::with_traps(3, 3, Tile::new("##").unwrap(), &[(1, 0)]).unwrap())
    }

    async fn registry_with(config: ServerConfig) -> Arc<SessionRegistry> {
        let registry = SessionRegistry::new(
            config,
            test_grid(),
            create_event_system(),
            ShutdownState::new(),
        )
        .unwrap();
        registry.register_death_watch().await.unwrap();
        registry
    }

    fn fast_config() -> ServerConfig {
        ServerConfig {
            action_cooldown_ms: 1,
            ..ServerConfig::default()
        }
    }

    fn magenta_brackets() -> VsidPayload {
        VsidPayload {
            identifier_str: "[]".to_string(),
            color: ConsoleColor::Magenta,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn visualized_world_requires_a_vsid() {
        let registry = registry_with(ServerConfig {
            visualize: true,
            ..fast_config()
        })
        .await;
        let err = registry
            .connect(ClientId::from("10.0.0.1:1000"), None, "alice")
            .await
            .unwrap_err();
        assert_eq!(err, ConnectError::VsidRequired);
        assert_eq!(
            err.to_string(),
            "This server requires VSID to connect. None present."
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_identifiers_are_rejected_until_the_holder_dies() {
        let registry = registry_with(ServerConfig {
            visualize: true,
            ..fast_config()
        })
        .await;
        let client = ClientId::from("10.0.0.1:1000");

        let sid = registry
            .connect(client.clone(), Some(magenta_brackets()), "alice")
            .await
            .unwrap();
        let err = registry
            .connect(client.clone(), Some(magenta_brackets()), "alice")
            .await
            .unwrap_err();
        assert_eq!(err, ConnectError::IdentifierInUse);

        // Walking into the trap frees the identifier.
        registry.execute_move(sid, Vector::new(1, 0)).await;
        registry
            .connect(client, Some(magenta_brackets()), "alice")
            .await
            .expect("identifier should be reusable after the holder died");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn per_client_quota_is_enforced() {
        let registry = registry_with(fast_config()).await;
        let client = ClientId::from("10.0.0.1:1000");
        for _ in 0..20 {
            registry.connect(client.clone(), None, "bot").await.unwrap();
        }
        let err = registry
            .connect(client.clone(), None, "bot")
            .await
            .unwrap_err();
        assert_eq!(err, ConnectError::TooManySessions);
        assert_eq!(registry.client_session_count(&client).await, 20);

        // A different client is unaffected.
        registry
            .connect(ClientId::from("10.0.0.2:1000"), None, "bot")
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reserved_identifiers_are_invalid() {
        let registry = registry_with(fast_config()).await;
        let err = registry
            .connect(
                ClientId::from("10.0.0.1:1000"),
                Some(VsidPayload {
                    identifier_str: "EE".to_string(),
                    color: ConsoleColor::Red,
                }),
                "alice",
            )
            .await
            .unwrap_err();
        assert_eq!(err, ConnectError::Invalid("Identifier is reserved".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_sessions_get_the_no_living_agent_reply() {
        let registry = registry_with(fast_config()).await;
        let response = registry
            .execute_move(SessionId::new(), Vector::new(0, 1))
            .await;
        assert_eq!(response, MoveResponse::no_living_agent());
        assert!(registry
            .enqueue_move(SessionId::new(), Vector::new(0, 1))
            .await
            .is_none());
        assert_eq!(MoveResponse::no_living_agent(), MoveResponse::Rejected {
            success: false,
            message: NO_LIVING_AGENT.to_string(),
        });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn death_removes_the_record_and_blocks_further_moves() {
        let registry = registry_with(fast_config()).await;
        let client = ClientId::from("10.0.0.1:1000");
        let sid = registry.connect(client.clone(), None, "alice").await.unwrap();

        let response = registry.execute_move(sid, Vector::new(1, 0)).await;
        assert!(matches!(
            response,
            MoveResponse::Executed { alive: false, moved: true, .. }
        ));

        assert_eq!(registry.live_session_count().await, 0);
        assert_eq!(registry.client_session_count(&client).await, 0);
        let follow_up = registry.execute_move(sid, Vector::new(0, 1)).await;
        assert_eq!(follow_up, MoveResponse::no_living_agent());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn activity_advances_only_on_live_executed_moves() {
        let registry = registry_with(fast_config()).await;
        let sid = registry
            .connect(ClientId::from("10.0.0.1:1000"), None, "alice")
            .await
            .unwrap();
        let initial = registry.last_activity(sid).await.unwrap();

        // An inadmissible vector is rejected and leaves activity untouched.
        registry.execute_move(sid, Vector::new(1, 1)).await;
        assert_eq!(registry.last_activity(sid).await.unwrap(), initial);

        registry.execute_move(sid, Vector::new(0, 1)).await;
        assert!(registry.last_activity(sid).await.unwrap() > initial);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn idle_sessions_are_evicted_with_the_idle_reason() {
        let events = create_event_system();
        let idle_deaths = Arc::new(AtomicUsize::new(0));
        let counter = idle_deaths.clone();
        events
            .on("agent_died", move |event: AgentDiedEvent| {
                if event.reason == DeathReason::Idle {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            })
            .await
            .unwrap();

        let registry = SessionRegistry::new(
            ServerConfig {
                idle_timeout_secs: 0,
                ..fast_config()
            },
            test_grid(),
            events,
            ShutdownState::new(),
        )
        .unwrap();
        registry.register_death_watch().await.unwrap();

        let sid = registry
            .connect(ClientId::from("10.0.0.1:1000"), None, "alice")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        registry.evict_idle().await;
        assert_eq!(idle_deaths.load(Ordering::SeqCst), 1);
        assert_eq!(registry.live_session_count().await, 0);
        assert_eq!(
            registry.execute_move(sid, Vector::new(0, 1)).await,
            MoveResponse::no_living_agent()
        );

        // A second sweep finds nothing; the death fired exactly once.
        registry.evict_idle().await;
        assert_eq!(idle_deaths.load(Ordering::SeqCst), 1);
    }
}
