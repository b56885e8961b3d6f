//! Wire format for the HTTP endpoints.
//!
//! This module defines the JSON bodies exchanged on `/connect` and `/move`,
//! pinned to the exact field names the remote client library expects.
//!
//! `/connect` request:
//!
//! ```json
//! { "vsid": { "identifierStr": "[]", "color": "Magenta" } | null,
//!   "username": "alice" }
//! ```
//!
//! `/move` request and its success response:
//!
//! ```json
//! { "sid": "<uuid>", "dx": 0, "dy": 1 }
//! { "success": true, "moved": true, "alive": true, "discovered": null }
//! ```

use crate::session::MovementResult;
use serde::{Deserialize, Serialize};
use wayfarer_event_system::{ConsoleColor, SessionId, Tile};

/// Exact failure string for `/move` on an unknown or dead session.
pub const NO_LIVING_AGENT: &str = "No living agent with requested session ID";

/// Exact failure string for a POST to an unrecognized path.
pub const UNKNOWN_REQUEST: &str = "Unknown request";

/// Visual identifier payload as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VsidPayload {
    #[serde(rename = "identifierStr")]
    pub identifier_str: String,
    pub color: ConsoleColor,
}

/// Body of `POST /connect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub vsid: Option<VsidPayload>,
    pub username: String,
}

/// Body of the `POST /connect` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectResponse {
    Granted { success: bool, sid: String },
    Rejected { success: bool, message: String },
}

impl ConnectResponse {
    pub fn granted(sid: SessionId) -> Self {
        Self::Granted {
            success: true,
            sid: sid.to_string(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            success: false,
            message: message.into(),
        }
    }
}

/// Body of `POST /move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub sid: String,
    pub dx: i64,
    pub dy: i64,
}

/// Body of the `POST /move` response.
///
/// `discovered` is always present on the success shape, serialized as `null`
/// when the move revealed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveResponse {
    Executed {
        success: bool,
        moved: bool,
        alive: bool,
        discovered: Option<Tile>,
    },
    Rejected {
        success: bool,
        message: String,
    },
}

impl MoveResponse {
    pub fn executed(result: MovementResult) -> Self {
        Self::Executed {
            success: true,
            moved: result.moved,
            alive: result.alive,
            discovered: result.discovered,
        }
    }

    pub fn no_living_agent() -> Self {
        Self::Rejected {
            success: false,
            message: NO_LIVING_AGENT.to_string(),
        }
    }
}

/// Uniform failure body used for route-level errors (unknown path, body
/// timeout, malformed JSON, handler faults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Wraps a handler fault in the uniform exception shape.
    pub fn exception(detail: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "Exception occured during request processing: {detail}"
        ))
    }
}
