use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State pushes from the engine to connected sessions.
///
/// The same shapes are used for the initial sync on join and for live
/// updates, so a client cannot distinguish the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full node -> threshold mapping.
    SetPermissions { permissions: Map<String, Value> },

    /// Playlist lock state (locked = NOT open playlist).
    SetPlaylistLocked { locked: bool },

    /// Session terminated for a protocol violation.
    Kicked { reason: String },
}

impl ServerEvent {
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SetPermissions { .. } => "set_permissions",
            Self::SetPlaylistLocked { .. } => "set_playlist_locked",
            Self::Kicked { .. } => "kicked",
        }
    }
}

/// Requests a session may send once join setup has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Flip the playlist lock. No payload.
    TogglePlaylistLock,

    /// Proposed node -> value map. Kept as raw JSON: payload shape is
    /// validated by the engine, not the transport.
    SetPermissions { permissions: Value },
}
