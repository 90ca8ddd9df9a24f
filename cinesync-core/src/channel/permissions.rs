//! Channel permission engine.
//!
//! Owns the rank-threshold table for one channel, answers capability
//! queries from the playlist/chat/poll subsystems, and validates, applies
//! and fans out permission edits requested by privileged sessions.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::module::{ChannelData, ChannelModule};
use crate::models::{parse_threshold, ActorRef, ChannelId, PermissionTable, Rank};
use crate::sync::{ClientRequest, PushTarget, ServerEvent, Session, SessionHub};

/// Rank floors for the reserved operations that live outside the editable
/// table. Editing channel scripting is code injection by another name, so
/// an admin must never be able to hand it to a lower rank through the
/// normal bulk-edit path.
pub const SET_OPTIONS_RANK: Rank = Rank(6.0);
pub const SET_CSS_RANK: Rank = Rank(10.0);
pub const SET_JS_RANK: Rank = Rank(10.0);
pub const SET_PERMISSIONS_RANK: Rank = Rank(9.0);

/// Receives one human-readable line per successful permission mutation.
pub trait AuditSink: Send + Sync {
    fn log(&self, channel_id: &ChannelId, line: &str);
}

/// Default sink: structured log events under the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn log(&self, channel_id: &ChannelId, line: &str) {
        tracing::info!(target: "audit", channel_id = %channel_id, "{line}");
    }
}

/// Callback surface the playlist subsystem registers so that a
/// `seeplaylist` threshold change can trigger a playlist re-send to every
/// session (visibility may have just changed).
pub trait PlaylistObserver: Send + Sync {
    fn resend_playlist(&self, channel_id: &ChannelId);
}

/// The permission module of one channel.
///
/// Cheap to clone; queries take a read lock, mutations a write lock, so
/// concurrent readers observe either the pre- or post-mutation table,
/// never a partially applied one.
#[derive(Clone)]
pub struct PermissionsModule {
    channel_id: ChannelId,
    table: Arc<RwLock<PermissionTable>>,
    hub: SessionHub,
    playlist: Option<Arc<dyn PlaylistObserver>>,
    audit: Arc<dyn AuditSink>,
}

impl PermissionsModule {
    #[must_use]
    pub fn new(channel_id: ChannelId, hub: SessionHub) -> Self {
        Self {
            channel_id,
            table: Arc::new(RwLock::new(PermissionTable::new())),
            hub,
            playlist: None,
            audit: Arc::new(TracingAudit),
        }
    }

    #[must_use]
    pub fn with_playlist_observer(mut self, observer: Arc<dyn PlaylistObserver>) -> Self {
        self.playlist = Some(observer);
        self
    }

    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Initialize for a channel operating without persistent identity.
    /// Used instead of the module's `on_load`.
    pub fn load_unregistered(&self) {
        self.table.write().load_unregistered();
    }

    /// The authorization query everything else goes through.
    ///
    /// Total and fail-closed: an unknown node or a missing shadow entry
    /// denies, it never faults. While the playlist is open, any
    /// `playlist*` node is granted early if the actor clears the looser
    /// shadow (`o`-prefixed) threshold.
    #[must_use]
    pub fn has_permission<'a>(&self, actor: impl Into<ActorRef<'a>>, node: &str) -> bool {
        let rank = actor.into().effective_rank();
        let table = self.table.read();

        if node.starts_with("playlist") && table.open_playlist() {
            let shadow = format!("o{node}");
            if let Some(threshold) = table.threshold(&shadow) {
                if rank.at_least(threshold) {
                    return true;
                }
            }
        }

        table
            .threshold(node)
            .is_some_and(|threshold| rank.at_least(threshold))
    }

    #[must_use]
    pub fn open_playlist(&self) -> bool {
        self.table.read().open_playlist()
    }

    /// Current threshold for a node (for sibling modules and tests).
    #[must_use]
    pub fn threshold(&self, node: &str) -> Option<Rank> {
        self.table.read().threshold(node)
    }

    /// Dispatch an inbound session request to the matching handler.
    pub fn handle_request(&self, session: &Session, request: ClientRequest) {
        match request {
            ClientRequest::TogglePlaylistLock => self.handle_toggle_playlist_lock(session),
            ClientRequest::SetPermissions { permissions } => {
                self.handle_set_permissions(session, &permissions);
            }
        }
    }

    /// Flip the playlist lock on behalf of a session.
    ///
    /// A requester without the `playlistlock` permission is ignored
    /// silently: a denied toggle is a routine non-event, not a violation.
    pub fn handle_toggle_playlist_lock(&self, session: &Session) {
        if !self.has_permission(session, "playlistlock") {
            return;
        }

        let open = self.table.write().toggle_open_playlist();

        let state = if open { "unlocked" } else { "locked" };
        self.audit.log(
            &self.channel_id,
            &format!("[playlist] {} {state} the playlist", session.name()),
        );

        self.send_playlist_lock(&PushTarget::AllSessions);
    }

    /// Apply a bulk permission edit on behalf of a session.
    ///
    /// Non-object payloads are dropped silently. A requester below the
    /// reserved set-permissions rank is kicked: a non-admin attempting a
    /// full permission rewrite is a protocol violation, not a routine
    /// denial. Entries that fail numeric coercion and keys outside the
    /// catalog are dropped individually; the rest of the request still
    /// applies.
    pub fn handle_set_permissions(&self, session: &Session, payload: &Value) {
        let Some(proposed) = payload.as_object() else {
            return;
        };

        if !self.can_set_permissions(session) {
            self.hub
                .kick(&session.id, "Attempted setPermissions as a non-admin");
            return;
        }

        let mut playlist_visibility_changed = false;
        {
            let mut table = self.table.write();
            for (key, raw) in proposed {
                let Some(threshold) = parse_threshold(raw) else {
                    continue;
                };
                if table.set_threshold(key, threshold) && key == "seeplaylist" {
                    playlist_visibility_changed = true;
                }
            }
            table.mark_dirty();
        }

        if playlist_visibility_changed {
            if let Some(playlist) = &self.playlist {
                playlist.resend_playlist(&self.channel_id);
            }
        }

        self.audit.log(
            &self.channel_id,
            &format!("[mod] {} updated permissions", session.name()),
        );

        self.send_permissions(&PushTarget::AllSessions);
    }

    /// Push the full permission table to the targeted sessions.
    pub fn send_permissions(&self, target: &PushTarget) {
        let permissions = self.table.read().permissions_json();
        self.hub.push(
            &self.channel_id,
            target,
            ServerEvent::SetPermissions { permissions },
        );
    }

    /// Push the playlist lock state to the targeted sessions.
    pub fn send_playlist_lock(&self, target: &PushTarget) {
        let locked = !self.table.read().open_playlist();
        self.hub.push(
            &self.channel_id,
            target,
            ServerEvent::SetPlaylistLocked { locked },
        );
    }
}

impl ChannelModule for PermissionsModule {
    fn name(&self) -> &'static str {
        "permissions"
    }

    fn on_load(&self, data: &Value) {
        self.table.write().load(data);
    }

    fn on_save(&self, data: &mut ChannelData) {
        self.table.read().save(data);
    }

    fn on_session_join(&self, session: &Session) {
        let target = PushTarget::Sessions(vec![session.id.clone()]);
        self.send_permissions(&target);
        self.send_playlist_lock(&target);
    }

    fn dirty(&self) -> bool {
        self.table.read().dirty()
    }
}

/// One named check per permission-gated action; each is a thin wrapper
/// over [`PermissionsModule::has_permission`] bound to one node.
macro_rules! permission_checks {
    ($($(#[$meta:meta])* $name:ident => $node:literal,)*) => {
        impl PermissionsModule {
            $(
                $(#[$meta])*
                #[must_use]
                pub fn $name<'a>(&self, actor: impl Into<ActorRef<'a>>) -> bool {
                    self.has_permission(actor, $node)
                }
            )*
        }
    };
}

permission_checks! {
    can_see_playlist => "seeplaylist",
    can_add_video => "playlistadd",
    can_add_next => "playlistnext",
    can_move_video => "playlistmove",
    can_delete_video => "playlistdelete",
    can_skip_video => "playlistjump",
    can_add_list => "playlistaddlist",
    can_add_custom => "playlistaddcustom",
    can_add_raw_file => "playlistaddrawfile",
    can_add_live => "playlistaddlive",
    can_exceed_max_length => "exceedmaxlength",
    can_add_non_temp => "addnontemp",
    can_set_temp => "settemp",
    /// Alias kept because the playlist UI and the item context menu gate on
    /// the same node through different call sites.
    can_toggle_temporary => "settemp",
    can_shuffle_playlist => "playlistshuffle",
    can_clear_playlist => "playlistclear",
    can_lock_playlist => "playlistlock",
    can_control_poll => "pollctl",
    can_vote => "pollvote",
    can_view_hidden_poll => "viewhiddenpoll",
    can_voteskip => "voteskip",
    can_see_voteskip_results => "viewvoteskip",
    can_mute => "mute",
    can_kick => "kick",
    can_ban => "ban",
    can_edit_motd => "motdedit",
    can_edit_filters => "filteredit",
    can_import_filters => "filterimport",
    can_edit_emotes => "emoteedit",
    can_import_emotes => "emoteimport",
    can_assign_leader => "leaderctl",
    can_call_drink => "drink",
    can_chat => "chat",
    can_clear_chat => "chatclear",
    can_uncache => "deletefromchannellib",
    can_exceed_max_items_per_user => "exceedmaxitems",
    can_exceed_max_duration_per_user => "exceedmaxdurationperuser",
}

/// Reserved super-admin checks. These bypass the table on purpose: no
/// value stored in it can ever satisfy them.
impl PermissionsModule {
    #[must_use]
    pub fn can_set_options<'a>(&self, actor: impl Into<ActorRef<'a>>) -> bool {
        actor.into().effective_rank().at_least(SET_OPTIONS_RANK)
    }

    #[must_use]
    pub fn can_set_css<'a>(&self, actor: impl Into<ActorRef<'a>>) -> bool {
        actor.into().effective_rank().at_least(SET_CSS_RANK)
    }

    #[must_use]
    pub fn can_set_js<'a>(&self, actor: impl Into<ActorRef<'a>>) -> bool {
        actor.into().effective_rank().at_least(SET_JS_RANK)
    }

    #[must_use]
    pub fn can_set_permissions<'a>(&self, actor: impl Into<ActorRef<'a>>) -> bool {
        actor.into().effective_rank().at_least(SET_PERMISSIONS_RANK)
    }
}
