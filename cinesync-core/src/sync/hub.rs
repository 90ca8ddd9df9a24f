//! In-memory hub for routing state pushes to connected sessions.
//!
//! Delivery is best-effort and non-blocking per recipient: a dead receiver
//! never stalls fan-out to the rest, it just gets pruned.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::ServerEvent;
use crate::models::{Account, ChannelId, SessionId};

/// Message sender for a connected session
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// A connected, join-complete session in a channel.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub channel_id: ChannelId,
    pub account: Account,
    sender: EventSender,
}

impl Session {
    /// Queue an event for this session. Returns false if the receiver is
    /// gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.account.name
    }
}

/// Fan-out addressing for state pushes.
#[derive(Debug, Clone)]
pub enum PushTarget {
    /// Every session currently in the channel.
    AllSessions,
    /// A specific subset, e.g. one newly joined session.
    Sessions(Vec<SessionId>),
}

impl PushTarget {
    fn includes(&self, session_id: &SessionId) -> bool {
        match self {
            Self::AllSessions => true,
            Self::Sessions(ids) => ids.contains(session_id),
        }
    }
}

/// Routes engine events to the sessions of each channel.
#[derive(Clone, Default)]
pub struct SessionHub {
    /// Map of channel_id -> sessions in that channel
    channels: Arc<DashMap<ChannelId, Vec<Session>>>,

    /// Map of session_id -> channel_id for cleanup
    connections: Arc<DashMap<SessionId, ChannelId>>,
}

impl SessionHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session in a channel. Returns the session handle and the
    /// receiver the transport drains.
    pub fn join(
        &self,
        channel_id: ChannelId,
        account: Account,
    ) -> (Session, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let session = Session {
            id: SessionId::new(),
            channel_id: channel_id.clone(),
            account,
            sender: tx,
        };

        self.channels
            .entry(channel_id.clone())
            .or_default()
            .push(session.clone());
        self.connections.insert(session.id.clone(), channel_id.clone());

        info!(
            channel_id = %channel_id,
            session_id = %session.id,
            name = %session.name(),
            "Session joined channel"
        );

        (session, rx)
    }

    /// Remove a session from its channel.
    pub fn leave(&self, session_id: &SessionId) {
        if let Some((_, channel_id)) = self.connections.remove(session_id) {
            if let Some(mut sessions) = self.channels.get_mut(&channel_id) {
                sessions.retain(|session| session.id != *session_id);

                if sessions.is_empty() {
                    drop(sessions); // Drop the RefMut before removing
                    self.channels.remove(&channel_id);
                    debug!(channel_id = %channel_id, "Channel has no more sessions, removed");
                }
            }

            info!(
                channel_id = %channel_id,
                session_id = %session_id,
                "Session left channel"
            );
        } else {
            warn!(session_id = %session_id, "Attempted to remove unknown session");
        }
    }

    /// Push an event to the targeted sessions of a channel. Returns how many
    /// sessions it reached; dead receivers are pruned afterwards.
    pub fn push(&self, channel_id: &ChannelId, target: &PushTarget, event: ServerEvent) -> usize {
        let mut sent_count = 0;
        let mut failed_sessions = Vec::new();

        if let Some(sessions) = self.channels.get(channel_id) {
            for session in sessions.iter() {
                if !target.includes(&session.id) {
                    continue;
                }

                if session.send(event.clone()) {
                    sent_count += 1;
                } else {
                    warn!(
                        channel_id = %channel_id,
                        session_id = %session.id,
                        event_type = %event.event_type(),
                        "Failed to send event to session, marking for cleanup"
                    );
                    failed_sessions.push(session.id.clone());
                }
            }
        }

        for session_id in failed_sessions {
            self.leave(&session_id);
        }

        if sent_count > 0 {
            debug!(
                channel_id = %channel_id,
                sent_count = sent_count,
                event_type = %event.event_type(),
                "Event push complete"
            );
        }

        sent_count
    }

    /// Forcibly disconnect a session, delivering the reason first. Used for
    /// protocol violations.
    pub fn kick(&self, session_id: &SessionId, reason: &str) {
        if let Some(channel_id) = self.connections.get(session_id).map(|c| c.value().clone()) {
            warn!(
                channel_id = %channel_id,
                session_id = %session_id,
                reason = %reason,
                "Kicking session"
            );
            self.push(
                &channel_id,
                &PushTarget::Sessions(vec![session_id.clone()]),
                ServerEvent::Kicked {
                    reason: reason.to_string(),
                },
            );
        }
        self.leave(session_id);
    }

    /// Number of sessions in a channel
    #[must_use]
    pub fn session_count(&self, channel_id: &ChannelId) -> usize {
        self.channels
            .get(channel_id)
            .map(|sessions| sessions.len())
            .unwrap_or(0)
    }

    /// Number of channels with at least one session
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
