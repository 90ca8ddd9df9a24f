use serde::{Deserialize, Serialize};

use super::rank::Rank;
use crate::sync::Session;

/// A rank-bearing identity.
///
/// The effective rank is an external fact supplied by the account/session
/// layer; the permission engine never computes it, only compares it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub effective_rank: Rank,
}

impl Account {
    #[must_use]
    pub fn new(name: impl Into<String>, effective_rank: Rank) -> Self {
        Self {
            name: name.into(),
            effective_rank,
        }
    }
}

/// Tagged reference to something that can be permission-checked: a live
/// session or a bare account. Replaces ad-hoc duck-typing at engine entry
/// points with one explicit resolution step.
#[derive(Clone, Copy)]
pub enum ActorRef<'a> {
    Session(&'a Session),
    Account(&'a Account),
}

impl<'a> ActorRef<'a> {
    /// Resolve to the underlying account.
    #[must_use]
    pub fn account(self) -> &'a Account {
        match self {
            Self::Session(session) => &session.account,
            Self::Account(account) => account,
        }
    }

    #[must_use]
    pub fn effective_rank(self) -> Rank {
        self.account().effective_rank
    }
}

impl<'a> From<&'a Session> for ActorRef<'a> {
    fn from(session: &'a Session) -> Self {
        Self::Session(session)
    }
}

impl<'a> From<&'a Account> for ActorRef<'a> {
    fn from(account: &'a Account) -> Self {
        Self::Account(account)
    }
}
