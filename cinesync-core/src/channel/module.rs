//! Channel module framework.
//!
//! Each feature of a channel (permissions, playlist, polls, chat filters)
//! is one module with a small closed interface; modules are composed by
//! explicit registration, and the registry drives the shared
//! load/save/join lifecycle against one JSON blob per channel.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::sync::Session;
use crate::Result;

/// Per-channel persisted state blob shared by all modules.
pub type ChannelData = Map<String, Value>;

/// Interface every channel module implements.
///
/// Modules keep their state behind interior locks, so the whole interface
/// takes `&self` and a module can be shared with the subsystems that query
/// it while the registry drives its lifecycle.
pub trait ChannelModule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Populate module state from the persisted channel blob. Called exactly
    /// once per channel activation.
    fn on_load(&self, data: &Value);

    /// Serialize module state into the channel blob.
    fn on_save(&self, data: &mut ChannelData);

    /// Called once per session after join setup completes.
    fn on_session_join(&self, _session: &Session) {}

    /// Whether in-memory state has diverged from the last persisted
    /// snapshot.
    fn dirty(&self) -> bool;
}

/// Explicit module composition for one channel.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn ChannelModule>>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Arc<dyn ChannelModule>) {
        self.modules.push(module);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ChannelModule>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Load every module from one persisted blob.
    pub fn load_all(&self, data: &Value) {
        for module in &self.modules {
            module.on_load(data);
        }
    }

    /// Collect every module's state into one blob.
    #[must_use]
    pub fn save_all(&self) -> ChannelData {
        let mut data = ChannelData::new();
        for module in &self.modules {
            module.on_save(&mut data);
        }
        data
    }

    /// Load from raw persisted bytes (the persistence adapter's format).
    pub fn load_from_slice(&self, raw: &[u8]) -> Result<()> {
        let data: Value = serde_json::from_slice(raw)?;
        self.load_all(&data);
        Ok(())
    }

    /// Serialize all module state for the persistence adapter.
    pub fn save_to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.save_all())?)
    }

    /// Run every module's join hook for a new session.
    pub fn notify_session_join(&self, session: &Session) {
        for module in &self.modules {
            module.on_session_join(session);
        }
    }

    /// True if any module needs a persistence flush.
    #[must_use]
    pub fn any_dirty(&self) -> bool {
        self.modules.iter().any(|module| module.dirty())
    }
}
