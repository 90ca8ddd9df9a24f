pub mod module;
pub mod permissions;

pub use module::{ChannelData, ChannelModule, ModuleRegistry};
pub use permissions::{AuditSink, PermissionsModule, PlaylistObserver, TracingAudit};
