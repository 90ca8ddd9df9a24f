pub mod actor;
pub mod id;
pub mod permission;
pub mod rank;

pub use actor::{Account, ActorRef};
pub use id::{ChannelId, SessionId};
pub use permission::{parse_threshold, PermissionTable};
pub use rank::Rank;
