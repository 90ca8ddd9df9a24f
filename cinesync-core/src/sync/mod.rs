pub mod events;
pub mod hub;

pub use events::{ClientRequest, ServerEvent};
pub use hub::{PushTarget, Session, SessionHub};
