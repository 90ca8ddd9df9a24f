pub mod channel;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod sync;

pub use config::Config;
pub use error::{Error, Result};
