//! Message protocol for the place canvas service
//!
//! Defines the requests a client sends, the responses the service returns,
//! and the envelope that pairs them up when requests are served concurrently.

pub mod error;
pub mod messages;
pub mod types;

pub use error::*;
pub use messages::*;
pub use types::*;
