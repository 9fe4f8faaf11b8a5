//! The Client replica: connects to an Agent, authenticates,
//! mirrors whatever objects it is routed, and authors its own creates and
//! updates back through the same socket.

pub mod config;
pub mod error;
pub mod hooks;
pub mod replica;

pub use config::ClientConfig;
pub use error::ClientError;
pub use hooks::{ClientHooks, NoopHooks};
pub use replica::Client;
