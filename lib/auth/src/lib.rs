//! The `Authenticator` external collaborator: the fabric defines only the
//! handshake shape (one line of JSON credentials in, one client id line
//! out) and where it plugs into the Agent. This crate carries that trait
//! plus a reference serial-key implementation, minus any connection-token
//! crypto -- transport encryption is out of scope here, so the reference
//! authenticator hands back a plain client id string.

pub mod authenticator;
pub mod serial_key;

pub use authenticator::{AuthOutcome, Authenticator};
pub use serial_key::{Ban, SerialKeyAuthenticator, UserInfo};
