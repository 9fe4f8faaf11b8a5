pub mod error;
pub mod multiserver;

pub use error::RunnerError;
pub use multiserver::{ManagedServer, MultiServer};
