//! The internal pub/sub bus adapter: isolates every server process from the
//! concrete broker (Redis) behind a small `Bus` trait, so `pastry-agent`,
//! `pastry-zone` and `pastry-client` depend only on `subscribe`/`unsubscribe`/
//! `publish`/`poll`/`recv`, never on `redis` directly.

pub mod adapter;
pub mod error;
pub mod fake;
pub mod message;
pub mod redis_bus;

pub use adapter::Bus;
pub use error::BusError;
pub use fake::{Broker, FakeBus};
pub use message::BusMessage;
pub use redis_bus::{RedisBus, SharedRedisBus};
