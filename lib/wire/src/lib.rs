//! Channel grammar, distributed-object framework, class registry and
//! object store: the shared wire-level vocabulary that the bus, agent,
//! zone and client crates all build on.

pub mod channel;
pub mod error;
pub mod field;
pub mod object;
pub mod registry;
pub mod state;
pub mod store;

pub use channel::{Channel, Method};
pub use error::{StoreError, WireError};
pub use field::{FieldKind, FieldSchema};
pub use object::{DistributedObject, GenericObject};
pub use registry::{ClassRegistry, Constructor};
pub use state::ObjectState;
pub use store::{ObjectHooks, ObjectStore};
