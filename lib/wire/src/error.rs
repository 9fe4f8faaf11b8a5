//! Error kinds shared by the channel grammar, the distributed-object
//! framework and the object store.

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum WireError {
    /// Malformed channel expression: fewer than two dotted parts, or a
    /// `code_name` on a method other than `create`/`call`.
    #[error("bad channel: {0}")]
    BadChannel(String),

    /// `create`/`call` referenced a code name that was never registered.
    #[error("unregistered distributed object class: {0}")]
    UnknownClass(String),

    /// A distributed object was constructed without a `zone` field.
    #[error("distributed object must have a `zone`")]
    MissingZone,

    /// Two classes were registered under the same code name.
    #[error("duplicate class registration: {0}")]
    DuplicateClass(String),
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum StoreError {
    /// `update`/`delete` referenced an id the store does not hold.
    #[error("no object with id {0}")]
    NotFound(String),
}
