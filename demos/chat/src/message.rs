//! The one distributed-object class this demo ships: a chat line.

use serde_json::Value;
use std::collections::BTreeMap;
use wire::{distributed_object, ClassRegistry, DistributedObject, WireError};

distributed_object! {
    pub struct Message {
        text: Str,
        author: Str,
    }
}

fn construct(
    id: String,
    fields: BTreeMap<String, Value>,
) -> Result<Box<dyn DistributedObject>, WireError> {
    Message::from_fields(id, fields).map(|m| Box::new(m) as Box<dyn DistributedObject>)
}

/// Registers every class this demo defines. Embedding binaries call this
/// once when building the `ClassRegistry` they hand to a `Zone` or `Client`.
pub fn register_classes(registry: &mut ClassRegistry) -> Result<(), WireError> {
    registry.register(Message::CODE_NAME, construct)
}
