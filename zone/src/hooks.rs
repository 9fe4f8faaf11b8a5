//! The `client_connected`/`client_disconnected` hooks fired on join/leave,
//! plus the object lifecycle hooks the underlying `wire::ObjectStore`
//! already fires. Expressed as a trait with default no-op methods, matching
//! `wire::ObjectHooks`'s own shape.

use serde_json::Value;
use std::collections::BTreeMap;
use wire::DistributedObject;

pub trait ZoneHooks: Send {
    fn object_created(&mut self, _object: &dyn DistributedObject) {}
    fn object_updated(&mut self, _object: &dyn DistributedObject, _delta: &BTreeMap<String, Value>) {}
    fn object_deleted(&mut self, _id: &str) {}

    fn client_connected(&mut self, _client_id: &str) {}
    fn client_disconnected(&mut self, _client_id: &str) {}

    /// `call` semantics are reserved and unspecified here. Default no-op
    /// stub; embedding games override this for their own RPC-like methods.
    fn on_call(&mut self, _caller_target: &str, _method: &str, _args: Value) {}
}

/// A `ZoneHooks` that reacts to nothing -- the default for zones that only
/// care about replication, not lifecycle notifications.
#[derive(Default)]
pub struct NoopHooks;

impl ZoneHooks for NoopHooks {}

/// Adapts a `ZoneHooks` into the `wire::ObjectHooks` the generic
/// `ObjectStore` expects, so a `Zone` can be generic over one user-facing
/// hook trait instead of two.
pub(crate) struct HookAdapter<H: ZoneHooks>(pub H);

impl<H: ZoneHooks> wire::ObjectHooks for HookAdapter<H> {
    fn created(&mut self, object: &dyn DistributedObject) {
        self.0.object_created(object);
    }

    fn updated(&mut self, object: &dyn DistributedObject, delta: &BTreeMap<String, Value>) {
        self.0.object_updated(object, delta);
    }

    fn deleted(&mut self, id: &str) {
        self.0.object_deleted(id);
    }
}
