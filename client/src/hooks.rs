//! The replica's lifecycle hooks, all default no-op, for symmetry with
//! `wire::ObjectHooks` -- but only `object_created` is expected to see
//! regular use, since a replica's `update`/`delete` paths rarely need a
//! reaction beyond the mirrored state itself.

use serde_json::Value;
use std::collections::BTreeMap;
use wire::DistributedObject;

pub trait ClientHooks: Send {
    fn object_created(&mut self, _object: &dyn DistributedObject) {}
    fn object_updated(&mut self, _object: &dyn DistributedObject, _delta: &BTreeMap<String, Value>) {}
    fn object_deleted(&mut self, _id: &str) {}
}

#[derive(Default)]
pub struct NoopHooks;

impl ClientHooks for NoopHooks {}

pub(crate) struct HookAdapter<H: ClientHooks>(pub H);

impl<H: ClientHooks> wire::ObjectHooks for HookAdapter<H> {
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
