//! The object store: owns every live distributed object for a zone (or
//! every replica a client/agent currently knows about), keyed by id with
//! O(1) lookup, and dispatches exactly-once lifecycle callbacks through a
//! set of hooks.
//!
//! Re-applying a `create` for an id the store already holds is treated as
//! a resync, not a duplicate: fields are merged into the existing instance
//! and `created` does not fire again, keeping a store-side cache from ever
//! narrating a spurious re-creation to user hooks.

use crate::error::StoreError;
use crate::object::DistributedObject;
use flux::logging::{self, Logger};
use flux::panic_guard::isolate;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// User-supplied reactions to object lifecycle events. Every method is run
/// through `flux::isolate`, so a panicking hook is logged and otherwise
/// harmless to the owning store.
pub trait ObjectHooks {
    fn created(&mut self, _object: &dyn DistributedObject) {}
    fn updated(&mut self, _object: &dyn DistributedObject, _delta: &BTreeMap<String, Value>) {}
    fn deleted(&mut self, _id: &str) {}
}

pub struct ObjectStore<H: ObjectHooks> {
    objects: IndexMap<String, Box<dyn DistributedObject>>,
    hooks: H,
    log: Logger,
}

impl<H: ObjectHooks> ObjectStore<H> {
    pub fn new(hooks: H, log: Logger) -> ObjectStore<H> {
        ObjectStore {
            objects: IndexMap::new(),
            hooks,
            log,
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn DistributedObject> {
        self.objects.get(id).map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(|s| s.as_str())
    }

    /// Inserts a freshly-constructed object, or merges an incoming
    /// duplicate `create` into the one already held. Fires `created`
    /// exactly once, the first time `id` is ever inserted.
    pub fn create(&mut self, id: String, mut object: Box<dyn DistributedObject>) {
        if let Some(existing) = self.objects.get_mut(&id) {
            let fields = object.snapshot();
            existing.state_mut().apply_remote(fields);
            logging::debug!(self.log, "merged duplicate create"; "id" => %id);
            return;
        }

        // Ensure the new object looks "created" from the hook's point of
        // view even if its constructor left it in the pre-flush dirty
        // state (e.g. a locally-originated `create` that hasn't round
        // tripped through the bus yet).
        if !object.is_created() {
            object.flush_delta();
        }

        self.objects.insert(id, object);
        let inserted = self.objects.last().expect("just inserted").1.as_ref();

        let log = &self.log;
        let hooks = &mut self.hooks;
        isolate(log, "ObjectHooks::created", || hooks.created(inserted));
    }

    /// Applies an update delta to an existing object. An `update` for an
    /// id the store has never seen a `create` for returns `NotFound`
    /// rather than fabricating an instance: a delta has no code name to
    /// construct from, and the id could simply belong to an object this
    /// process does not replicate. Callers log and drop on this error.
    pub fn update(
        &mut self,
        id: &str,
        delta: BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        object.state_mut().apply_remote(delta.clone());

        let log = &self.log;
        let hooks = &mut self.hooks;
        let object_ref = self.objects.get(id).expect("checked above").as_ref();
        isolate(log, "ObjectHooks::updated", || {
            hooks.updated(object_ref, &delta)
        });
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<Box<dyn DistributedObject>, StoreError> {
        let removed = self
            .objects
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let log = &self.log;
        let hooks = &mut self.hooks;
        isolate(log, "ObjectHooks::deleted", || hooks.deleted(id));
        Ok(removed)
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }
}
