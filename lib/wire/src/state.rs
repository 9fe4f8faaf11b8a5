//! The two-layer field map every distributed object carries: `saved` holds
//! the last value that has gone out over the bus, `dirty` holds writes made
//! since then. An object is "created" (has gone out at least once) the
//! moment `saved` is non-empty.

use serde_json::Value;
use std::collections::BTreeMap;

/// `BTreeMap` rather than `HashMap` so `snapshot`/`drain_dirty` serialize
/// fields in a stable order -- convenient for tests and for diffing wire
/// traffic by eye.
#[derive(Debug, Clone, Default)]
pub struct ObjectState {
    saved: BTreeMap<String, Value>,
    dirty: BTreeMap<String, Value>,
    deleted: bool,
}

impl ObjectState {
    pub fn new() -> ObjectState {
        ObjectState::default()
    }

    /// An object is "created" once it has been flushed to `saved` at least
    /// once. Brand new objects, pre-flush, are not yet created.
    pub fn is_created(&self) -> bool {
        !self.saved.is_empty()
    }

    /// Reads the live value of a field: the dirty write if there is one,
    /// otherwise the last saved value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.dirty.get(field).or_else(|| self.saved.get(field))
    }

    /// Stages a write. Does not touch `saved` -- only `flush` does that.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.dirty.insert(field.into(), value);
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// The full current state (saved, overlaid with dirty), as would be
    /// sent on `create`.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut merged = self.saved.clone();
        merged.extend(self.dirty.clone());
        merged
    }

    /// Moves every dirty field into `saved` and returns just the delta, as
    /// would be sent on `update`. Leaves `dirty` empty.
    pub fn flush(&mut self) -> BTreeMap<String, Value> {
        let delta = std::mem::take(&mut self.dirty);
        self.saved.extend(delta.clone());
        delta
    }

    /// Applies an incoming snapshot or delta (from the bus) directly to
    /// `saved`, bypassing `dirty` -- used on the replica side, which never
    /// originates writes of its own for fields it doesn't own.
    pub fn apply_remote(&mut self, fields: BTreeMap<String, Value>) {
        self.saved.extend(fields);
    }

    /// Sets the tombstone flag. The object stays addressable (by id) until
    /// its owning store actually removes it, but is flagged so the next
    /// `save` publishes a delete instead of a create/update.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_not_created() {
        let s = ObjectState::new();
        assert!(!s.is_created());
    }

    #[test]
    fn flush_moves_dirty_into_saved_and_clears_dirty() {
        let mut s = ObjectState::new();
        s.set("hp", Value::from(10));
        assert!(s.has_dirty());
        let delta = s.flush();
        assert_eq!(delta.get("hp"), Some(&Value::from(10)));
        assert!(!s.has_dirty());
        assert!(s.is_created());
        assert_eq!(s.get("hp"), Some(&Value::from(10)));
    }

    #[test]
    fn get_prefers_dirty_over_saved() {
        let mut s = ObjectState::new();
        s.set("hp", Value::from(10));
        s.flush();
        s.set("hp", Value::from(5));
        assert_eq!(s.get("hp"), Some(&Value::from(5)));
        assert_eq!(s.snapshot().get("hp"), Some(&Value::from(5)));
    }

    #[test]
    fn apply_remote_writes_directly_to_saved() {
        let mut s = ObjectState::new();
        let mut fields = BTreeMap::new();
        fields.insert("hp".to_string(), Value::from(99));
        s.apply_remote(fields);
        assert!(s.is_created());
        assert!(!s.has_dirty());
    }

    #[test]
    fn fresh_state_is_not_deleted() {
        let s = ObjectState::new();
        assert!(!s.is_deleted());
    }

    #[test]
    fn mark_deleted_sets_the_tombstone() {
        let mut s = ObjectState::new();
        s.mark_deleted();
        assert!(s.is_deleted());
    }
}
