//! The distributed-object trait and the `distributed_object!` macro that
//! generates boilerplate implementations of it: hand-write the fields once,
//! let the macro wire up the repetitive trait plumbing.

use crate::error::WireError;
use crate::field::FieldSchema;
use crate::state::ObjectState;
use serde_json::Value;
use std::collections::BTreeMap;

/// Implemented by every generated distributed-object class. Kept
/// object-safe (`schema` is an instance method, not an associated
/// function) so the store and registry can hold `Box<dyn DistributedObject>`
/// uniformly regardless of concrete class.
pub trait DistributedObject: std::fmt::Debug + Send {
    /// The code name this instance was constructed under, e.g. `"Message"`.
    fn code_name(&self) -> &'static str;

    /// Stable identity, assigned at construction (see `ObjectStore::create`).
    fn id(&self) -> &str;

    /// The zone that authoritatively owns this object. Required on every
    /// distributed object.
    fn zone(&self) -> &str;

    /// The client id that owns this object, or `None` meaning "owned by
    /// the Zone itself" -- the other mandatory attribute alongside `id`
    /// and `zone`.
    fn owner(&self) -> Option<&str>;

    /// Assigns (or clears) the owning client id. Bypasses the dirty/saved
    /// map, like `id`/`zone`: ownership is mandatory metadata, not a
    /// declared schema field.
    fn set_owner(&mut self, owner: Option<String>);

    fn state(&self) -> &ObjectState;
    fn state_mut(&mut self) -> &mut ObjectState;

    /// This class's declared field schema, for documentation/defaulting
    /// purposes. An instance method (rather than `fn schema() -> &'static
    /// [FieldSchema]`) so the trait stays object-safe.
    fn schema(&self) -> &'static [FieldSchema];

    fn is_created(&self) -> bool {
        self.state().is_created()
    }

    /// Stages a `_delete()`: the tombstone flag set before the owning
    /// store actually removes the instance.
    fn mark_deleted(&mut self) {
        self.state_mut().mark_deleted();
    }

    fn is_deleted(&self) -> bool {
        self.state().is_deleted()
    }

    /// The full-snapshot payload sent the first time this object is
    /// published (channel `{zone}.create.{code_name}`). `owner` rides
    /// along on every full snapshot, `null` meaning Zone-owned.
    fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut fields = self.state().snapshot();
        fields.insert("id".to_string(), Value::from(self.id()));
        fields.insert("zone".to_string(), Value::from(self.zone()));
        fields.insert(
            "owner".to_string(),
            self.owner().map(Value::from).unwrap_or(Value::Null),
        );
        fields
    }

    /// The dirty-delta payload sent on every subsequent publish (channel
    /// `{zone}.update`). Clears the dirty set.
    fn flush_delta(&mut self) -> BTreeMap<String, Value> {
        let mut delta = self.state_mut().flush();
        delta.insert("id".to_string(), Value::from(self.id()));
        delta.insert("zone".to_string(), Value::from(self.zone()));
        delta
    }
}

/// A plain `id`/`zone` carrier used by classes that don't need the
/// convenience accessors `distributed_object!` would otherwise generate --
/// kept here mainly so `registry.rs`/`store.rs` unit tests have a minimal
/// concrete type to exercise without pulling in the macro.
#[derive(Debug)]
pub struct GenericObject {
    code_name: &'static str,
    id: String,
    zone: String,
    owner: Option<String>,
    schema: &'static [FieldSchema],
    state: ObjectState,
}

impl GenericObject {
    /// Zone-owned by default (`owner: None`); use `set_owner` for an
    /// object authored on behalf of a specific client.
    pub fn new(
        code_name: &'static str,
        id: String,
        zone: String,
        schema: &'static [FieldSchema],
    ) -> GenericObject {
        let mut state = ObjectState::new();
        for field in schema {
            state.set(field.name, field.kind.default_value());
        }
        GenericObject {
            code_name,
            id,
            zone,
            owner: None,
            schema,
            state,
        }
    }

    /// Rehydrates an object from an incoming wire payload (`create` snapshot
    /// or a freshly-assigned local id). `zone` must be present -- every
    /// distributed object belongs to a zone. `owner` is optional on the
    /// wire (absent or `null` both mean Zone-owned).
    pub fn from_fields(
        code_name: &'static str,
        id: String,
        schema: &'static [FieldSchema],
        mut fields: BTreeMap<String, Value>,
    ) -> Result<GenericObject, WireError> {
        let zone = match fields.remove("zone") {
            Some(Value::String(z)) => z,
            _ => return Err(WireError::MissingZone),
        };
        let owner = match fields.remove("owner") {
            Some(Value::String(c)) => Some(c),
            _ => None,
        };
        fields.remove("id");
        let mut obj = GenericObject::new(code_name, id, zone, schema);
        obj.owner = owner;
        obj.state.apply_remote(fields);
        Ok(obj)
    }
}

impl DistributedObject for GenericObject {
    fn code_name(&self) -> &'static str {
        self.code_name
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn zone(&self) -> &str {
        &self.zone
    }

    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn schema(&self) -> &'static [FieldSchema] {
        self.schema
    }
}

/// Declares a distributed-object class: a struct wrapping `GenericObject`
/// plus typed field accessors, giving a declarative field-list class body
/// the ergonomics of named fields while keeping the wire representation
/// identical to `GenericObject`.
///
/// ```ignore
/// distributed_object! {
///     pub struct Message {
///         body: Str,
///         author: Str,
///     }
/// }
/// ```
#[macro_export]
macro_rules! distributed_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $field:ident : $kind:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name {
            inner: $crate::object::GenericObject,
        }

        impl $name {
            pub const CODE_NAME: &'static str = stringify!($name);

            pub const SCHEMA: &'static [$crate::field::FieldSchema] = &[
                $( $crate::field::FieldSchema::new(
                    stringify!($field),
                    $crate::field::FieldKind::$kind,
                ) ),*
            ];

            /// Constructs a brand-new, not-yet-created instance local to
            /// this process (owning zone calling `create`).
            pub fn new(id: String, zone: String) -> $name {
                $name {
                    inner: $crate::object::GenericObject::new(
                        Self::CODE_NAME, id, zone, Self::SCHEMA,
                    ),
                }
            }

            /// Rehydrates from an incoming wire payload.
            pub fn from_fields(
                id: String,
                fields: std::collections::BTreeMap<String, serde_json::Value>,
            ) -> Result<$name, $crate::error::WireError> {
                Ok($name {
                    inner: $crate::object::GenericObject::from_fields(
                        Self::CODE_NAME, id, Self::SCHEMA, fields,
                    )?,
                })
            }

            $(
                pub fn $field(&self) -> serde_json::Value {
                    self.inner.state().get(stringify!($field))
                        .cloned()
                        .unwrap_or(serde_json::Value::Null)
                }
            )*

            /// Stages a write to a declared field. Takes the field name as
            /// a string rather than generating one `set_<field>` method per
            /// field -- `macro_rules!` has no identifier-pasting without an
            /// extra proc-macro dependency, and a single setter matches the
            /// original's dynamic `obj.field = value` assignment well enough.
            pub fn set(&mut self, field: &'static str, value: impl Into<serde_json::Value>) {
                self.inner.state_mut().set(field, value.into());
            }

            /// Tombstones this instance; the next `save` publishes a delete.
            pub fn delete(&mut self) {
                self.inner.state_mut().mark_deleted();
            }

            /// The owning client id, or `None` for Zone-owned.
            pub fn owner(&self) -> Option<&str> {
                self.inner.owner()
            }

            /// Assigns the owning client id (`None` hands it back to the Zone).
            pub fn set_owner(&mut self, owner: Option<String>) {
                self.inner.set_owner(owner)
            }
        }

        impl $crate::object::DistributedObject for $name {
            fn code_name(&self) -> &'static str { Self::CODE_NAME }
            fn id(&self) -> &str { self.inner.id() }
            fn zone(&self) -> &str { self.inner.zone() }
            fn owner(&self) -> Option<&str> { self.inner.owner() }
            fn set_owner(&mut self, owner: Option<String>) { self.inner.set_owner(owner) }
            fn state(&self) -> &$crate::state::ObjectState { self.inner.state() }
            fn state_mut(&mut self) -> &mut $crate::state::ObjectState { self.inner.state_mut() }
            fn schema(&self) -> &'static [$crate::field::FieldSchema] { Self::SCHEMA }
        }
    };
}
