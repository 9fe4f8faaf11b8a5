//! Maps a class's code name to a constructor, so a `create` message
//! carrying `{zone}.create.{CodeName}` can be turned into a live
//! `Box<dyn DistributedObject>` without the receiving process having to
//! know about every class at compile time via a giant match statement.

use crate::error::WireError;
use crate::object::DistributedObject;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::HashMap;

pub type Constructor =
    fn(String, BTreeMap<String, Value>) -> Result<Box<dyn DistributedObject>, WireError>;

#[derive(Default)]
pub struct ClassRegistry {
    constructors: HashMap<&'static str, Constructor>,
}

impl ClassRegistry {
    pub fn new() -> ClassRegistry {
        ClassRegistry::default()
    }

    /// Registers a class under `code_name`. Fails if that name is already
    /// taken -- two classes racing for the same code name is a programming
    /// error the registry surfaces rather than silently resolves by
    /// last-write-wins.
    pub fn register(
        &mut self,
        code_name: &'static str,
        constructor: Constructor,
    ) -> Result<(), WireError> {
        if self.constructors.contains_key(code_name) {
            return Err(WireError::DuplicateClass(code_name.to_string()));
        }
        self.constructors.insert(code_name, constructor);
        Ok(())
    }

    /// Builds an instance of `code_name` from an incoming wire payload.
    pub fn construct(
        &self,
        code_name: &str,
        id: String,
        fields: BTreeMap<String, Value>,
    ) -> Result<Box<dyn DistributedObject>, WireError> {
        let constructor = self
            .constructors
            .get(code_name)
            .ok_or_else(|| WireError::UnknownClass(code_name.to_string()))?;
        constructor(id, fields)
    }

    pub fn is_registered(&self, code_name: &str) -> bool {
        self.constructors.contains_key(code_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed_object;

    distributed_object! {
        pub struct Ping {
            count: Int,
        }
    }

    fn ping_ctor(
        id: String,
        fields: BTreeMap<String, Value>,
    ) -> Result<Box<dyn DistributedObject>, WireError> {
        Ping::from_fields(id, fields).map(|p| Box::new(p) as Box<dyn DistributedObject>)
    }

    #[test]
    fn register_then_construct_round_trips() {
        let mut registry = ClassRegistry::new();
        registry.register(Ping::CODE_NAME, ping_ctor).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("zone".to_string(), Value::from("lobby"));
        fields.insert("count".to_string(), Value::from(3));

        let obj = registry
            .construct("Ping", "p1".to_string(), fields)
            .unwrap();
        assert_eq!(obj.id(), "p1");
        assert_eq!(obj.zone(), "lobby");
        assert_eq!(obj.code_name(), "Ping");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ClassRegistry::new();
        registry.register(Ping::CODE_NAME, ping_ctor).unwrap();
        let err = registry.register(Ping::CODE_NAME, ping_ctor).unwrap_err();
        assert!(matches!(err, WireError::DuplicateClass(_)));
    }

    #[test]
    fn unknown_class_is_rejected() {
        let registry = ClassRegistry::new();
        let err = registry
            .construct("Nope", "x1".to_string(), BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, WireError::UnknownClass(_)));
    }
}
