//! The internal message catalogue:
//!
//! | Name           | Channel                     | Payload                |
//! |----------------|------------------------------|------------------------|
//! | Join           | `{zone_id}.join`             | client id              |
//! | Leave          | `{zone_id}.leave`            | client id              |
//! | Create         | `{zone_id}.create.{Class}`   | full JSON snapshot      |
//! | Update         | `{zone_id}.update`           | JSON with `id`, `zone`  |
//! | Delete         | `{zone_id}.delete`           | JSON with `id`          |
//! | Call (reserved)| `{zone_id}.call.{method}`    | JSON args               |
//! | Whisper        | `{client_id}.<method>[.code]`| as above               |
//!
//! Zone ids are also carried inside the serialized distributed object, so
//! the `{zone_id}` prefix on the channel itself is purely a bus-side
//! message-pruning mechanism: subscribing to `{target}.*` is what lets an
//! Agent or Zone receive only the messages addressed to it.

use crate::error::WireError;
use std::fmt;

/// The closed set of methods a channel can carry, tightened into a real enum
/// instead of a bare string -- the wire representation is unchanged.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Method {
    Create,
    Update,
    Delete,
    Call,
    Join,
    Leave,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Create => "create",
            Method::Update => "update",
            Method::Delete => "delete",
            Method::Call => "call",
            Method::Join => "join",
            Method::Leave => "leave",
        }
    }

    /// `code_name` is only meaningful on `create` (picks a class from the
    /// registry) and `call` (picks the method to invoke).
    pub fn takes_code_name(self) -> bool {
        matches!(self, Method::Create | Method::Call)
    }

    fn parse(s: &str) -> Option<Method> {
        match s {
            "create" => Some(Method::Create),
            "update" => Some(Method::Update),
            "delete" => Some(Method::Delete),
            "call" => Some(Method::Call),
            "join" => Some(Method::Join),
            "leave" => Some(Method::Leave),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted bus address: `target.method[.code_name]`. `target` is either a
/// zone id or a client id; the bus-side subscription pattern for a given
/// target `T` is always `T.*`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Channel {
    pub target: String,
    pub method: Method,
    pub code_name: Option<String>,
}

impl Channel {
    /// Construct a channel, validating the `code_name`/`method` pairing
    /// rule up front.
    pub fn new(
        target: impl Into<String>,
        method: Method,
        code_name: Option<String>,
    ) -> Result<Channel, WireError> {
        if code_name.is_some() && !method.takes_code_name() {
            return Err(WireError::BadChannel(format!(
                "code_name only valid on create/call, got method `{}`",
                method
            )));
        }
        Ok(Channel {
            target: target.into(),
            method,
            code_name,
        })
    }

    /// Parses `target.method[.code_name]`. Requires at least two dotted
    /// parts; fails on an unrecognized method or a misplaced code name.
    pub fn parse(expression: &str) -> Result<Channel, WireError> {
        let mut parts = expression.split('.');
        let target = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WireError::BadChannel(expression.to_string()))?;
        let method_str = parts
            .next()
            .ok_or_else(|| WireError::BadChannel(expression.to_string()))?;
        let method = Method::parse(method_str)
            .ok_or_else(|| WireError::BadChannel(format!("unknown method `{}`", method_str)))?;
        let code_name = parts.next().map(|s| s.to_string());
        // Any further dotted parts would be ambiguous -- reject rather than
        // silently truncating.
        if parts.next().is_some() {
            return Err(WireError::BadChannel(expression.to_string()));
        }

        Channel::new(target, method, code_name)
    }

    /// The bus subscription pattern that routes every method on `target` to
    /// this subscriber: `target.*`.
    pub fn subscribe_pattern(target: &str) -> String {
        format!("{}.*", target)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.method)?;
        if let Some(code) = &self.code_name {
            write!(f, ".{}", code)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_join() {
        let c = Channel::new("chat", Method::Join, None).unwrap();
        let s = c.to_string();
        assert_eq!(s, "chat.join");
        assert_eq!(Channel::parse(&s).unwrap(), c);
    }

    #[test]
    fn round_trip_create_with_code_name() {
        let c = Channel::new("chat", Method::Create, Some("Message".to_string())).unwrap();
        let s = c.to_string();
        assert_eq!(s, "chat.create.Message");
        assert_eq!(Channel::parse(&s).unwrap(), c);
    }

    #[test]
    fn code_name_forbidden_outside_create_call() {
        let err = Channel::new("chat", Method::Update, Some("Message".to_string())).unwrap_err();
        assert!(matches!(err, WireError::BadChannel(_)));
    }

    #[test]
    fn parse_rejects_single_part() {
        assert!(Channel::parse("chat").is_err());
    }

    #[test]
    fn parse_rejects_unknown_method() {
        assert!(Channel::parse("chat.frobnicate").is_err());
    }

    #[test]
    fn parse_rejects_too_many_parts() {
        assert!(Channel::parse("chat.create.Message.extra").is_err());
    }

    #[test]
    fn subscribe_pattern_is_target_star() {
        assert_eq!(Channel::subscribe_pattern("chat"), "chat.*");
        assert_eq!(Channel::subscribe_pattern("c1"), "c1.*");
    }

    #[test]
    fn whisper_channel_parses_like_any_other() {
        let c = Channel::parse("c1.create.Message").unwrap();
        assert_eq!(c.target, "c1");
        assert_eq!(c.method, Method::Create);
        assert_eq!(c.code_name.as_deref(), Some("Message"));
    }
}
