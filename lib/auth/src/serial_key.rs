//! Serial-key authenticator: looks a client-supplied serial key up in a
//! table loaded at startup, rejecting unknown keys and banned accounts,
//! with partially-redacted logging of attempted keys. No connection-token
//! or AEAD crypto here -- transport encryption is out of scope.

use crate::authenticator::{AuthOutcome, Authenticator};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flux::logging::{self, Logger};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const KEY_VISIBLE_SUFFIX: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ban {
    pub created: DateTime<Utc>,
    pub expiry: Option<DateTime<Utc>>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub client_id: String,
    pub created: DateTime<Utc>,
    pub ban: Option<Ban>,
}

impl UserInfo {
    pub fn new(client_id: impl Into<String>) -> UserInfo {
        UserInfo {
            client_id: client_id.into(),
            created: Utc::now(),
            ban: None,
        }
    }
}

pub struct SerialKeyAuthenticator {
    users: HashMap<String, UserInfo>,
    log: Logger,
}

impl SerialKeyAuthenticator {
    pub fn new(users: HashMap<String, UserInfo>, log: Logger) -> SerialKeyAuthenticator {
        SerialKeyAuthenticator { users, log }
    }

    pub fn from_json_file(path: impl AsRef<std::path::Path>, log: Logger) -> std::io::Result<SerialKeyAuthenticator> {
        let file = std::fs::File::open(path)?;
        let users: HashMap<String, UserInfo> = serde_json::from_reader(file)?;
        Ok(SerialKeyAuthenticator::new(users, log))
    }

    /// Masks everything but the trailing `KEY_VISIBLE_SUFFIX` characters of
    /// a serial key before it is written to a log line.
    fn protect_key(serial_key: &str) -> String {
        let len = serial_key.chars().count();
        serial_key
            .chars()
            .enumerate()
            .map(|(idx, ch)| if idx + KEY_VISIBLE_SUFFIX < len { '*' } else { ch })
            .collect()
    }
}

#[async_trait]
impl Authenticator for SerialKeyAuthenticator {
    async fn authenticate(&self, credentials: &Value) -> AuthOutcome {
        let serial_key = match credentials.get("serial_key").and_then(Value::as_str) {
            Some(key) => key,
            None => {
                logging::info!(self.log, "authentication"; "result" => "missing-serial-key");
                return AuthOutcome::Rejected;
            }
        };

        logging::debug!(self.log, "authentication attempt"; "key" => Self::protect_key(serial_key));

        match self.users.get(serial_key) {
            Some(info) => {
                let active_ban = info
                    .ban
                    .as_ref()
                    .filter(|ban| ban.expiry.map_or(true, |expiry| Utc::now() < expiry));
                if let Some(ban) = active_ban {
                    logging::info!(
                        self.log,
                        "authentication";
                        "result" => "banned",
                        "client_id" => &info.client_id,
                        "key" => Self::protect_key(serial_key),
                        "reason" => &ban.reason
                    );
                    return AuthOutcome::Banned {
                        reason: ban.reason.clone(),
                    };
                }

                logging::info!(
                    self.log,
                    "authentication";
                    "result" => "ok",
                    "client_id" => &info.client_id,
                    "key" => Self::protect_key(serial_key)
                );
                AuthOutcome::Accepted(info.client_id.clone())
            }
            None => {
                logging::info!(
                    self.log,
                    "authentication";
                    "result" => "notfound",
                    "key" => Self::protect_key(serial_key)
                );
                AuthOutcome::Rejected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_logger() -> Logger {
        flux::logging::init("test")
    }

    fn users_with(key: &str, info: UserInfo) -> HashMap<String, UserInfo> {
        let mut users = HashMap::new();
        users.insert(key.to_string(), info);
        users
    }

    #[tokio::test]
    async fn unknown_key_is_rejected() {
        let auth = SerialKeyAuthenticator::new(HashMap::new(), test_logger());
        let outcome = auth.authenticate(&json!({"serial_key": "nope"})).await;
        assert_eq!(outcome, AuthOutcome::Rejected);
    }

    #[tokio::test]
    async fn known_key_is_accepted_with_its_client_id() {
        let users = users_with("abc123", UserInfo::new("c1"));
        let auth = SerialKeyAuthenticator::new(users, test_logger());
        let outcome = auth.authenticate(&json!({"serial_key": "abc123"})).await;
        assert_eq!(outcome, AuthOutcome::Accepted("c1".to_string()));
    }

    #[tokio::test]
    async fn banned_key_is_rejected_with_reason() {
        let mut info = UserInfo::new("c1");
        info.ban = Some(Ban {
            created: Utc::now(),
            expiry: None,
            reason: "cheating".to_string(),
        });
        let users = users_with("abc123", info);
        let auth = SerialKeyAuthenticator::new(users, test_logger());
        let outcome = auth.authenticate(&json!({"serial_key": "abc123"})).await;
        assert_eq!(
            outcome,
            AuthOutcome::Banned {
                reason: "cheating".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_serial_key_field_is_rejected() {
        let auth = SerialKeyAuthenticator::new(HashMap::new(), test_logger());
        let outcome = auth.authenticate(&json!({"token": "whatever"})).await;
        assert_eq!(outcome, AuthOutcome::Rejected);
    }

    #[tokio::test]
    async fn expired_ban_no_longer_rejects() {
        let mut info = UserInfo::new("c1");
        info.ban = Some(Ban {
            created: Utc::now() - chrono::Duration::days(30),
            expiry: Some(Utc::now() - chrono::Duration::days(1)),
            reason: "cheating".to_string(),
        });
        let users = users_with("abc123", info);
        let auth = SerialKeyAuthenticator::new(users, test_logger());
        let outcome = auth.authenticate(&json!({"serial_key": "abc123"})).await;
        assert_eq!(outcome, AuthOutcome::Accepted("c1".to_string()));
    }

    #[test]
    fn protect_key_masks_all_but_the_trailing_characters() {
        assert_eq!(SerialKeyAuthenticator::protect_key("abcdefghijkl"), "****efghijkl");
        assert_eq!(SerialKeyAuthenticator::protect_key("short"), "short");
    }
}
