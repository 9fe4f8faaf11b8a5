//! A reserved permission hook at Agent ingress to reject forbidden channels
//! before publish; no default policy beyond allow-all is specified.
//! `AllowAll` is the default -- embedding applications that need a real
//! policy implement `PermissionGuard` themselves and hand it to
//! `Agent::new`.

use wire::Channel;

pub trait PermissionGuard: Send + Sync {
    /// Returns `true` if `client_id` may publish on `channel`. Called once
    /// per ingress frame, before the Agent forwards it to the bus.
    fn allow(&self, client_id: &str, channel: &Channel) -> bool;
}

pub struct AllowAll;

impl PermissionGuard for AllowAll {
    fn allow(&self, _client_id: &str, _channel: &Channel) -> bool {
        true
    }
}
