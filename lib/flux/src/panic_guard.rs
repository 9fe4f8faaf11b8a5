//! Failure isolation for user-supplied hooks (zone/client callbacks,
//! authenticators). A panic inside a hook must not take down the owning
//! server's event loop: it is caught, logged, and the triggering message
//! is still considered delivered.

use crate::logging::{self, Logger};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs `f`, catching any panic and logging it against `log` instead of
/// letting it unwind into the caller (typically a server's message loop).
pub fn isolate<F, T>(log: &Logger, hook_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let reason = panic_message(&payload);
            logging::error!(log, "hook panicked"; "hook" => hook_name, "reason" => reason);
            None
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
