use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock `state`, recovering the guard if a previous holder panicked.
pub(crate) fn lock_state<'a, T>(state: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                "Recovered from poisoned backend state"
            );
            poisoned.into_inner()
        }
    }
}
