use std::sync::{LockResult, Mutex, MutexGuard};

use tracing::warn;

/// Locks the cache state, recovering the guard if a previous holder panicked.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    recover(lock.lock(), target, op)
}

fn recover<G>(result: LockResult<G>, target: &'static str, op: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            op,
            target_module = target,
            result = "poisoned_recovered",
            hint = "cached settings may be stale after a panic in another task",
            "Recovered from poisoned settings cache lock"
        );
        poisoned.into_inner()
    })
}
