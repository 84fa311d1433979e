//! Thread-local resolution depth accounting.
//!
//! Containers and path trees may reference each other freely, so a cyclic
//! reference graph would otherwise recurse without bound at read time.
//! Resolution re-enters through public `get` calls inside morf and generator
//! closures, which rules out threading per-call state; a thread-local counter
//! covers every entry point instead.

use std::cell::Cell;

const MAX_DEPTH: usize = 128;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// RAII guard for one level of recursive resolution.
///
/// `enter` returns `None` once the depth limit is exceeded; callers map that
/// to their circular-reference error.
pub(crate) struct DepthGuard(());

impl DepthGuard {
    pub(crate) fn enter() -> Option<Self> {
        DEPTH.with(|depth| {
            if depth.get() >= MAX_DEPTH {
                None
            } else {
                depth.set(depth.get() + 1);
                Some(DepthGuard(()))
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}
