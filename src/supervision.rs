//! Supervised-region combinator
//!
//! Runs a fallible region of work, substituting a fallback value and logging
//! the fault if it panics. Used around per-frame scoring so a bad frame never
//! takes down the sampler loop.

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, returning `fallback()` and logging the fault if it panics
pub fn supervised<T>(region: &str, fallback: impl FnOnce() -> T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let detail = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            log::error!("Supervised region '{}' faulted: {}", region, detail);
            fallback()
        }
    }
}
