//! Global dry-run state.
//!
//! Dry-run mode is process-wide: when enabled, mutating steps (dependency
//! installation, the final exec hand-off) are logged and skipped, while
//! read-only steps (interpreter discovery, import probes) still execute so
//! the preview is realistic.

use std::sync::atomic::{AtomicBool, Ordering};

static DRY_RUN: AtomicBool = AtomicBool::new(false);

/// Enable dry-run mode for the rest of the process lifetime.
pub fn enable_dry_run() {
    DRY_RUN.store(true, Ordering::SeqCst);
    log::info!("Dry-run mode enabled: install and exec will be skipped");
}

/// Disable dry-run mode (used by tests to reset global state).
#[allow(dead_code)] // Test/debug utility
pub fn disable_dry_run() {
    DRY_RUN.store(false, Ordering::SeqCst);
}

/// Check whether dry-run mode is active.
pub fn is_dry_run() -> bool {
    DRY_RUN.load(Ordering::SeqCst)
}

/// Serializes tests that flip the global flag so they cannot interleave.
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_toggle() {
        let _guard = test_guard();

        disable_dry_run();
        assert!(!is_dry_run());

        enable_dry_run();
        assert!(is_dry_run());

        disable_dry_run();
        assert!(!is_dry_run());
    }
}
