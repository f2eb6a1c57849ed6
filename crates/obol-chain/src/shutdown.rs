//! Cooperative shutdown signal polled by long-running storage scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable shutdown flag. Long scans poll it at coarse intervals and
/// bail out cleanly on a row boundary when it is raised.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_shared_across_clones() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();
        assert!(!other.is_requested());
        flag.request();
        assert!(other.is_requested());
    }
}
