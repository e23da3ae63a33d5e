//! Rejects a purchase while an identical one is still running.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`, or returns `None` when another caller holds it. The
    /// claim is released when the permit is dropped.
    pub fn try_acquire(&self, key: &str) -> Option<InFlightPermit> {
        if !self.lock().insert(key.to_string()) {
            return None;
        }

        Some(InFlightPermit {
            keys: Arc::clone(&self.keys),
            key: key.to_string(),
        })
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct InFlightPermit {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let guard = InFlightGuard::new();

        let permit = guard.try_acquire("k").expect("first acquire");
        assert!(guard.try_acquire("k").is_none());
        assert!(guard.try_acquire("other").is_some());

        drop(permit);
        assert!(!guard.is_held("k"));
        assert!(guard.try_acquire("k").is_some());
    }
}
