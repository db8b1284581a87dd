use std::sync::{Mutex, MutexGuard, PoisonError};

use memfuse_core::ShapeStructure;

/// Every distinct shape structure seen so far, in first-seen order.
///
/// Append-only. Membership is a linear scan with structural equality; this
/// only decides whether a call shape is new, it never holds compiled code.
#[derive(Debug, Default)]
pub struct CompilationCache {
    seen: Mutex<Vec<ShapeStructure>>,
}

impl CompilationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `shape` and returns `true` the first time it is seen.
    pub fn observe(&self, shape: &ShapeStructure) -> bool {
        let mut seen = self.lock();
        if seen.iter().any(|s| s == shape) {
            return false;
        }
        seen.push(shape.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<ShapeStructure> {
        self.lock().clone()
    }

    // A panic elsewhere can't leave the list half-written, so keep using it.
    fn lock(&self) -> MutexGuard<'_, Vec<ShapeStructure>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
