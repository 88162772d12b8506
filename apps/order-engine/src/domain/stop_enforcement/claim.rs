//! Per-order evaluation claim.

use std::sync::atomic::{AtomicBool, Ordering};

/// Guards a single in-flight evaluation of an order.
///
/// Acquiring is a compare-and-swap; the returned guard releases the claim
/// when dropped, on every exit path.
#[derive(Debug, Default)]
pub struct EvaluationClaim {
    in_progress: AtomicBool,
}

impl EvaluationClaim {
    /// Create an unclaimed guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_progress: AtomicBool::new(false),
        }
    }

    /// Try to claim. Returns `None` if an evaluation is already running.
    #[must_use]
    pub fn try_acquire(&self) -> Option<ClaimGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ClaimGuard { claim: self })
    }

    /// Returns true while an evaluation holds the claim.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

/// Releases its [`EvaluationClaim`] on drop.
#[derive(Debug)]
pub struct ClaimGuard<'a> {
    claim: &'a EvaluationClaim,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.claim.in_progress.store(false, Ordering::Release);
    }
}
