//! Worker slot budget shared by all job tasks.
//!
//! Every job task holds one slot for its whole lifetime, so the number of
//! tool invocations running at once can never exceed `max_total`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct SlotBudget {
    max_total: usize,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl SlotBudget {
    pub fn new(max_total: usize) -> Self {
        Self {
            max_total: max_total.max(1),
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Number of slots currently held.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Highest number of slots held at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Reserve one slot; `None` if all slots are held. The slot is released
    /// when the returned guard is dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<SlotGuard> {
        let mut current = self.in_use.load(Ordering::Relaxed);
        loop {
            if current >= self.max_total {
                return None;
            }
            match self.in_use.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.peak.fetch_max(current + 1, Ordering::Relaxed);
                    return Some(SlotGuard {
                        budget: Arc::clone(self),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self) {
        self.in_use.fetch_sub(1, Ordering::Release);
    }
}

/// Releases its slot when dropped.
#[derive(Debug)]
pub struct SlotGuard {
    budget: Arc<SlotBudget>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.budget.release();
    }
}
