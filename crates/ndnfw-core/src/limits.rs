#[cfg(feature = "loom")]
use loom::sync::atomic::{AtomicU64, Ordering};
#[cfg(not(feature = "loom"))]
use std::sync::atomic::{AtomicU64, Ordering};

const COUNT_MASK: u64 = u32::MAX as u64;

#[inline]
fn pack(outstanding: u32, max_outstanding: u32) -> u64 {
    (u64::from(max_outstanding) << 32) | u64::from(outstanding)
}

#[inline]
fn unpack(word: u64) -> (u32, u32) {
    ((word & COUNT_MASK) as u32, (word >> 32) as u32)
}

/// Per-face outstanding-interest budget.
///
/// Shared by every request flow using the face. The count and the limit live
/// in one atomic word (count in the low half, limit in the high half), so
/// admission, release and limit changes are each a single compare-and-swap
/// and `outstanding <= max_outstanding` holds at every instant.
#[derive(Debug)]
pub struct FaceLimits {
    state: AtomicU64,
}

impl FaceLimits {
    /// Limits above `u32::MAX` are clamped.
    pub fn new(max_outstanding: usize) -> Self {
        Self {
            state: AtomicU64::new(pack(0, clamp(max_outstanding))),
        }
    }

    /// Takes one budget slot if the face is below its limit.
    /// Returns `true` if a slot was taken.
    pub fn try_increment_outstanding(&self) -> bool {
        let mut word = self.state.load(Ordering::Acquire);
        loop {
            let (outstanding, max_outstanding) = unpack(word);
            if outstanding >= max_outstanding {
                return false;
            }
            match self.state.compare_exchange_weak(
                word,
                pack(outstanding + 1, max_outstanding),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => word = actual,
            }
        }
    }

    /// Returns one budget slot.
    ///
    /// # Panics
    /// Panics if nothing is outstanding: a release without a matching
    /// admission means the caller's bookkeeping is broken.
    pub fn decrement_outstanding(&self) {
        let mut word = self.state.load(Ordering::Acquire);
        loop {
            let (outstanding, max_outstanding) = unpack(word);
            if outstanding == 0 {
                panic!("FaceLimits: decrement_outstanding called with zero outstanding");
            }
            match self.state.compare_exchange_weak(
                word,
                pack(outstanding - 1, max_outstanding),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => word = actual,
            }
        }
    }

    pub fn is_below_limit(&self) -> bool {
        let (outstanding, max_outstanding) = unpack(self.state.load(Ordering::Acquire));
        outstanding < max_outstanding
    }

    pub fn outstanding(&self) -> usize {
        unpack(self.state.load(Ordering::Acquire)).0 as usize
    }

    pub fn max_outstanding(&self) -> usize {
        unpack(self.state.load(Ordering::Acquire)).1 as usize
    }

    /// Replaces the limit unless it is below the number of interests already
    /// in flight. Returns `false`, leaving the old limit in place, when the
    /// face holds more than `max_outstanding` slots at the moment of the swap.
    pub fn set_max_outstanding(&self, max_outstanding: usize) -> bool {
        let requested = clamp(max_outstanding);
        let mut word = self.state.load(Ordering::Acquire);
        loop {
            let (outstanding, _) = unpack(word);
            if outstanding > requested {
                return false;
            }
            match self.state.compare_exchange_weak(
                word,
                pack(outstanding, requested),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => word = actual,
            }
        }
    }
}

fn clamp(max_outstanding: usize) -> u32 {
    u32::try_from(max_outstanding).unwrap_or(u32::MAX)
}
