//! Single-flight operation status guard
//!
//! At most one orchestrated operation may run at a time, process-wide. Both
//! the polling loop and the command dispatcher funnel through the same
//! [`StatusGuard`]; a trigger that loses the race is dropped, never queued.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Operation currently holding the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationStatus {
    Idle = 0,
    UpdatingImages = 1,
    UpdatingStacks = 2,
    StoppingContainers = 3,
}

impl OperationStatus {
    fn from_u8(value: u8) -> OperationStatus {
        match value {
            1 => OperationStatus::UpdatingImages,
            2 => OperationStatus::UpdatingStacks,
            3 => OperationStatus::StoppingContainers,
            _ => OperationStatus::Idle,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationStatus::Idle => "Idle",
            OperationStatus::UpdatingImages => "Updating images",
            OperationStatus::UpdatingStacks => "Updating stacks",
            OperationStatus::StoppingContainers => "Stopping containers",
        };
        f.write_str(label)
    }
}

/// Single-flight guard over the process-wide operation status.
///
/// `try_acquire` and `release` are the only mutators. The state is a single
/// atomic value; there is no queue and no fairness between racing triggers.
pub struct StatusGuard {
    current: AtomicU8,
}

impl StatusGuard {
    pub fn new() -> Self {
        Self {
            current: AtomicU8::new(OperationStatus::Idle as u8),
        }
    }

    /// Current status.
    pub fn current(&self) -> OperationStatus {
        OperationStatus::from_u8(self.current.load(Ordering::SeqCst))
    }

    /// Transition `Idle -> target`. Returns `false`, leaving the state
    /// unchanged, when any operation is already in flight.
    pub fn try_acquire(&self, target: OperationStatus) -> bool {
        if target == OperationStatus::Idle {
            return false;
        }

        self.current
            .compare_exchange(
                OperationStatus::Idle as u8,
                target as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Unconditionally reset the status to `Idle`.
    pub fn release(&self) {
        self.current
            .store(OperationStatus::Idle as u8, Ordering::SeqCst);
    }

    /// Acquire the guard as a scoped permit that releases on drop, so the
    /// status cannot stay wedged on any exit path. Logs and returns `None`
    /// when another operation holds the guard.
    pub fn acquire_scoped(self: &Arc<Self>, target: OperationStatus) -> Option<StatusPermit> {
        if self.try_acquire(target) {
            Some(StatusPermit {
                guard: self.clone(),
            })
        } else {
            warn!("Cannot perform action while {}", self.current());
            None
        }
    }
}

impl Default for StatusGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped acquisition of the [`StatusGuard`].
pub struct StatusPermit {
    guard: Arc<StatusGuard>,
}

impl Drop for StatusPermit {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_from_idle() {
        let guard = StatusGuard::new();
        assert_eq!(guard.current(), OperationStatus::Idle);

        assert!(guard.try_acquire(OperationStatus::UpdatingImages));
        assert_eq!(guard.current(), OperationStatus::UpdatingImages);
    }

    #[test]
    fn test_second_acquire_rejected() {
        let guard = StatusGuard::new();
        assert!(guard.try_acquire(OperationStatus::UpdatingStacks));

        // Any target is rejected while non-idle, state unchanged
        assert!(!guard.try_acquire(OperationStatus::UpdatingImages));
        assert!(!guard.try_acquire(OperationStatus::UpdatingStacks));
        assert_eq!(guard.current(), OperationStatus::UpdatingStacks);
    }

    #[test]
    fn test_release_allows_reacquire() {
        let guard = StatusGuard::new();
        assert!(guard.try_acquire(OperationStatus::UpdatingImages));

        guard.release();
        assert_eq!(guard.current(), OperationStatus::Idle);
        assert!(guard.try_acquire(OperationStatus::StoppingContainers));
    }

    #[test]
    fn test_idle_is_not_acquirable() {
        let guard = StatusGuard::new();
        assert!(!guard.try_acquire(OperationStatus::Idle));
        assert_eq!(guard.current(), OperationStatus::Idle);
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let guard = Arc::new(StatusGuard::new());

        {
            let permit = guard.acquire_scoped(OperationStatus::UpdatingImages);
            assert!(permit.is_some());
            assert!(guard.acquire_scoped(OperationStatus::UpdatingStacks).is_none());
        }

        assert_eq!(guard.current(), OperationStatus::Idle);
        assert!(guard.acquire_scoped(OperationStatus::UpdatingStacks).is_some());
        // Scoped acquisition above released on drop as well
        assert_eq!(guard.current(), OperationStatus::Idle);
    }
}
