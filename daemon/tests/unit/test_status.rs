//! Status guard unit tests

use std::sync::Arc;

use stackward::status::{OperationStatus, StatusGuard};

#[test]
fn test_single_flight() {
    let guard = StatusGuard::new();

    assert!(guard.try_acquire(OperationStatus::UpdatingImages));
    assert!(!guard.try_acquire(OperationStatus::UpdatingStacks));
    assert_eq!(guard.current(), OperationStatus::UpdatingImages);

    guard.release();
    assert!(guard.try_acquire(OperationStatus::UpdatingStacks));
}

#[test]
fn test_release_is_unconditional() {
    let guard = StatusGuard::new();

    // Releasing an idle guard is a no-op
    guard.release();
    assert_eq!(guard.current(), OperationStatus::Idle);

    assert!(guard.try_acquire(OperationStatus::StoppingContainers));
    guard.release();
    assert_eq!(guard.current(), OperationStatus::Idle);
}

#[test]
fn test_concurrent_acquisition_has_one_winner() {
    let guard = Arc::new(StatusGuard::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let guard = guard.clone();
            std::thread::spawn(move || guard.try_acquire(OperationStatus::UpdatingImages))
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(guard.current(), OperationStatus::UpdatingImages);
}
