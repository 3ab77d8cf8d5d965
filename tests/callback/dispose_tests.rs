/*!
 * Dispose Tests
 *
 * Cancellation before settling silences both paths
 */

use callback_guard::core::guard::Guard;
use callback_guard::{wrap, CallbackState, GuardError, GuardStats, WrapOptions};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn counting() -> (Arc<AtomicU32>, Arc<AtomicU32>, WrapOptions) {
    let calls = Arc::new(AtomicU32::new(0));
    let timeouts = Arc::new(AtomicU32::new(0));
    let timeouts_clone = timeouts.clone();
    let options = WrapOptions::new()
        .timeout(Duration::from_millis(50))
        .on_timeout(move |_| {
            timeouts_clone.fetch_add(1, Ordering::SeqCst);
        });
    (calls, timeouts, options)
}

#[tokio::test(start_paused = true)]
async fn test_dispose_before_anything() {
    let (calls, timeouts, options) = counting();
    let calls_clone = calls.clone();
    let guarded = wrap(
        move |_: ()| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        },
        options,
    )
    .unwrap();

    assert!(guarded.dispose());
    guarded.call(());
    sleep(Duration::from_millis(100)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(timeouts.load(Ordering::SeqCst), 0);
    assert_eq!(guarded.state(), CallbackState::Disposed);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_parked_call() {
    let (calls, timeouts, options) = counting();
    let calls_clone = calls.clone();
    let guarded = wrap(
        move |_: ()| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        },
        options,
    )
    .unwrap();

    guarded.call(());
    assert_eq!(guarded.state(), CallbackState::Firing);
    assert!(guarded.dispose());

    sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(timeouts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dispose_after_fire_is_noop() {
    let stats = Arc::new(GuardStats::new());
    let guarded = wrap(|_: ()| {}, WrapOptions::new().stats(stats.clone())).unwrap();

    sleep(Duration::from_millis(5)).await;
    let caller = guarded.clone();
    tokio::spawn(async move { caller.call(()) }).await.unwrap();

    assert!(!guarded.dispose());
    assert_eq!(guarded.state(), CallbackState::Fired);
    assert_eq!(stats.snapshot().disposed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_guard_on_drop() {
    let (calls, timeouts, options) = counting();
    let calls_clone = calls.clone();
    let guarded = wrap(
        move |_: ()| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        },
        options,
    )
    .unwrap();

    {
        let guard = guarded.dispose_on_drop();
        assert!(guard.is_active());
        assert_eq!(guard.resource_type(), "guarded_callback");
    }

    assert_eq!(guarded.state(), CallbackState::Disposed);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(timeouts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dispose_guard_disarm() {
    let guarded = wrap(|_: u32| {}, WrapOptions::new()).unwrap();

    let kept = guarded.dispose_on_drop().disarm();
    assert_eq!(kept.state(), CallbackState::Idle);
    assert_eq!(kept.id(), guarded.id());
}

#[tokio::test]
async fn test_dispose_guard_release_twice() {
    let guarded = wrap(|_: u32| {}, WrapOptions::new()).unwrap();
    let mut guard = guarded.dispose_on_drop();

    assert!(guard.release().is_ok());
    assert!(matches!(guard.release(), Err(GuardError::AlreadyReleased)));
    assert!(!guard.is_active());
}
