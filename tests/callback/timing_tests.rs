/*!
 * Timing Tests
 *
 * Same-turn calls are deferred, later calls run inline
 */

use callback_guard::{wrap, CallbackState, GuardError, GuardedFn, WrapOptions};
use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};

thread_local! {
    static INSIDE_CALL: Cell<bool> = const { Cell::new(false) };
}

/// Wrap, block the wrapping context without yielding, then call
///
/// Returns true if the callback ran on the caller's stack during `call`.
async fn construction_turn_round() -> bool {
    let (tx, rx) = oneshot::channel();
    let guarded = wrap(
        move |_: ()| {
            let _ = tx.send(INSIDE_CALL.with(Cell::get));
        },
        WrapOptions::new(),
    )
    .unwrap();

    // Other workers are free to run the boundary task meanwhile
    std::thread::sleep(Duration::from_millis(1));

    INSIDE_CALL.with(|flag| flag.set(true));
    guarded.call(());
    INSIDE_CALL.with(|flag| flag.set(false));

    rx.await.unwrap()
}

#[tokio::test]
async fn test_call_during_construction_returns_first() {
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let in_callback = order.clone();

    let guarded = wrap(
        move |_: ()| in_callback.lock().push("callback"),
        WrapOptions::new(),
    )
    .unwrap();
    guarded.call(());
    order.lock().push("caller");

    sleep(Duration::from_millis(5)).await;
    assert_eq!(*order.lock(), vec!["caller", "callback"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_call_during_construction_never_inline_multi_thread() {
    for _ in 0..100 {
        assert!(!construction_turn_round().await);
    }

    for _ in 0..100 {
        let inline = tokio::spawn(construction_turn_round()).await.unwrap();
        assert!(!inline);
    }
}

#[tokio::test]
async fn test_call_after_boundary_runs_inline() {
    let value = Arc::new(AtomicU32::new(0));
    let value_clone = value.clone();

    let guarded = wrap(
        move |n: u32| value_clone.store(n, Ordering::SeqCst),
        WrapOptions::new(),
    )
    .unwrap();

    sleep(Duration::from_millis(5)).await;
    assert_eq!(guarded.state(), CallbackState::Idle);

    let caller = guarded.clone();
    let observed = value.clone();
    tokio::spawn(async move {
        caller.call(42);
        assert_eq!(observed.load(Ordering::SeqCst), 42);
    })
    .await
    .unwrap();

    assert_eq!(guarded.state(), CallbackState::Fired);
}

#[tokio::test]
async fn test_wrapping_context_call_after_boundary_is_deferred() {
    let value = Arc::new(AtomicU32::new(0));
    let value_clone = value.clone();

    let guarded = wrap(
        move |n: u32| value_clone.store(n, Ordering::SeqCst),
        WrapOptions::new(),
    )
    .unwrap();

    sleep(Duration::from_millis(5)).await;
    guarded.call(11);
    assert_eq!(value.load(Ordering::SeqCst), 0);
    assert_eq!(guarded.state(), CallbackState::Firing);

    sleep(Duration::from_millis(5)).await;
    assert_eq!(value.load(Ordering::SeqCst), 11);
    assert_eq!(guarded.state(), CallbackState::Fired);
}

#[tokio::test]
async fn test_dispose_cancels_wrapping_context_delivery() {
    let value = Arc::new(AtomicU32::new(0));
    let value_clone = value.clone();

    let guarded = wrap(
        move |n: u32| value_clone.store(n, Ordering::SeqCst),
        WrapOptions::new(),
    )
    .unwrap();

    sleep(Duration::from_millis(5)).await;
    guarded.call(11);
    assert!(guarded.dispose());

    sleep(Duration::from_millis(5)).await;
    assert_eq!(value.load(Ordering::SeqCst), 0);
    assert_eq!(guarded.state(), CallbackState::Disposed);
}

#[tokio::test(start_paused = true)]
async fn test_min_delay_holds_back_early_call() {
    let (tx, rx) = oneshot::channel();
    let start = Instant::now();

    let guarded = wrap(
        move |n: u32| {
            let _ = tx.send((n, Instant::now()));
        },
        WrapOptions::new().min_delay(Duration::from_millis(50)),
    )
    .unwrap();

    sleep(Duration::from_millis(10)).await;
    guarded.call(7);
    assert_eq!(guarded.state(), CallbackState::Firing);

    let (n, at) = rx.await.unwrap();
    assert_eq!(n, 7);
    assert!(at.duration_since(start) >= Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_min_delay_elapsed_runs_inline() {
    let value = Arc::new(AtomicU32::new(0));
    let value_clone = value.clone();

    let guarded = wrap(
        move |n: u32| value_clone.store(n, Ordering::SeqCst),
        WrapOptions::new().min_delay(Duration::from_millis(50)),
    )
    .unwrap();

    sleep(Duration::from_millis(60)).await;
    let caller = guarded.clone();
    tokio::spawn(async move { caller.call(9) }).await.unwrap();
    assert_eq!(value.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn test_tuple_arguments() {
    let (tx, rx) = oneshot::channel();
    let guarded = wrap(
        move |(name, code): (String, u16)| {
            let _ = tx.send(format!("{}:{}", name, code));
        },
        WrapOptions::new(),
    )
    .unwrap();

    guarded.call(("ok".to_string(), 200));
    assert_eq!(rx.await.unwrap(), "ok:200");
}

#[tokio::test]
async fn test_builder_wraps_with_options() {
    let (tx, rx) = oneshot::channel();
    let guarded = GuardedFn::builder()
        .callback(move |n: u32| {
            let _ = tx.send(n);
        })
        .label("built")
        .min_delay(Duration::from_millis(1))
        .build()
        .unwrap();

    assert_eq!(guarded.label(), "built");
    guarded.call(3);
    assert_eq!(rx.await.unwrap(), 3);
}

#[tokio::test]
async fn test_invalid_options_fail_at_wrap_time() {
    let zero = wrap(|_: ()| {}, WrapOptions::new().timeout(Duration::ZERO));
    assert!(matches!(zero, Err(GuardError::InvalidArgument(_))));

    let unbeatable = wrap(
        |_: ()| {},
        WrapOptions::new()
            .min_delay(Duration::from_millis(20))
            .timeout(Duration::from_millis(10)),
    );
    assert!(matches!(unbeatable, Err(GuardError::InvalidArgument(_))));

    let unlabeled = wrap(|_: ()| {}, WrapOptions::new().label(""));
    assert!(matches!(unlabeled, Err(GuardError::InvalidArgument(_))));
}
