/*!
 * Latch Tests
 *
 * The first call wins, whatever races it
 */

use callback_guard::{wrap, CallbackState, GuardStats, GuardedFn, WrapOptions};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

fn recording() -> (Arc<Mutex<Vec<u32>>>, impl FnOnce(u32) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |n: u32| sink.lock().push(n))
}

#[tokio::test]
async fn test_two_synchronous_calls_deliver_first() {
    let (seen, f) = recording();
    let guarded = wrap(f, WrapOptions::new().min_delay(Duration::ZERO)).unwrap();

    guarded.call(1);
    guarded.call(2);
    assert!(seen.lock().is_empty());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(*seen.lock(), vec![1]);
    assert_eq!(guarded.state(), CallbackState::Fired);
}

#[tokio::test]
async fn test_calls_after_fire_are_ignored() {
    let (seen, f) = recording();
    let stats = Arc::new(GuardStats::new());
    let guarded = wrap(f, WrapOptions::new().stats(stats.clone())).unwrap();

    sleep(Duration::from_millis(5)).await;
    let caller = guarded.clone();
    tokio::spawn(async move {
        caller.call(10);
        caller.call(20);
        caller.call(30);
    })
    .await
    .unwrap();

    assert_eq!(*seen.lock(), vec![10]);
    let snap = stats.snapshot();
    assert_eq!(snap.wrapped, 1);
    assert_eq!(snap.invoked, 1);
    assert_eq!(snap.ignored, 2);
    assert_eq!(snap.deferred, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clones_racing_across_threads() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let guarded = wrap(
        move |n: u32| {
            let _ = tx.send(n);
        },
        WrapOptions::new().label("race"),
    )
    .unwrap();

    let mut tasks = Vec::new();
    for i in 0..16u32 {
        let handle = guarded.clone();
        tasks.push(tokio::spawn(async move {
            sleep(Duration::from_millis((i % 4) as u64)).await;
            handle.call(i);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let first = rx.recv().await.unwrap();
    assert!(first < 16);
    sleep(Duration::from_millis(20)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(guarded.state(), CallbackState::Fired);
}

#[tokio::test]
async fn test_reentrant_call_is_ignored() {
    let slot: Arc<OnceLock<GuardedFn<u32>>> = Arc::new(OnceLock::new());
    let slot_inner = slot.clone();
    let (seen, record) = recording();

    let guarded = wrap(
        move |n: u32| {
            record(n);
            if let Some(me) = slot_inner.get() {
                me.call(n + 1);
            }
        },
        WrapOptions::new(),
    )
    .unwrap();
    slot.set(guarded.clone()).unwrap();

    guarded.call(1);
    sleep(Duration::from_millis(10)).await;

    assert_eq!(*seen.lock(), vec![1]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// N calls, some before and some after the boundary, run `fn` once with the first args
    #[test]
    fn prop_exactly_once_with_first_args(
        calls in prop::collection::vec(any::<u32>(), 1..20),
        split in 0usize..20,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let seen = runtime.block_on(async {
            let (seen, f) = recording();
            let guarded = wrap(f, WrapOptions::new()).unwrap();

            for (i, n) in calls.iter().enumerate() {
                if i == split {
                    sleep(Duration::from_millis(1)).await;
                }
                guarded.call(*n);
            }
            sleep(Duration::from_millis(5)).await;

            let recorded = seen.lock().clone();
            recorded
        });

        prop_assert_eq!(seen, vec![calls[0]]);
    }
}
