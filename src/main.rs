/*!
 * Callback Guard - Demo Entry Point
 *
 * Walks through the guarantees of a guarded callback:
 * - same-turn calls are deferred and latched
 * - a silent callee turns into a timeout
 * - disposal cancels both paths
 */

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use callback_guard::{init_tracing, wrap, GuardConfig, GuardStats, WrapOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GuardConfig::from_env().context("invalid callback guard environment")?;
    let stats = Arc::new(GuardStats::new());

    info!("Latch: two synchronous calls, one delivery");
    let (tx, rx) = tokio::sync::oneshot::channel();
    let guarded = wrap(
        move |n: u32| {
            let _ = tx.send(n);
        },
        WrapOptions::from_config(&config)
            .label("latch-demo")
            .stats(stats.clone()),
    )?;
    guarded.call(1);
    guarded.call(2);
    info!(state = %guarded.state(), "calls returned before the callback ran");
    let delivered = rx.await.context("latch demo callback dropped")?;
    info!(delivered, "callback ran once with the first call's arguments");

    info!("Timeout: nobody ever calls back");
    let (tx, rx) = tokio::sync::oneshot::channel();
    let _silent = wrap(
        |_: ()| {},
        WrapOptions::new()
            .label("timeout-demo")
            .timeout(Duration::from_millis(100))
            .on_timeout(move |err| {
                let _ = tx.send(err);
            })
            .stats(stats.clone()),
    )?;
    let err = rx.await.context("timeout demo handler dropped")?;
    info!(error = %err, "timeout delivered");

    info!("Dispose: cancel before anything happens");
    let disposed = wrap(
        |_: ()| {},
        WrapOptions::new()
            .label("dispose-demo")
            .timeout(Duration::from_millis(50))
            .stats(stats.clone()),
    )?;
    disposed.dispose();
    tokio::time::sleep(Duration::from_millis(80)).await;
    info!(state = %disposed.state(), "disposed callback stayed silent");

    let snapshot = serde_json::to_string(&stats.snapshot())?;
    info!(stats = %snapshot, "demo complete");

    Ok(())
}
