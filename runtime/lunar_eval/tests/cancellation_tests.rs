//! Cooperative cancellation of running scripts.

use std::time::Duration;

use lunar_eval::{Cancellation, Engine, Value, Values};
use pretty_assertions::assert_eq;

const LIMIT: Duration = Duration::from_secs(5);

/// Engine with `sleep(ms)`, which wakes early when its execution is cancelled.
fn engine() -> Engine {
    let engine = Engine::new();
    engine.register_async_function("sleep", |_, args, cx| async move {
        let ms = args.first().map_or(0.0, Value::as_number) as u64;
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(ms)) => {}
            () = cx.cancellation().cancelled() => {}
        }
        cx.check_cancelled()?;
        Ok(Values::new())
    });
    engine
}

#[tokio::test]
async fn test_cancel_interrupts_async_native() {
    let engine = engine();
    let cancel = Cancellation::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });
    let out = tokio::time::timeout(
        LIMIT,
        engine.execute_with("sleep(60000) return 'finished'", Values::new(), cancel),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_side_effects_before_cancel_are_kept() {
    let engine = engine();
    let cancel = Cancellation::new();
    cancel.cancel_after(Duration::from_millis(30));
    let script = "ticks = 0 while true do ticks = ticks + 1 sleep(1) end";
    tokio::time::timeout(LIMIT, engine.execute_with(script, Values::new(), cancel))
        .await
        .unwrap()
        .unwrap();
    assert!(engine.get_global("ticks").as_number() >= 1.0);
}

#[tokio::test]
async fn test_engine_is_reusable_after_cancel() {
    let engine = engine();
    let cancel = Cancellation::new();
    cancel.cancel_after(Duration::from_millis(5));
    tokio::time::timeout(
        LIMIT,
        engine.execute_with("while true do sleep(1) end", Values::new(), cancel),
    )
    .await
    .unwrap()
    .unwrap();

    let out = engine.execute("return 1 + 1").await.unwrap();
    assert_eq!(out.to_vec(), vec![Value::from(2.0)]);
}

#[tokio::test]
async fn test_cancellation_is_per_execution() {
    let engine = engine();
    let stopped = Cancellation::new();
    stopped.cancel_after(Duration::from_millis(5));

    let looping = engine.execute_with("while true do sleep(1) end", Values::new(), stopped);
    let finishing = engine.execute_with(
        "sleep(20) return 'done'",
        Values::new(),
        Cancellation::new(),
    );
    let (looped, finished) = tokio::time::timeout(LIMIT, async { tokio::join!(looping, finishing) })
        .await
        .unwrap();
    assert!(looped.unwrap().is_empty());
    assert_eq!(finished.unwrap().to_vec(), vec![Value::from("done")]);
}

#[tokio::test]
async fn test_cancel_inside_nested_calls() {
    let engine = engine();
    let cancel = Cancellation::new();
    cancel.cancel_after(Duration::from_millis(10));
    let script = "
        local function deep(n)
            if n == 0 then
                while true do sleep(1) end
            end
            return deep(n - 1)
        end
        return deep(20)";
    let out = tokio::time::timeout(LIMIT, engine.execute_with(script, Values::new(), cancel))
        .await
        .unwrap()
        .unwrap();
    assert!(out.is_empty());
}
