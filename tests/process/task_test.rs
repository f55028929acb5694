//! Task adapter behavior observed through the `ProcessLike` trait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use balance_bridge::process::{
    cancel_after, sleep_or_cancelled, BoxError, ProcSig, ProcessLike, TaskProcess, EXIT_ABORTED,
};

#[tokio::test]
async fn operation_starts_before_first_poll() {
    let started = Arc::new(AtomicBool::new(false));
    let flag = started.clone();
    let task = TaskProcess::spawn(move |_| {
        flag.store(true, Ordering::SeqCst);
        async { Ok(0) }
    });
    assert!(started.load(Ordering::SeqCst));
    assert_eq!(task.wait().await, 0);
}

#[tokio::test]
async fn cancelled_sleep_returns_aborted_code() {
    let task = TaskProcess::builder()
        .name("sleeper")
        .spawn(|cancel| async move {
            if sleep_or_cancelled(&cancel, Duration::from_secs(60)).await {
                Ok(0)
            } else {
                Ok(EXIT_ABORTED)
            }
        });
    assert_eq!(task.name(), Some("sleeper"));
    task.kill(ProcSig::SigHup);
    assert_eq!(task.wait().await, EXIT_ABORTED);
}

#[tokio::test]
async fn timeout_is_layered_with_cancel_after() {
    let task = TaskProcess::spawn(|cancel| async move {
        let deadline = cancel_after(&cancel, Duration::from_millis(20));
        deadline.cancelled().await;
        Ok(if cancel.is_cancelled() { EXIT_ABORTED } else { 124 })
    });
    assert_eq!(task.wait().await, 124);
}

#[tokio::test]
async fn custom_error_handler_sets_code() {
    let task = TaskProcess::builder()
        .on_error(|e| if e.to_string().contains("denied") { 13 } else { 1 })
        .spawn(|_| async { Err::<i32, BoxError>("access denied".into()) });
    assert_eq!(task.wait().await, 13);
}
