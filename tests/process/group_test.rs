//! Supervision trees built from groups, tasks and deferred processes.

use std::sync::Arc;
use std::time::Duration;

use balance_bridge::process::{
    DeferredProcess, ProcSig, ProcessGroup, ProcessLike, TaskProcess, EXIT_ABORTED,
};
use tokio_test::assert_pending;

fn fixed(code: i32) -> Arc<dyn ProcessLike> {
    Arc::new(TaskProcess::spawn(move |_| async move { Ok(code) }))
}

fn until_killed(code: i32) -> Arc<dyn ProcessLike> {
    Arc::new(TaskProcess::spawn(move |cancel| async move {
        cancel.cancelled().await;
        Ok(code)
    }))
}

#[tokio::test]
async fn largest_magnitude_code_wins() {
    let group = ProcessGroup::with_children(vec![fixed(0), fixed(0), fixed(-1)]);
    assert_eq!(group.wait().await, -1);

    let group = ProcessGroup::with_children(vec![fixed(0), fixed(2), fixed(0)]);
    assert_eq!(group.wait().await, 2);
}

#[tokio::test]
async fn exit_overrides_children() {
    let group = ProcessGroup::with_children(vec![until_killed(EXIT_ABORTED), until_killed(9)]);
    group.exit(5);
    assert_eq!(group.wait().await, 5);
}

#[tokio::test]
async fn wait_stays_pending_until_children_settle() {
    let group = ProcessGroup::with_children(vec![until_killed(3)]);
    let mut waiting = tokio_test::task::spawn(group.wait());
    assert_pending!(waiting.poll());
    drop(waiting);

    group.kill(ProcSig::SigTerm);
    let code = tokio::time::timeout(Duration::from_secs(5), group.wait())
        .await
        .unwrap();
    assert_eq!(code, 3);
}

#[tokio::test]
async fn kill_reaches_grandchildren() {
    let inner = Arc::new(ProcessGroup::with_children(vec![until_killed(EXIT_ABORTED)]).named("inner"));
    let children: Vec<Arc<dyn ProcessLike>> = vec![inner.clone(), fixed(0)];
    let outer = ProcessGroup::with_children(children);
    outer.kill(ProcSig::SigKill);
    assert_eq!(outer.wait().await, EXIT_ABORTED);
    assert_eq!(inner.wait().await, EXIT_ABORTED);
}

#[tokio::test]
async fn kill_twice_after_settling_is_harmless() {
    let group = ProcessGroup::with_children(vec![fixed(4)]);
    assert_eq!(group.wait().await, 4);
    group.kill(ProcSig::SigKill);
    group.kill(ProcSig::SigKill);
    assert_eq!(group.wait().await, 4);
}

#[tokio::test]
async fn deferred_child_receives_early_kill() {
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel::<()>();
    let deferred = Arc::new(DeferredProcess::builder().name("late").spawn(async move {
        let _ = ready_rx.await;
        Ok(until_killed(EXIT_ABORTED))
    }));
    let group = ProcessGroup::with_children(vec![deferred.clone() as Arc<dyn ProcessLike>]);

    group.kill(ProcSig::SigTerm);
    assert!(!deferred.is_ready());
    ready_tx.send(()).unwrap();

    let code = tokio::time::timeout(Duration::from_secs(5), group.wait())
        .await
        .unwrap();
    assert_eq!(code, EXIT_ABORTED);
}
