//! OS child processes inside groups.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use balance_bridge::process::{OsProcess, ProcSig, ProcessGroup, ProcessLike};
use tokio::process::Command;

#[tokio::test]
async fn os_exit_code_aggregates_with_tasks() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "exit 6"]);
    let child: Arc<dyn ProcessLike> = Arc::new(OsProcess::spawn(&mut cmd).unwrap());
    let group = ProcessGroup::with_children(vec![child]);
    assert_eq!(group.wait().await, 6);
}

#[tokio::test]
async fn group_kill_signals_child_and_runs_cleanup_first() {
    let cleaned = Arc::new(AtomicBool::new(false));
    let flag = cleaned.clone();
    let mut cmd = Command::new("sleep");
    cmd.arg("30");
    let child = Arc::new(
        OsProcess::builder()
            .name("sleeper")
            .cleanup(async move { flag.store(true, Ordering::SeqCst) })
            .spawn(&mut cmd)
            .unwrap(),
    );
    let group = ProcessGroup::with_children(vec![child.clone() as Arc<dyn ProcessLike>]);
    group.kill(ProcSig::SigTerm);

    let code = tokio::time::timeout(Duration::from_secs(5), group.wait())
        .await
        .unwrap();
    assert_eq!(code, 128 + 15);
    assert!(cleaned.load(Ordering::SeqCst));
    assert_eq!(child.name(), Some("sleeper"));
}
