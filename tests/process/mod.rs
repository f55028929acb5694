//! Process supervision tests.

mod group_test;
#[cfg(unix)]
mod os_test;
mod task_test;

/// Verify the public process types are exported from the library.
#[test]
fn test_all_process_types_exported() {
    use balance_bridge::process::{
        combine_exit_codes, new_pseudo_pid, DeferredProcess, OsProcess, ProcSig, ProcessGroup,
        ProcessLike, PseudoPidAllocator, SpawnError, TaskProcess, EXIT_ABORTED, EXIT_FAILURE,
    };

    let _ = ProcessGroup::new();
    let _ = PseudoPidAllocator::new();
    let _: fn() -> String = new_pseudo_pid;
    let _: fn(&mut tokio::process::Command) -> Result<OsProcess, SpawnError> = OsProcess::spawn;
    let _ = std::mem::size_of::<DeferredProcess>();
    let _ = std::mem::size_of::<TaskProcess>();
    let _: Option<&dyn ProcessLike> = None;
    assert_eq!(combine_exit_codes([EXIT_FAILURE, -EXIT_ABORTED]), -EXIT_ABORTED);
    assert_eq!("SIGKILL".parse::<ProcSig>().unwrap(), ProcSig::SigKill);
}
