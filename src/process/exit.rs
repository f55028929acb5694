//! Exit code conventions and aggregation.

/// Exit code for work that stopped because it was cancelled.
///
/// Matches the shell's status for a process killed by `SIGKILL`.
pub const EXIT_ABORTED: i32 = 137;

/// Exit code for work that failed without a more specific code.
pub const EXIT_FAILURE: i32 = 1;

/// Return whichever code has the larger magnitude, preferring `b` on ties.
#[must_use]
pub fn abs_max(a: i32, b: i32) -> i32 {
    if a.unsigned_abs() > b.unsigned_abs() {
        a
    } else {
        b
    }
}

/// Combine the exit codes of several processes into one.
///
/// The code with the largest magnitude wins, so a single failure dominates
/// any number of successes. An empty set combines to `0`.
#[must_use]
pub fn combine_exit_codes(codes: impl IntoIterator<Item = i32>) -> i32 {
    codes.into_iter().fold(0, abs_max)
}
