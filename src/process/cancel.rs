//! Cancellation helpers layered on top of [`CancellationToken`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// A token cancelled by `parent` or after `timeout`, whichever comes first.
///
/// Cancelling the returned token does not affect the parent.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
#[must_use]
pub fn cancel_after(parent: &CancellationToken, timeout: Duration) -> CancellationToken {
    let token = parent.child_token();
    let timer = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = timer.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                tracing::debug!(?timeout, "Timeout elapsed, cancelling");
                timer.cancel();
            }
        }
    });
    token
}

/// Sleep for `duration` unless `token` is cancelled first.
///
/// Returns `true` if the full duration elapsed.
pub async fn sleep_or_cancelled(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        () = token.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
