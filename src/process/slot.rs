//! Write-once exit code cell that many tasks can wait on.

use tokio::sync::watch;

use super::EXIT_FAILURE;

#[derive(Debug)]
pub(crate) struct ExitSlot {
    tx: watch::Sender<Option<i32>>,
}

impl ExitSlot {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Record the exit code. Only the first call has any effect.
    pub(crate) fn settle(&self, code: i32) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(code);
            true
        })
    }

    pub(crate) fn code(&self) -> Option<i32> {
        *self.tx.borrow()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.code().is_some()
    }

    pub(crate) async fn wait(&self) -> i32 {
        let mut rx = self.tx.subscribe();
        let settled = match rx.wait_for(Option::is_some).await {
            Ok(code) => *code,
            Err(_) => None,
        };
        settled.unwrap_or(EXIT_FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_first_settle_wins() {
        let slot = ExitSlot::new();
        assert!(!slot.is_settled());
        assert!(slot.settle(3));
        assert!(!slot.settle(4));
        assert_eq!(slot.code(), Some(3));
    }

    #[tokio::test]
    async fn test_waiters_see_same_code() {
        let slot = Arc::new(ExitSlot::new());
        let waiter = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.wait().await })
        };
        slot.settle(7);
        assert_eq!(waiter.await.unwrap(), 7);
        assert_eq!(slot.wait().await, 7);
    }
}
