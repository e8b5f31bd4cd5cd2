//! Human-in-the-loop mailbox.
//!
//! A single-slot mailbox per run. `deliver` may be called before, during,
//! or after a wait: a pending action delivered before the wait begins is
//! serviced immediately rather than lost, and each delivered action
//! unblocks at most one wait. A timed-out wait yields `None`, which the
//! orchestrator treats as "no human input".

use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;

use crate::domain::models::HumanAction;

/// Single-slot mailbox synchronizing a run with human submissions.
#[derive(Debug, Default)]
pub struct HumanMailbox {
    slot: Mutex<Option<HumanAction>>,
    notify: Notify,
}

impl HumanMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit an action. A previously undelivered action is replaced;
    /// the latest submission wins.
    pub async fn deliver(&self, action: HumanAction) {
        {
            let mut slot = self.slot.lock().await;
            *slot = Some(action);
        }
        self.notify.notify_one();
    }

    /// Take the pending action without waiting, if one is present.
    pub async fn try_take(&self) -> Option<HumanAction> {
        self.slot.lock().await.take()
    }

    /// Wait up to `wait_timeout` for an action.
    ///
    /// The notification future is created before the slot is checked, so a
    /// delivery racing with the check cannot be missed.
    pub async fn wait(&self, wait_timeout: Duration) -> Option<HumanAction> {
        let deadline = tokio::time::Instant::now() + wait_timeout;
        loop {
            let notified = self.notify.notified();
            if let Some(action) = self.slot.lock().await.take() {
                return Some(action);
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            if timeout(remaining, notified).await.is_err() {
                // One last check: the action may have landed right at the
                // deadline.
                return self.slot.lock().await.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_prefilled_action_serviced_immediately() {
        let mailbox = HumanMailbox::new();
        mailbox.deliver(HumanAction::approve()).await;
        let action = mailbox.wait(Duration::from_millis(10)).await;
        assert!(action.is_some());
    }

    #[tokio::test]
    async fn test_wait_times_out_with_none() {
        let mailbox = HumanMailbox::new();
        let action = mailbox.wait(Duration::from_millis(20)).await;
        assert!(action.is_none());
    }

    #[tokio::test]
    async fn test_delivery_unblocks_pending_wait() {
        let mailbox = Arc::new(HumanMailbox::new());
        let waiter = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.wait(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        mailbox.deliver(HumanAction::approve()).await;
        let action = waiter.await.unwrap();
        assert!(action.is_some());
    }

    #[tokio::test]
    async fn test_action_unblocks_at_most_one_wait() {
        let mailbox = HumanMailbox::new();
        mailbox.deliver(HumanAction::approve()).await;
        assert!(mailbox.wait(Duration::from_millis(10)).await.is_some());
        assert!(mailbox.wait(Duration::from_millis(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_latest_submission_wins() {
        let mailbox = HumanMailbox::new();
        mailbox.deliver(HumanAction::approve()).await;
        mailbox.deliver(HumanAction::reject("changed my mind")).await;
        let action = mailbox.wait(Duration::from_millis(10)).await.unwrap();
        assert_eq!(
            action.action,
            crate::domain::models::HumanActionKind::Reject
        );
    }
}
