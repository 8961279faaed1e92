//! Degraded-mode adapter for runtimes without local scheduling.

use fluxpay_core::types::{Timestamp, TriggerId};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::adapter::{
    AdapterError, DeviceNotificationAdapter, FiredNotification, PermissionStatus,
    ScheduledTrigger,
};

/// Adapter used when the runtime has no local notification capability
/// (sandboxed preview environments).
///
/// Every operation succeeds and does nothing: permission requests report
/// [`Denied`](PermissionStatus::Denied) without prompting, the scheduled
/// set is always empty, `schedule_at` returns the nil id, and the fired
/// channel never carries anything. Degraded capability is never an error.
pub struct NoopAdapter {
    /// Held so subscribers see a quiet channel rather than a closed one.
    fired_tx: broadcast::Sender<FiredNotification>,
}

impl NoopAdapter {
    pub fn new() -> Self {
        let (fired_tx, _) = broadcast::channel(1);
        Self { fired_tx }
    }
}

impl Default for NoopAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceNotificationAdapter for NoopAdapter {
    fn is_supported(&self) -> bool {
        false
    }

    async fn configure(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn request_permissions(&self) -> Result<PermissionStatus, AdapterError> {
        Ok(PermissionStatus::Denied)
    }

    async fn schedule_at(
        &self,
        _at: Timestamp,
        _title: &str,
        _body: &str,
        _payload: serde_json::Value,
    ) -> Result<TriggerId, AdapterError> {
        Ok(Uuid::nil())
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledTrigger>, AdapterError> {
        Ok(Vec::new())
    }

    async fn cancel(&self, _id: TriggerId) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    fn subscribe_fired(&self) -> broadcast::Receiver<FiredNotification> {
        self.fired_tx.subscribe()
    }
}
