//! The adapter trait and the types that cross the device boundary.

use async_trait::async_trait;
use fluxpay_core::types::{Timestamp, TriggerId};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Errors / statuses
// ---------------------------------------------------------------------------

/// Error type for device adapter failures.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The requested trigger instant is not in the future. The engine never
    /// plans past triggers; the adapter still enforces the invariant rather
    /// than firing immediately or silently accepting.
    #[error("Trigger instant {at} is not in the future")]
    PastTrigger { at: Timestamp },

    /// The underlying notification store failed.
    #[error("Device notification store failed: {0}")]
    Store(String),
}

/// Outcome of a notification permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

// ---------------------------------------------------------------------------
// Boundary types
// ---------------------------------------------------------------------------

/// A live trigger held by the device.
///
/// The payload is untyped JSON at this boundary — the OS stores it as an
/// opaque blob. The engine writes `TriggerPayload` values into it and the
/// history listener parses them back out.
#[derive(Debug, Clone)]
pub struct ScheduledTrigger {
    pub id: TriggerId,
    pub at: Timestamp,
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
}

/// Event emitted when the device actually fires a trigger.
#[derive(Debug, Clone)]
pub struct FiredNotification {
    pub trigger: ScheduledTrigger,
    pub fired_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DeviceNotificationAdapter
// ---------------------------------------------------------------------------

/// The OS-level local notification facility, behind a trait so the engine
/// can run against the real store or the degraded no-op in preview
/// runtimes.
#[async_trait]
pub trait DeviceNotificationAdapter: Send + Sync {
    /// Whether local scheduling works in the current runtime. Consulted at
    /// the top of every engine operation; must never fail.
    fn is_supported(&self) -> bool;

    /// One-time setup (notification channel/category registration).
    /// Idempotent; repeated calls are cheap.
    async fn configure(&self) -> Result<(), AdapterError>;

    /// Prompt for notification permission (or report the stored decision).
    async fn request_permissions(&self) -> Result<PermissionStatus, AdapterError>;

    /// Store a trigger to fire at `at`. Rejects instants at or before now
    /// with [`AdapterError::PastTrigger`].
    async fn schedule_at(
        &self,
        at: Timestamp,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) -> Result<TriggerId, AdapterError>;

    /// All triggers currently held by the device.
    async fn list_scheduled(&self) -> Result<Vec<ScheduledTrigger>, AdapterError>;

    /// Cancel one trigger. Unknown ids are a no-op, not an error.
    async fn cancel(&self, id: TriggerId) -> Result<(), AdapterError>;

    /// Cancel every trigger held by the device.
    async fn cancel_all(&self) -> Result<(), AdapterError>;

    /// Subscribe to notifications as they fire. In degraded runtimes the
    /// channel simply never carries anything.
    fn subscribe_fired(&self) -> broadcast::Receiver<FiredNotification>;
}
