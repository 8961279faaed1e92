//! Fired-notification history recording.
//!
//! When the device fires a trigger, [`HistoryListener`] receives the event
//! on the adapter's broadcast channel, validates the attached payload, and
//! writes a durable [`NotificationHistoryEntry`] for the history screen.
//! Entries are written only when a trigger actually fires, never at
//! schedule time.
//!
//! Events whose payload is missing a payment id or carries an unrecognized
//! kind are dropped; so are events for payments that no longer exist.

use std::sync::Arc;

use fluxpay_core::types::{PaymentId, Timestamp, UserId};
use fluxpay_core::{ReminderKind, TriggerPayload};
use fluxpay_device::FiredNotification;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::store::{PaymentRepository, StoreError};

// ---------------------------------------------------------------------------
// NotificationHistoryEntry
// ---------------------------------------------------------------------------

/// A durable record of one fired notification.
#[derive(Debug, Clone)]
pub struct NotificationHistoryEntry {
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub title: String,
    pub body: String,
    pub kind: ReminderKind,
    pub payment_name: String,
    pub due_date: Timestamp,
    pub fired_at: Timestamp,
}

/// Sink for history entries, persisted by the backend.
#[async_trait::async_trait]
pub trait NotificationHistoryRecorder: Send + Sync {
    async fn record(&self, entry: NotificationHistoryEntry) -> Result<(), StoreError>;
}

/// In-memory recorder used as the app-side buffer and as a test fixture.
#[derive(Default)]
pub struct InMemoryHistoryRecorder {
    entries: Mutex<Vec<NotificationHistoryEntry>>,
}

impl InMemoryHistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub async fn entries(&self) -> Vec<NotificationHistoryEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationHistoryRecorder for InMemoryHistoryRecorder {
    async fn record(&self, entry: NotificationHistoryEntry) -> Result<(), StoreError> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HistoryListener
// ---------------------------------------------------------------------------

/// Background task turning fired triggers into history entries for the
/// signed-in user.
pub struct HistoryListener {
    user_id: UserId,
    payments: Arc<dyn PaymentRepository>,
    recorder: Arc<dyn NotificationHistoryRecorder>,
}

impl HistoryListener {
    pub fn new(
        user_id: UserId,
        payments: Arc<dyn PaymentRepository>,
        recorder: Arc<dyn NotificationHistoryRecorder>,
    ) -> Self {
        Self {
            user_id,
            payments,
            recorder,
        }
    }

    /// Consume fired notifications until cancelled.
    ///
    /// A lagged receiver logs how many events it missed and keeps going;
    /// recorder failures are logged and never stop the loop.
    pub async fn run(
        self,
        mut fired: broadcast::Receiver<FiredNotification>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("History listener cancelled");
                    break;
                }
                event = fired.recv() => match event {
                    Ok(notification) => self.handle(notification).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "History listener lagged, some entries lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Fired-notification channel closed");
                        break;
                    }
                },
            }
        }
    }

    /// Validate, enrich, and record one fired notification.
    async fn handle(&self, notification: FiredNotification) {
        let Some(payload) = TriggerPayload::from_value(&notification.trigger.payload) else {
            tracing::debug!(
                trigger_id = %notification.trigger.id,
                "Dropping fired notification with foreign or malformed payload"
            );
            return;
        };

        let payment = match self.payments.get(self.user_id, payload.payment_id).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                tracing::debug!(
                    payment_id = %payload.payment_id,
                    "Dropping fired notification for a deleted payment"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(
                    payment_id = %payload.payment_id,
                    error = %e,
                    "Failed to resolve payment for history entry"
                );
                return;
            }
        };

        let entry = NotificationHistoryEntry {
            user_id: self.user_id,
            payment_id: payment.id,
            title: notification.trigger.title,
            body: notification.trigger.body,
            kind: payload.kind,
            payment_name: payment.name,
            due_date: payment.due_date,
            fired_at: notification.fired_at,
        };

        if let Err(e) = self.recorder.record(entry).await {
            tracing::warn!(
                payment_id = %payload.payment_id,
                error = %e,
                "Failed to record notification history entry"
            );
        }
    }
}
