//! The reminder scheduler: reconciles the device trigger store against the
//! current payment + preferences state.
//!
//! The core discipline is cancel-then-recreate: every (re)schedule of a
//! payment first cancels all live triggers tagged with that payment's id,
//! then schedules the freshly computed plan. Recomputation is the single
//! mechanism that removes stale triggers from a previous due date or
//! preference state, which makes every operation here safe to repeat.
//!
//! Per payment, cancel and create run sequentially inside a lock keyed by
//! the payment id, so two in-flight edits of the same payment cannot
//! interleave. Across payments there is no ordering requirement and
//! reschedule-all fans out concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{FixedOffset, Local, Offset, Utc};
use fluxpay_core::types::{PaymentId, UserId};
use fluxpay_core::{compute_triggers, NotificationPreferences, Payment, TriggerPayload};
use fluxpay_device::{AdapterError, DeviceNotificationAdapter, PermissionStatus};
use tokio::sync::Mutex;

use crate::store::{PaymentRepository, PreferenceStore, StoreError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for scheduling operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A backend read/write failed; no safe scheduling decision is possible.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The device adapter failed an explicitly requested operation.
    /// Failures of individual triggers inside a batch are logged and
    /// swallowed instead.
    #[error("Device adapter failed: {0}")]
    Adapter(#[from] AdapterError),
}

/// Convenience alias for scheduling results.
pub type EngineResult<T> = Result<T, EngineError>;

// ---------------------------------------------------------------------------
// ReminderScheduler
// ---------------------------------------------------------------------------

/// Computes and applies the device trigger set for payments.
///
/// Shared via `Arc` between the UI-facing call sites (payment form,
/// settings screen, deletion flow).
pub struct ReminderScheduler {
    adapter: Arc<dyn DeviceNotificationAdapter>,
    payments: Arc<dyn PaymentRepository>,
    preferences: Arc<dyn PreferenceStore>,
    /// Wall-clock offset used for all local-time planning.
    offset: FixedOffset,
    /// One lock per payment id, serializing cancel-then-create cycles.
    locks: Mutex<HashMap<PaymentId, Arc<Mutex<()>>>>,
}

impl ReminderScheduler {
    /// Create a scheduler using the process's current local UTC offset.
    pub fn new(
        adapter: Arc<dyn DeviceNotificationAdapter>,
        payments: Arc<dyn PaymentRepository>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let offset = Local::now().offset().fix();
        Self::with_offset(adapter, payments, preferences, offset)
    }

    /// Create a scheduler with an explicit UTC offset (tests pin this).
    pub fn with_offset(
        adapter: Arc<dyn DeviceNotificationAdapter>,
        payments: Arc<dyn PaymentRepository>,
        preferences: Arc<dyn PreferenceStore>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            adapter,
            payments,
            preferences,
            offset,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The offset all local-time planning uses.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Run the adapter's one-time setup. A no-op in degraded runtimes.
    pub async fn ensure_configured(&self) -> EngineResult<()> {
        if !self.adapter.is_supported() {
            return Ok(());
        }
        Ok(self.adapter.configure().await?)
    }

    /// Request notification permission, surfacing the decision to the UI.
    /// Degraded runtimes report `Denied` without prompting.
    pub async fn request_permissions(&self) -> EngineResult<PermissionStatus> {
        if !self.adapter.is_supported() {
            return Ok(PermissionStatus::Denied);
        }
        Ok(self.adapter.request_permissions().await?)
    }

    /// Replace the device trigger set for one payment with the set dictated
    /// by `prefs`.
    ///
    /// The cancel step runs unconditionally — it is what removes triggers
    /// from a previous due date, and the only step when the master switch
    /// is off. Individual trigger scheduling failures are logged and do not
    /// fail the operation; returns how many triggers were scheduled.
    pub async fn schedule_payment_notifications(
        &self,
        payment: &Payment,
        prefs: &NotificationPreferences,
    ) -> EngineResult<usize> {
        if !self.adapter.is_supported() {
            return Ok(0);
        }

        let lock = self.payment_lock(payment.id).await;
        let _guard = lock.lock().await;

        self.cancel_triggers_for(payment.id).await?;

        if !prefs.notifications_enabled {
            return Ok(0);
        }

        let plan = compute_triggers(payment, prefs, Utc::now(), self.offset);
        let mut scheduled = 0usize;
        for trigger in &plan {
            match self
                .adapter
                .schedule_at(
                    trigger.at,
                    &trigger.title,
                    &trigger.body,
                    trigger.payload.to_value(),
                )
                .await
            {
                Ok(_) => scheduled += 1,
                Err(e) => {
                    tracing::warn!(
                        payment_id = %payment.id,
                        kind = trigger.payload.kind.as_str(),
                        at = %trigger.at,
                        error = %e,
                        "Failed to schedule reminder trigger"
                    );
                }
            }
        }

        tracing::debug!(
            payment_id = %payment.id,
            planned = plan.len(),
            scheduled,
            "Reminder triggers rescheduled"
        );
        Ok(scheduled)
    }

    /// Cancel every live trigger tagged with `payment_id` (payment deleted).
    ///
    /// Zero matches is a no-op. Returns how many triggers were cancelled.
    pub async fn cancel_payment_notifications(
        &self,
        payment_id: PaymentId,
    ) -> EngineResult<usize> {
        if !self.adapter.is_supported() {
            return Ok(0);
        }

        let lock = self.payment_lock(payment_id).await;
        let _guard = lock.lock().await;

        self.cancel_triggers_for(payment_id).await
    }

    /// Recompute the trigger sets of all of a user's payments.
    ///
    /// Invoked after every preference change and safe to call repeatedly.
    /// When the master switch is off this cancels *every* trigger on the
    /// device; it holds only this app's triggers. Otherwise the per-payment
    /// reschedules fan out concurrently, and one payment's failure never
    /// blocks reminders for the rest.
    pub async fn reschedule_all_user_payments(
        &self,
        user_id: UserId,
        prefs: &NotificationPreferences,
    ) -> EngineResult<()> {
        if !self.adapter.is_supported() {
            return Ok(());
        }

        if !prefs.notifications_enabled {
            self.adapter.cancel_all().await?;
            tracing::info!(user_id = %user_id, "Notifications disabled, cancelled all triggers");
            return Ok(());
        }

        let payments = self.payments.list_by_user(user_id).await?;
        let count = payments.len();

        futures::future::join_all(payments.iter().map(|payment| async move {
            if let Err(e) = self.schedule_payment_notifications(payment, prefs).await {
                tracing::warn!(
                    payment_id = %payment.id,
                    error = %e,
                    "Failed to reschedule payment, continuing with the rest"
                );
            }
        }))
        .await;

        tracing::debug!(user_id = %user_id, payments = count, "Rescheduled all payments");
        Ok(())
    }

    /// Persist new preferences and bring the device in line with them.
    pub async fn update_preferences(
        &self,
        user_id: UserId,
        prefs: NotificationPreferences,
    ) -> EngineResult<()> {
        self.preferences.set(user_id, prefs.clone()).await?;
        self.reschedule_all_user_payments(user_id, &prefs).await
    }

    /// The stored preferences for `user_id`, created as defaults on first
    /// access.
    pub async fn preferences(&self, user_id: UserId) -> EngineResult<NotificationPreferences> {
        Ok(self.preferences.get(user_id).await?)
    }

    // -- internals ---------------------------------------------------------

    /// The lock serializing cancel-then-create cycles for one payment id.
    async fn payment_lock(&self, payment_id: PaymentId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(payment_id).or_default().clone()
    }

    /// Cancel every live trigger whose payload names `payment_id`.
    ///
    /// Triggers with foreign or unparseable payloads are left alone.
    async fn cancel_triggers_for(&self, payment_id: PaymentId) -> EngineResult<usize> {
        let live = self.adapter.list_scheduled().await?;
        let mut cancelled = 0usize;
        for trigger in live {
            let Some(payload) = TriggerPayload::from_value(&trigger.payload) else {
                continue;
            };
            if payload.payment_id != payment_id {
                continue;
            }
            self.adapter.cancel(trigger.id).await?;
            cancelled += 1;
        }
        if cancelled > 0 {
            tracing::debug!(payment_id = %payment_id, cancelled, "Cancelled stale triggers");
        }
        Ok(cancelled)
    }
}
