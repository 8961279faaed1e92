//! Shared fixtures for the engine integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, FixedOffset, NaiveDate, Utc};
use fluxpay_core::types::{PaymentId, UserId};
use fluxpay_core::{Payment, TriggerPayload};
use fluxpay_device::{DeviceNotificationAdapter, LocalAdapter, ScheduledTrigger};
use fluxpay_engine::{InMemoryPaymentRepository, InMemoryPreferenceStore, ReminderScheduler};
use uuid::Uuid;

/// All tests plan in UTC so wall-clock expectations are deterministic.
pub fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// A due day far enough out that every planned trigger is in the future.
pub fn future_due_day(days_ahead: u64) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(days_ahead))
        .expect("due day within chrono range")
}

pub fn payment_due_in(days_ahead: u64, name: &str) -> Payment {
    Payment::new(name, 49.99, "USD", future_due_day(days_ahead), utc_offset())
}

/// Everything a scheduler test needs, wired against a real local adapter.
pub struct Harness {
    pub adapter: Arc<LocalAdapter>,
    pub payments: Arc<InMemoryPaymentRepository>,
    pub preferences: Arc<InMemoryPreferenceStore>,
    pub scheduler: ReminderScheduler,
    pub user: UserId,
}

impl Harness {
    pub fn new() -> Self {
        let adapter = Arc::new(LocalAdapter::with_tick(Duration::from_millis(20)));
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let preferences = Arc::new(InMemoryPreferenceStore::new());
        let scheduler = ReminderScheduler::with_offset(
            adapter.clone(),
            payments.clone(),
            preferences.clone(),
            utc_offset(),
        );
        Self {
            adapter,
            payments,
            preferences,
            scheduler,
            user: Uuid::new_v4(),
        }
    }

    /// Live device triggers tagged with `payment_id`.
    pub async fn triggers_for(&self, payment_id: PaymentId) -> Vec<ScheduledTrigger> {
        self.adapter
            .list_scheduled()
            .await
            .unwrap()
            .into_iter()
            .filter(|t| {
                TriggerPayload::from_value(&t.payload)
                    .is_some_and(|p| p.payment_id == payment_id)
            })
            .collect()
    }

    /// Total live device triggers, regardless of payment.
    pub async fn live_count(&self) -> usize {
        self.adapter.list_scheduled().await.unwrap().len()
    }
}
