//! Integration tests for the reminder scheduler against a real local
//! adapter.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Days;
use common::Harness;
use fluxpay_core::types::{PaymentId, TriggerId, UserId};
use fluxpay_core::{
    NotificationPreferences, Payment, ReminderKind, SameDayInterval, TriggerPayload,
};
use fluxpay_device::{
    AdapterError, DeviceNotificationAdapter, NoopAdapter, PermissionStatus, ScheduledTrigger,
};
use fluxpay_engine::{
    EngineError, InMemoryPaymentRepository, InMemoryPreferenceStore, PaymentRepository,
    ReminderScheduler, StoreError,
};

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_preferences_schedule_lead_times_and_series() {
    let h = Harness::new();
    let payment = common::payment_due_in(10, "Rent");
    let prefs = NotificationPreferences::default();

    let scheduled = h
        .scheduler
        .schedule_payment_notifications(&payment, &prefs)
        .await
        .unwrap();

    // 3 lead-time reminders + 12 hourly same-day slots.
    assert_eq!(scheduled, 15);
    assert_eq!(h.triggers_for(payment.id).await.len(), 15);
}

#[tokio::test]
async fn lead_time_flags_apply_independently() {
    let h = Harness::new();
    let payment = common::payment_due_in(10, "Rent");
    let prefs = NotificationPreferences {
        notify_2_days: false,
        notify_same_day: false,
        ..NotificationPreferences::default()
    };

    h.scheduler
        .schedule_payment_notifications(&payment, &prefs)
        .await
        .unwrap();

    let kinds: HashSet<ReminderKind> = h
        .triggers_for(payment.id)
        .await
        .iter()
        .filter_map(|t| TriggerPayload::from_value(&t.payload))
        .map(|p| p.kind)
        .collect();
    assert_eq!(
        kinds,
        HashSet::from([ReminderKind::ThreeDaysBefore, ReminderKind::OneDayBefore])
    );
}

#[tokio::test]
async fn same_day_interval_controls_series_density() {
    let h = Harness::new();
    let payment = common::payment_due_in(10, "Rent");
    let prefs = NotificationPreferences {
        notify_3_days: false,
        notify_2_days: false,
        notify_1_day: false,
        same_day_interval: SameDayInterval::Min120,
        ..NotificationPreferences::default()
    };

    h.scheduler
        .schedule_payment_notifications(&payment, &prefs)
        .await
        .unwrap();

    // 08:00, 10:00, 12:00, 14:00, 16:00, 18:00.
    assert_eq!(h.triggers_for(payment.id).await.len(), 6);
}

// ---------------------------------------------------------------------------
// Idempotence / staleness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rescheduling_twice_leaves_no_duplicates() {
    let h = Harness::new();
    let payment = common::payment_due_in(10, "Rent");
    let prefs = NotificationPreferences::default();

    h.scheduler
        .schedule_payment_notifications(&payment, &prefs)
        .await
        .unwrap();
    h.scheduler
        .schedule_payment_notifications(&payment, &prefs)
        .await
        .unwrap();

    assert_eq!(h.triggers_for(payment.id).await.len(), 15);
}

#[tokio::test]
async fn moving_the_due_date_removes_stale_triggers() {
    let h = Harness::new();
    let mut payment = common::payment_due_in(10, "Rent");
    let prefs = NotificationPreferences::default();

    h.scheduler
        .schedule_payment_notifications(&payment, &prefs)
        .await
        .unwrap();

    payment.set_due_day(common::future_due_day(20), common::utc_offset());
    h.scheduler
        .schedule_payment_notifications(&payment, &prefs)
        .await
        .unwrap();

    let live = h.triggers_for(payment.id).await;
    assert_eq!(live.len(), 15);

    // Every surviving trigger belongs to the new due date: nothing fires
    // earlier than three days before it.
    let earliest_valid = fluxpay_core::plan::local_instant(
        common::future_due_day(20)
            .checked_sub_days(Days::new(3))
            .unwrap(),
        9,
        0,
        common::utc_offset(),
    );
    assert!(live.iter().all(|t| t.at >= earliest_valid));
}

#[tokio::test]
async fn disabling_notifications_on_reschedule_clears_the_payment() {
    let h = Harness::new();
    let payment = common::payment_due_in(10, "Rent");

    h.scheduler
        .schedule_payment_notifications(&payment, &NotificationPreferences::default())
        .await
        .unwrap();
    assert_eq!(h.triggers_for(payment.id).await.len(), 15);

    let scheduled = h
        .scheduler
        .schedule_payment_notifications(&payment, &NotificationPreferences::disabled())
        .await
        .unwrap();

    assert_eq!(scheduled, 0);
    assert!(h.triggers_for(payment.id).await.is_empty());
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_is_isolated_per_payment() {
    let h = Harness::new();
    let rent = common::payment_due_in(10, "Rent");
    let gym = common::payment_due_in(12, "Gym");
    let prefs = NotificationPreferences::default();

    h.scheduler
        .schedule_payment_notifications(&rent, &prefs)
        .await
        .unwrap();
    h.scheduler
        .schedule_payment_notifications(&gym, &prefs)
        .await
        .unwrap();

    let cancelled = h
        .scheduler
        .cancel_payment_notifications(rent.id)
        .await
        .unwrap();

    assert_eq!(cancelled, 15);
    assert!(h.triggers_for(rent.id).await.is_empty());
    assert_eq!(h.triggers_for(gym.id).await.len(), 15);
}

#[tokio::test]
async fn cancelling_with_no_matches_is_a_noop() {
    let h = Harness::new();
    let cancelled = h
        .scheduler
        .cancel_payment_notifications(uuid::Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(cancelled, 0);
}

// ---------------------------------------------------------------------------
// Reschedule-all
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reschedule_all_covers_every_payment() {
    let h = Harness::new();
    let rent = common::payment_due_in(10, "Rent");
    let gym = common::payment_due_in(12, "Gym");
    h.payments.upsert(h.user, rent.clone()).await;
    h.payments.upsert(h.user, gym.clone()).await;

    let prefs = NotificationPreferences::default();
    h.scheduler
        .reschedule_all_user_payments(h.user, &prefs)
        .await
        .unwrap();

    assert_eq!(h.triggers_for(rent.id).await.len(), 15);
    assert_eq!(h.triggers_for(gym.id).await.len(), 15);
}

#[tokio::test]
async fn reschedule_all_is_idempotent() {
    let h = Harness::new();
    h.payments
        .upsert(h.user, common::payment_due_in(10, "Rent"))
        .await;
    let prefs = NotificationPreferences::default();

    for _ in 0..3 {
        h.scheduler
            .reschedule_all_user_payments(h.user, &prefs)
            .await
            .unwrap();
    }

    assert_eq!(h.live_count().await, 15);
}

#[tokio::test]
async fn global_disable_cancels_everything_on_the_device() {
    let h = Harness::new();
    let rent = common::payment_due_in(10, "Rent");
    h.payments.upsert(h.user, rent.clone()).await;
    h.scheduler
        .schedule_payment_notifications(&rent, &NotificationPreferences::default())
        .await
        .unwrap();

    // A trigger some other flow placed on the shared device store; the
    // global disable path is documented to take those down too.
    let foreign = common::payment_due_in(15, "Electric");
    h.scheduler
        .schedule_payment_notifications(&foreign, &NotificationPreferences::default())
        .await
        .unwrap();
    assert!(h.live_count().await > 0);

    h.scheduler
        .reschedule_all_user_payments(h.user, &NotificationPreferences::disabled())
        .await
        .unwrap();

    assert_eq!(h.live_count().await, 0);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

/// Adapter whose schedule calls fail for one poisoned payment id.
struct FlakyAdapter {
    inner: Arc<dyn DeviceNotificationAdapter>,
    poisoned: PaymentId,
}

#[async_trait]
impl DeviceNotificationAdapter for FlakyAdapter {
    fn is_supported(&self) -> bool {
        self.inner.is_supported()
    }

    async fn configure(&self) -> Result<(), AdapterError> {
        self.inner.configure().await
    }

    async fn request_permissions(&self) -> Result<PermissionStatus, AdapterError> {
        self.inner.request_permissions().await
    }

    async fn schedule_at(
        &self,
        at: fluxpay_core::types::Timestamp,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) -> Result<TriggerId, AdapterError> {
        if TriggerPayload::from_value(&payload).is_some_and(|p| p.payment_id == self.poisoned) {
            return Err(AdapterError::Store("simulated device failure".into()));
        }
        self.inner.schedule_at(at, title, body, payload).await
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledTrigger>, AdapterError> {
        self.inner.list_scheduled().await
    }

    async fn cancel(&self, id: TriggerId) -> Result<(), AdapterError> {
        self.inner.cancel(id).await
    }

    async fn cancel_all(&self) -> Result<(), AdapterError> {
        self.inner.cancel_all().await
    }

    fn subscribe_fired(&self) -> tokio::sync::broadcast::Receiver<fluxpay_device::FiredNotification> {
        self.inner.subscribe_fired()
    }
}

#[tokio::test]
async fn one_failing_payment_does_not_block_the_rest() {
    let h = Harness::new();
    let rent = common::payment_due_in(10, "Rent");
    let gym = common::payment_due_in(12, "Gym");
    h.payments.upsert(h.user, rent.clone()).await;
    h.payments.upsert(h.user, gym.clone()).await;

    let flaky = Arc::new(FlakyAdapter {
        inner: h.adapter.clone(),
        poisoned: rent.id,
    });
    let scheduler = ReminderScheduler::with_offset(
        flaky,
        h.payments.clone(),
        h.preferences.clone(),
        common::utc_offset(),
    );

    let prefs = NotificationPreferences::default();
    scheduler
        .reschedule_all_user_payments(h.user, &prefs)
        .await
        .unwrap();

    assert!(h.triggers_for(rent.id).await.is_empty());
    assert_eq!(h.triggers_for(gym.id).await.len(), 15);
}

/// Repository whose reads always fail.
struct OfflineRepository;

#[async_trait]
impl PaymentRepository for OfflineRepository {
    async fn list_by_user(&self, _user_id: UserId) -> Result<Vec<Payment>, StoreError> {
        Err(StoreError::Read("backend offline".into()))
    }

    async fn get(
        &self,
        _user_id: UserId,
        _payment_id: PaymentId,
    ) -> Result<Option<Payment>, StoreError> {
        Err(StoreError::Read("backend offline".into()))
    }
}

#[tokio::test]
async fn unreadable_payment_list_fails_reschedule_all() {
    let h = Harness::new();
    let scheduler = ReminderScheduler::with_offset(
        h.adapter.clone(),
        Arc::new(OfflineRepository),
        h.preferences.clone(),
        common::utc_offset(),
    );

    let err = scheduler
        .reschedule_all_user_payments(uuid::Uuid::new_v4(), &NotificationPreferences::default())
        .await
        .unwrap_err();
    assert_matches::assert_matches!(err, EngineError::Store(StoreError::Read(_)));
}

// ---------------------------------------------------------------------------
// Degraded runtime
// ---------------------------------------------------------------------------

#[tokio::test]
async fn degraded_runtime_is_a_silent_noop() {
    let scheduler = ReminderScheduler::with_offset(
        Arc::new(NoopAdapter::new()),
        Arc::new(InMemoryPaymentRepository::new()),
        Arc::new(InMemoryPreferenceStore::new()),
        common::utc_offset(),
    );
    let payment = common::payment_due_in(10, "Rent");
    let prefs = NotificationPreferences::default();

    scheduler.ensure_configured().await.unwrap();
    assert_eq!(
        scheduler.request_permissions().await.unwrap(),
        PermissionStatus::Denied
    );
    assert_eq!(
        scheduler
            .schedule_payment_notifications(&payment, &prefs)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        scheduler
            .cancel_payment_notifications(payment.id)
            .await
            .unwrap(),
        0
    );
    scheduler
        .reschedule_all_user_payments(uuid::Uuid::new_v4(), &prefs)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Preference persistence entry point
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_preferences_persists_and_reconciles() {
    let h = Harness::new();
    let rent = common::payment_due_in(10, "Rent");
    h.payments.upsert(h.user, rent.clone()).await;

    // First access creates defaults.
    let defaults = h.scheduler.preferences(h.user).await.unwrap();
    assert_eq!(defaults, NotificationPreferences::default());

    let trimmed = NotificationPreferences {
        notify_same_day: false,
        ..NotificationPreferences::default()
    };
    h.scheduler
        .update_preferences(h.user, trimmed.clone())
        .await
        .unwrap();

    assert_eq!(h.scheduler.preferences(h.user).await.unwrap(), trimmed);
    // Only the three lead-time reminders survive the reconcile.
    assert_eq!(h.triggers_for(rent.id).await.len(), 3);
}
