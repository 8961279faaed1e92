//! `fluxpay-demo` -- drives the reminder engine end to end on one device.
//!
//! Wires the in-memory stores, the capability-selected device adapter, the
//! scheduler, and the history listener, then runs a scripted scenario:
//! seed two payments, schedule their reminders, flip a preference, and
//! show the device state after each step.
//!
//! # Environment variables
//!
//! | Variable                      | Default | Description                              |
//! |-------------------------------|---------|------------------------------------------|
//! | `FLUXPAY_LOCAL_NOTIFICATIONS` | `on`    | Set `off` to force degraded mode         |
//! | `FIRE_TICK_MS`                | `1000`  | Firing-loop poll interval, milliseconds  |
//! | `RUST_LOG`                    | --      | Tracing filter (`fluxpay=debug`, ...)    |

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Utc};
use fluxpay_core::{NotificationPreferences, Payment};
use fluxpay_device::capability;
use fluxpay_engine::{
    HistoryListener, InMemoryHistoryRecorder, InMemoryPaymentRepository,
    InMemoryPreferenceStore, ReminderScheduler,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Default firing-loop tick.
const DEFAULT_FIRE_TICK_MS: u64 = 1000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fluxpay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let tick_ms: u64 = std::env::var("FIRE_TICK_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_FIRE_TICK_MS);

    let adapter = capability::select_adapter(Duration::from_millis(tick_ms));
    let payments = Arc::new(InMemoryPaymentRepository::new());
    let preferences = Arc::new(InMemoryPreferenceStore::new());
    let scheduler = ReminderScheduler::new(adapter.clone(), payments.clone(), preferences.clone());

    scheduler.ensure_configured().await?;
    let permission = scheduler.request_permissions().await?;
    tracing::info!(?permission, supported = adapter.is_supported(), "Engine ready");

    let user = Uuid::new_v4();
    let offset = scheduler.offset();
    let today = Utc::now().with_timezone(&offset).date_naive();

    let rent = Payment::new(
        "Rent",
        850.0,
        "EUR",
        today.checked_add_days(Days::new(3)).unwrap_or(today),
        offset,
    )
    .with_url("https://pay.example.com/rent");
    let gym = Payment::new(
        "Gym membership",
        29.99,
        "EUR",
        today.checked_add_days(Days::new(1)).unwrap_or(today),
        offset,
    );
    payments.upsert(user, rent.clone()).await;
    payments.upsert(user, gym.clone()).await;

    // History pipeline, fed by the adapter's fired-event channel. In
    // degraded mode the channel stays quiet and the listener simply idles.
    let recorder = Arc::new(InMemoryHistoryRecorder::new());
    let cancel = CancellationToken::new();
    let listener = HistoryListener::new(user, payments.clone(), recorder.clone());
    tokio::spawn(listener.run(adapter.subscribe_fired(), cancel.clone()));

    let prefs = scheduler.preferences(user).await?;
    scheduler.reschedule_all_user_payments(user, &prefs).await?;
    report(&adapter, "after initial scheduling").await;

    // The user turns the same-day series off.
    let trimmed = NotificationPreferences {
        notify_same_day: false,
        ..prefs
    };
    scheduler.update_preferences(user, trimmed).await?;
    report(&adapter, "after disabling same-day reminders").await;

    // The user deletes the gym membership.
    payments.remove(user, gym.id).await;
    scheduler.cancel_payment_notifications(gym.id).await?;
    report(&adapter, "after deleting a payment").await;

    tracing::info!(
        history_entries = recorder.entries().await.len(),
        "Demo complete"
    );
    cancel.cancel();
    Ok(())
}

async fn report(adapter: &Arc<dyn fluxpay_device::DeviceNotificationAdapter>, stage: &str) {
    match adapter.list_scheduled().await {
        Ok(mut live) => {
            live.sort_by_key(|t| t.at);
            tracing::info!(stage, triggers = live.len(), "Device state");
            for trigger in live.iter().take(5) {
                tracing::info!(at = %trigger.at, title = %trigger.title, "  scheduled");
            }
            if live.len() > 5 {
                tracing::info!(more = live.len() - 5, "  ... further triggers elided");
            }
        }
        Err(e) => tracing::warn!(stage, error = %e, "Could not list device triggers"),
    }
}
