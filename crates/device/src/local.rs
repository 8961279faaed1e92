//! The real device adapter: an in-process trigger store with a background
//! firing loop.
//!
//! [`LocalAdapter`] keeps scheduled triggers in memory and runs a periodic
//! loop (started by the first [`configure`](LocalAdapter::configure) call)
//! that fires every trigger whose instant has passed, publishing a
//! [`FiredNotification`] on a broadcast channel. Subscribers that lag
//! observe `RecvError::Lagged` and continue; with zero subscribers fired
//! events are silently dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fluxpay_core::types::{Timestamp, TriggerId};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::adapter::{
    AdapterError, DeviceNotificationAdapter, FiredNotification, PermissionStatus,
    ScheduledTrigger,
};

/// Default firing-loop tick.
const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Buffer capacity of the fired-notification broadcast channel.
const FIRED_CHANNEL_CAPACITY: usize = 256;

type TriggerStore = Arc<Mutex<HashMap<TriggerId, ScheduledTrigger>>>;

/// In-process local notification store.
pub struct LocalAdapter {
    store: TriggerStore,
    fired_tx: broadcast::Sender<FiredNotification>,
    /// Explicit one-time-setup state; `configure` flips it exactly once.
    configured: AtomicBool,
    cancel: CancellationToken,
    tick: Duration,
}

impl LocalAdapter {
    /// Create an adapter with the default firing tick.
    pub fn new() -> Self {
        Self::with_tick(DEFAULT_TICK)
    }

    /// Create an adapter with a custom firing tick (tests use short ticks).
    pub fn with_tick(tick: Duration) -> Self {
        let (fired_tx, _) = broadcast::channel(FIRED_CHANNEL_CAPACITY);
        Self {
            store: Arc::new(Mutex::new(HashMap::new())),
            fired_tx,
            configured: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            tick,
        }
    }

    /// Stop the firing loop. Scheduled triggers stay in the store but will
    /// no longer fire.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Fire every trigger whose instant has passed, removing it from the
    /// store.
    async fn fire_due(store: &TriggerStore, fired_tx: &broadcast::Sender<FiredNotification>) {
        let now = Utc::now();
        let due: Vec<ScheduledTrigger> = {
            let mut map = store.lock().await;
            let ids: Vec<TriggerId> = map
                .values()
                .filter(|t| t.at <= now)
                .map(|t| t.id)
                .collect();
            ids.into_iter().filter_map(|id| map.remove(&id)).collect()
        };

        for trigger in due {
            tracing::debug!(trigger_id = %trigger.id, title = %trigger.title, "Firing notification");
            // Ignore the SendError — it only means there are zero receivers.
            let _ = fired_tx.send(FiredNotification {
                trigger,
                fired_at: now,
            });
        }
    }
}

impl Default for LocalAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceNotificationAdapter for LocalAdapter {
    fn is_supported(&self) -> bool {
        true
    }

    /// Start the firing loop. Only the first call does anything.
    async fn configure(&self) -> Result<(), AdapterError> {
        if self.configured.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let store = Arc::clone(&self.store);
        let fired_tx = self.fired_tx.clone();
        let cancel = self.cancel.clone();
        let tick = self.tick;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Notification firing loop cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        LocalAdapter::fire_due(&store, &fired_tx).await;
                    }
                }
            }
        });

        tracing::info!("Local notification adapter configured");
        Ok(())
    }

    async fn request_permissions(&self) -> Result<PermissionStatus, AdapterError> {
        Ok(PermissionStatus::Granted)
    }

    async fn schedule_at(
        &self,
        at: Timestamp,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) -> Result<TriggerId, AdapterError> {
        if at <= Utc::now() {
            return Err(AdapterError::PastTrigger { at });
        }
        let trigger = ScheduledTrigger {
            id: Uuid::new_v4(),
            at,
            title: title.to_string(),
            body: body.to_string(),
            payload,
        };
        let id = trigger.id;
        self.store.lock().await.insert(id, trigger);
        Ok(id)
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledTrigger>, AdapterError> {
        Ok(self.store.lock().await.values().cloned().collect())
    }

    async fn cancel(&self, id: TriggerId) -> Result<(), AdapterError> {
        self.store.lock().await.remove(&id);
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), AdapterError> {
        self.store.lock().await.clear();
        Ok(())
    }

    fn subscribe_fired(&self) -> broadcast::Receiver<FiredNotification> {
        self.fired_tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
