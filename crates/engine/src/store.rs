//! Narrow interfaces to the externally-owned backend.
//!
//! Payments and preferences are persisted by a hosted backend outside this
//! repository; the engine only ever sees them through these traits. The
//! in-memory implementations double as the app-side cache and as test
//! fixtures.

use std::collections::HashMap;

use async_trait::async_trait;
use fluxpay_core::types::{PaymentId, UserId};
use fluxpay_core::{NotificationPreferences, Payment};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for backend reads and writes.
///
/// Read failures propagate out of scheduling operations — without current
/// data no safe scheduling decision can be made.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend read failed: {0}")]
    Read(String),

    #[error("Backend write failed: {0}")]
    Write(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Per-user notification preference persistence.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// The user's preferences. Creates and persists the defaults when the
    /// user has none yet.
    async fn get(&self, user_id: UserId) -> Result<NotificationPreferences, StoreError>;

    async fn set(
        &self,
        user_id: UserId,
        prefs: NotificationPreferences,
    ) -> Result<(), StoreError>;
}

/// Read access to the user's payments.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, StoreError>;

    /// A single payment, or `None` when it no longer exists.
    async fn get(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory preference store.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    inner: Mutex<HashMap<UserId, NotificationPreferences>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(&self, user_id: UserId) -> Result<NotificationPreferences, StoreError> {
        let mut map = self.inner.lock().await;
        Ok(map
            .entry(user_id)
            .or_insert_with(NotificationPreferences::default)
            .clone())
    }

    async fn set(
        &self,
        user_id: UserId,
        prefs: NotificationPreferences,
    ) -> Result<(), StoreError> {
        self.inner.lock().await.insert(user_id, prefs);
        Ok(())
    }
}

/// In-memory payment repository.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    inner: Mutex<HashMap<UserId, Vec<Payment>>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a payment for a user.
    pub async fn upsert(&self, user_id: UserId, payment: Payment) {
        let mut map = self.inner.lock().await;
        let payments = map.entry(user_id).or_default();
        match payments.iter_mut().find(|p| p.id == payment.id) {
            Some(existing) => *existing = payment,
            None => payments.push(payment),
        }
    }

    /// Remove a payment; removing an unknown id is a no-op.
    pub async fn remove(&self, user_id: UserId, payment_id: PaymentId) {
        if let Some(payments) = self.inner.lock().await.get_mut(&user_id) {
            payments.retain(|p| p.id != payment_id);
        }
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .get(&user_id)
            .and_then(|payments| payments.iter().find(|p| p.id == payment_id).cloned()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
