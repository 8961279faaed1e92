//! The FluxPay reminder engine.
//!
//! Ties the pure planner in `fluxpay-core` to the device boundary in
//! `fluxpay-device`:
//!
//! - [`ReminderScheduler`] — cancel-then-recreate reconciliation of the
//!   device trigger store against the current payment + preferences state.
//! - [`PreferenceStore`] / [`PaymentRepository`] — the narrow interfaces to
//!   the externally-owned backend, with in-memory implementations.
//! - [`HistoryListener`] / [`NotificationHistoryRecorder`] — the pipeline
//!   that turns fired triggers into durable history entries.

pub mod history;
pub mod scheduler;
pub mod store;

pub use history::{
    HistoryListener, InMemoryHistoryRecorder, NotificationHistoryEntry,
    NotificationHistoryRecorder,
};
pub use scheduler::{EngineError, EngineResult, ReminderScheduler};
pub use store::{
    InMemoryPaymentRepository, InMemoryPreferenceStore, PaymentRepository, PreferenceStore,
    StoreError,
};
