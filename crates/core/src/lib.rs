//! FluxPay domain types and pure reminder planning.
//!
//! This crate holds everything the scheduling engine needs that has no I/O:
//!
//! - [`Payment`] — a recurring payment as the reminder engine sees it.
//! - [`NotificationPreferences`] / [`SameDayInterval`] — per-user reminder
//!   settings.
//! - [`ReminderKind`] / [`TriggerPayload`] — the tag attached to every
//!   scheduled trigger, used from scheduling through history recording.
//! - [`plan::compute_triggers`] — the pure function that turns a payment and
//!   a preferences snapshot into the full set of planned triggers.
//!
//! All temporal math takes an explicit `now` and UTC offset so it is
//! deterministic under test. This crate has zero internal dependencies.

pub mod payment;
pub mod plan;
pub mod preferences;
pub mod reminder;
pub mod types;

pub use payment::Payment;
pub use plan::{compute_triggers, PlannedTrigger};
pub use preferences::{NotificationPreferences, SameDayInterval};
pub use reminder::{ReminderKind, TriggerPayload};
