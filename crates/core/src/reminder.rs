//! Reminder kinds and the payload attached to every scheduled trigger.
//!
//! [`ReminderKind`] is the single enumeration used end to end: the planner
//! tags each trigger with it, the engine cancels by it, and the history
//! listener records it. Its wire form (`"3_days"`, `"2_days"`, `"1_day"`,
//! `"same_day"`) matches the `type` column of the backend's history table.

use serde::{Deserialize, Serialize};

use crate::payment::Payment;
use crate::types::PaymentId;

// ---------------------------------------------------------------------------
// ReminderKind
// ---------------------------------------------------------------------------

/// Which reminder a scheduled trigger represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderKind {
    /// Lead-time reminder three days before the due date.
    #[serde(rename = "3_days")]
    ThreeDaysBefore,
    /// Lead-time reminder two days before the due date.
    #[serde(rename = "2_days")]
    TwoDaysBefore,
    /// Lead-time reminder one day before the due date.
    #[serde(rename = "1_day")]
    OneDayBefore,
    /// One trigger of the repeating series on the due date itself.
    #[serde(rename = "same_day")]
    SameDay,
}

impl ReminderKind {
    /// The lead-time kinds in descending day order.
    pub const LEAD_TIMES: [ReminderKind; 3] = [
        ReminderKind::ThreeDaysBefore,
        ReminderKind::TwoDaysBefore,
        ReminderKind::OneDayBefore,
    ];

    /// Days before the due date this kind fires, or `None` for [`SameDay`].
    ///
    /// [`SameDay`]: ReminderKind::SameDay
    pub fn lead_days(self) -> Option<u32> {
        match self {
            ReminderKind::ThreeDaysBefore => Some(3),
            ReminderKind::TwoDaysBefore => Some(2),
            ReminderKind::OneDayBefore => Some(1),
            ReminderKind::SameDay => None,
        }
    }

    /// Wire/history name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderKind::ThreeDaysBefore => "3_days",
            ReminderKind::TwoDaysBefore => "2_days",
            ReminderKind::OneDayBefore => "1_day",
            ReminderKind::SameDay => "same_day",
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerPayload
// ---------------------------------------------------------------------------

/// The payload attached to every scheduled trigger.
///
/// Crosses the device boundary as untyped JSON (the OS stores it as an
/// opaque blob) and is parsed back by the history listener. Anything that
/// fails to parse — a foreign notification, a payload from an old app
/// version — is dropped, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    /// The payment this trigger belongs to; cancellation filters on it.
    #[serde(rename = "paymentId")]
    pub payment_id: PaymentId,
    /// Which reminder this trigger represents.
    pub kind: ReminderKind,
}

impl TriggerPayload {
    pub fn new(payment_id: PaymentId, kind: ReminderKind) -> Self {
        Self { payment_id, kind }
    }

    /// Serialize for the device boundary.
    pub fn to_value(&self) -> serde_json::Value {
        // Struct-to-Value conversion for this shape cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Parse a payload coming back from the device, if it is one of ours.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// Notification text
// ---------------------------------------------------------------------------

/// Human-readable title and body for a reminder about `payment`.
pub fn notification_text(kind: ReminderKind, payment: &Payment) -> (String, String) {
    let amount = format!("{:.2} {}", payment.amount, payment.currency);
    match kind.lead_days() {
        Some(1) => (
            format!("Payment due tomorrow: {}", payment.name),
            format!("{} ({amount}) is due tomorrow.", payment.name),
        ),
        Some(days) => (
            format!("Upcoming payment: {}", payment.name),
            format!("{} ({amount}) is due in {days} days.", payment.name),
        ),
        None => (
            format!("Payment due today: {}", payment.name),
            format!("{} ({amount}) is due today. Don't forget to pay!", payment.name),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
