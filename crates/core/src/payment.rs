//! The payment record as the reminder engine consumes it.
//!
//! Payments are owned by the backend; the engine only ever reads them. The
//! one invariant enforced here is due-date normalization: a due date is
//! always stored as **local noon** of its calendar day, so extracting the
//! day later can never land on the wrong side of a timezone boundary.

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{PaymentId, Timestamp};

/// Local wall-clock time a due date is normalized to.
const DUE_DATE_ANCHOR_HOUR: u32 = 12;

/// A recurring payment registered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// Display name, e.g. `"Rent"`.
    pub name: String,
    /// Display-only amount; no monetary arithmetic happens in the engine.
    pub amount: f64,
    /// 3-letter currency code, display-only.
    pub currency: String,
    /// Due instant, normalized to local noon of the due day.
    pub due_date: Timestamp,
    /// Optional payment deep link, display-only.
    pub payment_url: Option<String>,
}

impl Payment {
    /// Create a payment due on `due_day`, normalizing the due date to local
    /// noon in `offset`.
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
        due_day: NaiveDate,
        offset: FixedOffset,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            currency: currency.into(),
            due_date: Self::normalize_due_date(due_day, offset),
            payment_url: None,
        }
    }

    /// Attach a payment deep link.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.payment_url = Some(url.into());
        self
    }

    /// Local noon of `due_day` in `offset`, as a UTC instant.
    pub fn normalize_due_date(due_day: NaiveDate, offset: FixedOffset) -> Timestamp {
        let noon = NaiveTime::from_hms_opt(DUE_DATE_ANCHOR_HOUR, 0, 0)
            .unwrap_or(NaiveTime::MIN);
        match offset.from_local_datetime(&due_day.and_time(noon)) {
            // A fixed offset maps every local time to exactly one instant.
            chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
            _ => Utc.from_utc_datetime(&due_day.and_time(noon)),
        }
    }

    /// Move the payment to a new due day, re-normalizing to local noon.
    pub fn set_due_day(&mut self, due_day: NaiveDate, offset: FixedOffset) {
        self.due_date = Self::normalize_due_date(due_day, offset);
    }

    /// The local calendar day the payment is due in `offset`.
    pub fn due_day(&self, offset: FixedOffset) -> NaiveDate {
        self.due_date.with_timezone(&offset).date_naive()
    }
}
