//! Pure trigger planning.
//!
//! [`compute_triggers`] turns a payment and a preferences snapshot into the
//! complete set of triggers the device should hold for that payment. It is
//! a pure function over an explicit `now` and UTC offset; the engine owns
//! actually reconciling the device against the returned plan.
//!
//! Planning rules:
//!
//! - Lead-time reminders (3/2/1 days before) fire at 09:00 local.
//! - The same-day series runs on the due day from 08:00 local, spaced by
//!   the configured interval, ending strictly before 20:00 local.
//! - Any instant at or before `now` is skipped silently; past reminders are
//!   meaningless and device adapters may reject or immediately fire them.

use chrono::{Days, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::payment::Payment;
use crate::preferences::NotificationPreferences;
use crate::reminder::{notification_text, ReminderKind, TriggerPayload};
use crate::types::Timestamp;

/// Local hour lead-time reminders fire at.
const LEAD_TIME_HOUR: u32 = 9;

/// Local hour the same-day series starts at.
const SAME_DAY_START_HOUR: u32 = 8;

/// Local hour the same-day series ends before (exclusive).
const SAME_DAY_END_HOUR: u32 = 20;

/// Minimum spacing of the same-day series, minutes.
const SAME_DAY_MIN_SPACING_MINUTES: i64 = 15;

// ---------------------------------------------------------------------------
// PlannedTrigger
// ---------------------------------------------------------------------------

/// One trigger the device should hold: when, what to show, and the payload
/// that ties it back to its payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTrigger {
    pub at: Timestamp,
    pub title: String,
    pub body: String,
    pub payload: TriggerPayload,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Compute the full trigger set for one payment.
///
/// Returns an empty plan when the master switch is off. Triggers at or
/// before `now` are omitted, so the plan can legitimately be empty even
/// with every preference enabled.
pub fn compute_triggers(
    payment: &Payment,
    prefs: &NotificationPreferences,
    now: Timestamp,
    offset: FixedOffset,
) -> Vec<PlannedTrigger> {
    if !prefs.notifications_enabled {
        return Vec::new();
    }

    let due_day = payment.due_day(offset);
    let mut plan = Vec::new();

    for kind in ReminderKind::LEAD_TIMES {
        if !prefs.is_enabled_for(kind) {
            continue;
        }
        let Some(days) = kind.lead_days() else {
            continue;
        };
        let Some(day) = due_day.checked_sub_days(Days::new(days as u64)) else {
            continue;
        };
        let at = local_instant(day, LEAD_TIME_HOUR, 0, offset);
        if at > now {
            plan.push(trigger(payment, kind, at));
        }
    }

    if prefs.is_enabled_for(ReminderKind::SameDay) {
        let spacing = Duration::minutes(
            (prefs.same_day_interval.as_minutes() as i64).max(SAME_DAY_MIN_SPACING_MINUTES),
        );
        let end = local_instant(due_day, SAME_DAY_END_HOUR, 0, offset);
        let mut at = local_instant(due_day, SAME_DAY_START_HOUR, 0, offset);
        while at < end {
            if at > now {
                plan.push(trigger(payment, ReminderKind::SameDay, at));
            }
            at += spacing;
        }
    }

    plan
}

fn trigger(payment: &Payment, kind: ReminderKind, at: Timestamp) -> PlannedTrigger {
    let (title, body) = notification_text(kind, payment);
    PlannedTrigger {
        at,
        title,
        body,
        payload: TriggerPayload::new(payment.id, kind),
    }
}

/// The UTC instant of local `hour:minute` on `day` in `offset`.
pub fn local_instant(day: NaiveDate, hour: u32, minute: u32, offset: FixedOffset) -> Timestamp {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    match offset.from_local_datetime(&day.and_time(time)) {
        // A fixed offset maps every local time to exactly one instant.
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        _ => Utc.from_utc_datetime(&day.and_time(time)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
