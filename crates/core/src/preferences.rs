//! Per-user notification preferences.

use serde::{Deserialize, Serialize};

use crate::reminder::ReminderKind;

// ---------------------------------------------------------------------------
// SameDayInterval
// ---------------------------------------------------------------------------

/// Spacing between same-day reminders, restricted to a small legal set.
///
/// Serialized as the plain minute count. Unknown minute values coming from
/// stored settings are clamped to the nearest legal value with a floor of
/// 15 minutes, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum SameDayInterval {
    Min15,
    Min30,
    Min45,
    Min60,
    Min90,
    Min120,
}

/// All legal intervals in ascending order.
const LEGAL_INTERVALS: [SameDayInterval; 6] = [
    SameDayInterval::Min15,
    SameDayInterval::Min30,
    SameDayInterval::Min45,
    SameDayInterval::Min60,
    SameDayInterval::Min90,
    SameDayInterval::Min120,
];

impl SameDayInterval {
    /// The spacing in minutes.
    pub fn as_minutes(self) -> u32 {
        match self {
            SameDayInterval::Min15 => 15,
            SameDayInterval::Min30 => 30,
            SameDayInterval::Min45 => 45,
            SameDayInterval::Min60 => 60,
            SameDayInterval::Min90 => 90,
            SameDayInterval::Min120 => 120,
        }
    }

    /// Clamp an arbitrary minute count to the nearest legal interval.
    ///
    /// Ties round down; anything at or below 15 becomes 15.
    pub fn from_minutes(minutes: u32) -> Self {
        let mut best = SameDayInterval::Min15;
        let mut best_distance = u32::MAX;
        for candidate in LEGAL_INTERVALS {
            let distance = candidate.as_minutes().abs_diff(minutes);
            if distance < best_distance {
                best = candidate;
                best_distance = distance;
            }
        }
        best
    }
}

impl Default for SameDayInterval {
    fn default() -> Self {
        SameDayInterval::Min60
    }
}

impl From<u32> for SameDayInterval {
    fn from(minutes: u32) -> Self {
        SameDayInterval::from_minutes(minutes)
    }
}

impl From<SameDayInterval> for u32 {
    fn from(interval: SameDayInterval) -> Self {
        interval.as_minutes()
    }
}

// ---------------------------------------------------------------------------
// NotificationPreferences
// ---------------------------------------------------------------------------

/// A user's reminder settings.
///
/// The sub-preferences are only meaningful while `notifications_enabled` is
/// true; when it is false the engine guarantees zero outstanding triggers
/// for the user regardless of the other flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Master switch.
    pub notifications_enabled: bool,
    pub notify_3_days: bool,
    pub notify_2_days: bool,
    pub notify_1_day: bool,
    /// Enables the repeating reminder series on the due day itself.
    pub notify_same_day: bool,
    pub same_day_interval: SameDayInterval,
}

impl NotificationPreferences {
    /// Whether reminders of `kind` are enabled.
    ///
    /// Always false while the master switch is off.
    pub fn is_enabled_for(&self, kind: ReminderKind) -> bool {
        if !self.notifications_enabled {
            return false;
        }
        match kind {
            ReminderKind::ThreeDaysBefore => self.notify_3_days,
            ReminderKind::TwoDaysBefore => self.notify_2_days,
            ReminderKind::OneDayBefore => self.notify_1_day,
            ReminderKind::SameDay => self.notify_same_day,
        }
    }

    /// Preferences with the master switch off.
    pub fn disabled() -> Self {
        Self {
            notifications_enabled: false,
            ..Self::default()
        }
    }
}

impl Default for NotificationPreferences {
    /// Everything on, hourly same-day reminders.
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            notify_3_days: true,
            notify_2_days: true,
            notify_1_day: true,
            notify_same_day: true,
            same_day_interval: SameDayInterval::Min60,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
