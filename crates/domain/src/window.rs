//! Allowed window: the time-of-day band during which the relay may be actuated.

use chrono::Timelike;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::PolicyRejection;
use crate::time::Timestamp;

/// Hour band `[start_hour, end_hour)` in civil time.
///
/// When `start_hour > end_hour` the band wraps past midnight
/// (e.g. 23–7 covers 23:00 through 06:59). When `start_hour == end_hour`
/// the band is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedWindow {
    start_hour: u32,
    end_hour: u32,
}

/// An hour outside `0..24`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("window hours must be in 0..24, got {start_hour}..{end_hour}")]
pub struct InvalidWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl AllowedWindow {
    /// # Errors
    ///
    /// Returns [`InvalidWindow`] if either hour is 24 or more.
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, InvalidWindow> {
        if start_hour >= 24 || end_hour >= 24 {
            return Err(InvalidWindow {
                start_hour,
                end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    #[must_use]
    pub fn start_hour(self) -> u32 {
        self.start_hour
    }

    #[must_use]
    pub fn end_hour(self) -> u32 {
        self.end_hour
    }

    /// Whether the band wraps past midnight.
    #[must_use]
    pub fn is_overnight(self) -> bool {
        self.start_hour > self.end_hour
    }

    #[must_use]
    pub fn contains_hour(self, hour: u32) -> bool {
        if self.is_overnight() {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}

impl Default for AllowedWindow {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 7,
        }
    }
}

/// Whether `now`, seen on the civil clock of `time_zone`, falls inside `window`.
#[must_use]
pub fn is_within_allowed_hours(now: Timestamp, window: AllowedWindow, time_zone: Tz) -> bool {
    window.contains_hour(now.with_timezone(&time_zone).hour())
}

/// The allowed window bound to the zone it is expressed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPolicy {
    pub window: AllowedWindow,
    pub time_zone: Tz,
    /// Short zone name used in messages (e.g. `EST`).
    pub zone_label: String,
}

impl TriggerPolicy {
    #[must_use]
    pub fn new(window: AllowedWindow, time_zone: Tz, zone_label: impl Into<String>) -> Self {
        Self {
            window,
            time_zone,
            zone_label: zone_label.into(),
        }
    }

    #[must_use]
    pub fn is_allowed(&self, now: Timestamp) -> bool {
        is_within_allowed_hours(now, self.window, self.time_zone)
    }

    /// Message shown to callers when the window is closed.
    #[must_use]
    pub fn rejection_message(&self) -> String {
        format!(
            "Relay can only be triggered between {} and {} {}",
            hour_label(self.window.start_hour),
            hour_label(self.window.end_hour),
            self.zone_label
        )
    }

    /// # Errors
    ///
    /// Returns [`PolicyRejection`] when `now` is outside the window.
    pub fn check(&self, now: Timestamp) -> Result<(), PolicyRejection> {
        if self.is_allowed(now) {
            Ok(())
        } else {
            Err(PolicyRejection {
                message: self.rejection_message(),
            })
        }
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self::new(AllowedWindow::default(), chrono_tz::America::New_York, "EST")
    }
}

/// 12-hour label: `0 -> "12 AM"`, `13 -> "1 PM"`.
fn hour_label(hour: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display} {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// 2024-01-15 is in EST (UTC-5).
    fn ny(hour: u32, min: u32) -> Timestamp {
        chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 1, 15, hour, min, 0)
            .unwrap()
            .to_utc()
    }

    #[test]
    fn should_allow_overnight_hours_only() {
        let window = AllowedWindow::new(23, 7).unwrap();
        for hour in 0..24 {
            let expected = hour == 23 || hour < 7;
            assert_eq!(
                is_within_allowed_hours(ny(hour, 30), window, chrono_tz::America::New_York),
                expected,
                "hour {hour}"
            );
        }
    }

    #[test]
    fn should_treat_same_day_window_as_conjunction() {
        let window = AllowedWindow::new(9, 17).unwrap();
        assert!(!window.contains_hour(8));
        assert!(window.contains_hour(9));
        assert!(window.contains_hour(16));
        assert!(!window.contains_hour(17));
        assert!(!window.contains_hour(23));
    }

    #[test]
    fn should_treat_equal_bounds_as_empty() {
        let window = AllowedWindow::new(5, 5).unwrap();
        assert!((0..24).all(|hour| !window.contains_hour(hour)));
    }

    #[test]
    fn should_reject_hours_past_23() {
        assert!(AllowedWindow::new(24, 7).is_err());
        assert!(AllowedWindow::new(23, 24).is_err());
    }

    #[test]
    fn should_evaluate_in_configured_zone_not_utc() {
        let policy = TriggerPolicy::default();
        // 04:30 UTC is 23:30 in New York.
        let ts = Utc.with_ymd_and_hms(2024, 1, 16, 4, 30, 0).unwrap();
        assert!(policy.is_allowed(ts));
        // 23:30 UTC is 18:30 in New York.
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap();
        assert!(!policy.is_allowed(ts));
    }

    #[test]
    fn should_format_rejection_message_with_twelve_hour_labels() {
        let policy = TriggerPolicy::default();
        assert_eq!(
            policy.rejection_message(),
            "Relay can only be triggered between 11 PM and 7 AM EST"
        );
    }

    #[test]
    fn should_label_midnight_and_noon() {
        assert_eq!(hour_label(0), "12 AM");
        assert_eq!(hour_label(12), "12 PM");
        assert_eq!(hour_label(13), "1 PM");
    }

    #[test]
    fn should_return_rejection_outside_window() {
        let policy = TriggerPolicy::default();
        let err = policy.check(ny(12, 0)).unwrap_err();
        assert_eq!(err.message, policy.rejection_message());
        assert!(policy.check(ny(23, 30)).is_ok());
    }
}
