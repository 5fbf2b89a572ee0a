//! Clock time value (hour, minute) without a date or zone.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time of day with minute resolution.
///
/// Field order gives the derived ordering: by hour, then minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };

    /// # Errors
    /// Returns [`ValueError::OutOfRange`] when `hour` is outside `0..=23`
    /// or `minute` outside `0..=59`.
    pub fn new(hour: i64, minute: i64) -> Result<Self, ValueError> {
        if !(0..24).contains(&hour) {
            return Err(ValueError::OutOfRange { kind: "hour", value: hour });
        }
        if !(0..60).contains(&minute) {
            return Err(ValueError::OutOfRange { kind: "minute", value: minute });
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Whole hour, e.g. `TimeOfDay::at_hour(9)` is 09:00.
    pub fn at_hour(hour: i64) -> Result<Self, ValueError> {
        Self::new(hour, 0)
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_since_midnight(self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    fn from_minutes(total: u32) -> Self {
        let total = total % MINUTES_PER_DAY;
        Self {
            hour: (total / 60) as u8,
            minute: (total % 60) as u8,
        }
    }

    /// Add minutes, wrapping past midnight. 23:30 + 60 is 00:30.
    pub fn wrapping_add_minutes(self, minutes: u32) -> Self {
        Self::from_minutes(self.minutes_since_midnight() + minutes % MINUTES_PER_DAY)
    }

    /// Forward distance in minutes from `self` to `later`, crossing
    /// midnight when `later` is earlier on the clock.
    pub fn minutes_until(self, later: TimeOfDay) -> u32 {
        let from = self.minutes_since_midnight();
        let to = later.minutes_since_midnight();
        (to + MINUTES_PER_DAY - from) % MINUTES_PER_DAY
    }

    /// Start of the hour this time falls in.
    pub fn hour_slot(self) -> Self {
        Self {
            hour: self.hour,
            minute: 0,
        }
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = ValueError;

    /// Parses `HH:MM` (a single-digit hour is allowed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidTimeOfDay(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if m.len() != 2 || h.is_empty() || h.len() > 2 {
            return Err(invalid());
        }
        let hour: i64 = h.parse().map_err(|_| invalid())?;
        let minute: i64 = m.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: i64, m: i64) -> TimeOfDay {
        TimeOfDay::new(h, m).unwrap()
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert_eq!(
            TimeOfDay::new(24, 0),
            Err(ValueError::OutOfRange { kind: "hour", value: 24 })
        );
        assert_eq!(
            TimeOfDay::new(-1, 0),
            Err(ValueError::OutOfRange { kind: "hour", value: -1 })
        );
        assert_eq!(
            TimeOfDay::new(12, 60),
            Err(ValueError::OutOfRange { kind: "minute", value: 60 })
        );
    }

    #[test]
    fn ordering_by_hour_then_minute() {
        assert!(t(9, 59) < t(10, 0));
        assert!(t(10, 1) > t(10, 0));
        assert_eq!(t(7, 30), t(7, 30));
    }

    #[test]
    fn wrapping_add_crosses_midnight() {
        assert_eq!(t(23, 30).wrapping_add_minutes(60), t(0, 30));
        assert_eq!(t(8, 0).wrapping_add_minutes(MINUTES_PER_DAY), t(8, 0));
        assert_eq!(t(0, 0).wrapping_add_minutes(90), t(1, 30));
    }

    #[test]
    fn minutes_until_wraps() {
        assert_eq!(t(20, 0).minutes_until(t(6, 0)), 10 * 60);
        assert_eq!(t(6, 0).minutes_until(t(20, 0)), 14 * 60);
        assert_eq!(t(6, 0).minutes_until(t(6, 0)), 0);
    }

    #[test]
    fn hour_slot_truncates_minutes() {
        assert_eq!(t(9, 37).hour_slot(), t(9, 0));
        assert_eq!(t(0, 0).hour_slot(), TimeOfDay::MIDNIGHT);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("09:05".parse::<TimeOfDay>().unwrap(), t(9, 5));
        assert_eq!("7:30".parse::<TimeOfDay>().unwrap(), t(7, 30));
        assert_eq!(t(7, 5).to_string(), "07:05");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("9".parse::<TimeOfDay>().is_err());
        assert!("09:5".parse::<TimeOfDay>().is_err());
        assert!("ab:cd".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn from_naive_time_drops_seconds() {
        let nt = NaiveTime::from_hms_opt(14, 45, 59).unwrap();
        assert_eq!(TimeOfDay::from(nt), t(14, 45));
    }

    #[test]
    fn serde_uses_hh_mm() {
        assert_eq!(serde_json::to_string(&t(6, 0)).unwrap(), "\"06:00\"");
        assert_eq!(serde_json::from_str::<TimeOfDay>("\"21:15\"").unwrap(), t(21, 15));
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }
}
