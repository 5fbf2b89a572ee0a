//! Day-of-week value.
//!
//! Codes follow the Sunday-first convention: Sunday = 0 … Saturday = 6.
//! Ordering, equality and hashing all go through the code, so days can be
//! kept in ordered or hashed sets interchangeably.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Canonical weekday names indexed by day code.
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Day {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl Day {
    /// All days in code order.
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// Build a day from its numeric code.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] when `code` is outside `0..=6`.
    pub fn from_code(code: i64) -> Result<Self, ValueError> {
        if (0..7).contains(&code) {
            Ok(Self::ALL[code as usize])
        } else {
            Err(ValueError::OutOfRange { kind: "day", value: code })
        }
    }

    /// Look up a day by its canonical name, ignoring case.
    ///
    /// Three-letter abbreviations ("mon", "Sat") are accepted as well.
    ///
    /// # Errors
    /// Returns [`ValueError::UnknownDayName`] when nothing matches.
    pub fn from_name(name: &str) -> Result<Self, ValueError> {
        let wanted = name.trim().to_lowercase();
        DAY_NAMES
            .iter()
            .position(|n| {
                let n = n.to_lowercase();
                n == wanted || (wanted.len() == 3 && n.starts_with(&wanted))
            })
            .map(|i| Self::ALL[i])
            .ok_or_else(|| ValueError::UnknownDayName(name.to_string()))
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        DAY_NAMES[self.code() as usize]
    }

    /// Next day of the week. Saturday wraps to Sunday.
    pub fn successor(self) -> Self {
        Self::ALL[(self.code() as usize + 1) % 7]
    }

    /// Weekday of a calendar date.
    pub fn of_date(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_sunday() as usize]
    }
}

impl From<Day> for u8 {
    fn from(day: Day) -> Self {
        day.code()
    }
}

impl TryFrom<u8> for Day {
    type Error = ValueError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Day::from_code(code as i64)
    }
}

impl FromStr for Day {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::from_name(s)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
