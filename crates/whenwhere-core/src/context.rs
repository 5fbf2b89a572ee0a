//! Filtering context: which day, time and place a filter call is about.
//!
//! A `None` dimension is not a filter at all. That is a separate code path
//! from an empty range, even though both currently let everything through.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::day::Day;
use crate::error::ValueError;
use crate::location::Coordinate;
use crate::time_of_day::TimeOfDay;

/// How far the filter looks ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    /// This exact hour, today.
    #[default]
    Now,
    /// Any time today.
    Today,
    /// Any time tomorrow.
    Tomorrow,
    /// Any day, any time.
    Week,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 4] = [
        TimeFrame::Now,
        TimeFrame::Today,
        TimeFrame::Tomorrow,
        TimeFrame::Week,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeFrame::Now => "now",
            TimeFrame::Today => "today",
            TimeFrame::Tomorrow => "tomorrow",
            TimeFrame::Week => "week",
        }
    }
}

impl FromStr for TimeFrame {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tf| tf.as_str() == wanted)
            .ok_or_else(|| ValueError::UnknownTimeFrame(s.to_string()))
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the user is right now, as far as the caller knows.
///
/// Either part may be missing. With neither, location does not constrain
/// anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentLocation {
    /// A saved location the user says they are at.
    pub id: Option<String>,
    /// A raw position, e.g. from a device.
    pub coordinate: Option<Coordinate>,
}

impl CurrentLocation {
    pub fn at_location(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            coordinate: None,
        }
    }

    pub fn at_coordinate(coordinate: Coordinate) -> Self {
        Self {
            id: None,
            coordinate: Some(coordinate),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id.is_none() && self.coordinate.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub time: Option<TimeOfDay>,
    pub day: Option<Day>,
    pub location: CurrentLocation,
}

/// Build the context for `mode` at local wall-clock time `now_local`.
///
/// | mode     | time        | day              |
/// |----------|-------------|------------------|
/// | now      | `now_local` | today            |
/// | today    | none        | today            |
/// | tomorrow | none        | today's successor|
/// | week     | none        | none             |
pub fn build_context(mode: TimeFrame, now_local: NaiveDateTime, location: CurrentLocation) -> Context {
    let today = Day::of_date(now_local.date());
    let (time, day) = match mode {
        TimeFrame::Now => (Some(TimeOfDay::from(now_local.time())), Some(today)),
        TimeFrame::Today => (None, Some(today)),
        TimeFrame::Tomorrow => (None, Some(today.successor())),
        TimeFrame::Week => (None, None),
    };
    Context { time, day, location }
}

/// Wall-clock time at `utc_offset_minutes` east of UTC for the instant `utc`.
///
/// # Errors
/// Returns [`ValueError::OutOfRange`] for offsets of a day or more.
pub fn local_time_at(utc: DateTime<Utc>, utc_offset_minutes: i32) -> Result<NaiveDateTime, ValueError> {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(ValueError::OutOfRange {
            kind: "utc offset",
            value: utc_offset_minutes as i64,
        })?;
    Ok(utc.with_timezone(&offset).naive_local())
}

/// Current wall-clock time at the given UTC offset.
pub fn local_now(utc_offset_minutes: i32) -> Result<NaiveDateTime, ValueError> {
    local_time_at(Utc::now(), utc_offset_minutes)
}
