//! Calendar-day handling for show dates.
//!
//! A show date is a day on the calendar, not an instant. Stored values that
//! arrive as timestamps (midnight UTC is the usual convention) are reduced to
//! their UTC day components; the runtime's local timezone is never consulted.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A timezone-less calendar day on which a show takes place.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ShowDate(NaiveDate);

impl ShowDate {
  pub fn new(date: NaiveDate) -> Self { Self(date) }

  pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(year, month, day).map(Self)
  }

  /// Reduce a stored timestamp to its calendar day.
  ///
  /// The value is converted to UTC *before* the day is read, so a stored
  /// `2024-07-19T00:00:00Z` is July 19th whatever offset it is carried in.
  pub fn from_stored<Tz: TimeZone>(stored: DateTime<Tz>) -> Self {
    Self(stored.with_timezone(&Utc).date_naive())
  }

  pub fn as_naive(&self) -> NaiveDate { self.0 }

  pub fn year(&self) -> i32 { self.0.year() }

  pub fn month(&self) -> u32 { self.0.month() }

  pub fn day(&self) -> u32 { self.0.day() }
}

impl fmt::Display for ShowDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format("%Y-%m-%d"))
  }
}

impl FromStr for ShowDate {
  type Err = chrono::ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
  }
}

impl From<NaiveDate> for ShowDate {
  fn from(date: NaiveDate) -> Self { Self(date) }
}

#[cfg(test)]
mod tests {
  use chrono::{FixedOffset, TimeZone};

  use super::*;

  #[test]
  fn stored_midnight_utc_keeps_its_day() {
    let stored = Utc.with_ymd_and_hms(2024, 7, 19, 0, 0, 0).unwrap();
    let date = ShowDate::from_stored(stored);
    assert_eq!((date.year(), date.month(), date.day()), (2024, 7, 19));

    // Reading the same instant in Pacific time would land on the 18th.
    let pacific = stored.with_timezone(&chrono_tz::America::Los_Angeles);
    assert_eq!(pacific.date_naive().day(), 18);
  }

  #[test]
  fn offset_carried_values_are_normalised_to_utc() {
    let offset = FixedOffset::west_opt(7 * 3600).unwrap();
    let stored = offset.with_ymd_and_hms(2024, 7, 18, 17, 0, 0).unwrap();
    assert_eq!(ShowDate::from_stored(stored).to_string(), "2024-07-19");
  }

  #[test]
  fn parses_and_formats_iso_days() {
    let date: ShowDate = "2024-12-31".parse().unwrap();
    assert_eq!(date.to_string(), "2024-12-31");
    assert!("12/31/2024".parse::<ShowDate>().is_err());
  }
}
