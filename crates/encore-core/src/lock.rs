//! Lock-time resolution.
//!
//! Picks for a show freeze at the venue's local show start. The local start
//! is a fixed time of day (configurable, 19:00 by default) on the show's
//! calendar date, interpreted in the venue's IANA timezone. When the feed
//! omits the timezone, the region (state, province, or country) picks one.
//!
//! Nothing here reads the runtime's local timezone.

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, date::ShowDate, show::Show};

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
  /// Local wall-clock time at which a show is taken to start.
  pub show_start:        NaiveTime,
  /// Lock this many minutes before the show start.
  pub lock_lead_minutes: i64,
}

impl Default for LockSettings {
  fn default() -> Self {
    Self {
      show_start:        NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default(),
      lock_lead_minutes: 0,
    }
  }
}

// ─── Lock state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
  Open { locks_at: DateTime<Utc> },
  Locked { since: DateTime<Utc> },
  /// No lock time could be computed; callers treat the show as open.
  Undetermined,
}

impl LockState {
  pub fn is_locked(self) -> bool { matches!(self, Self::Locked { .. }) }

  pub fn instant(self) -> Option<DateTime<Utc>> {
    match self {
      Self::Open { locks_at } => Some(locks_at),
      Self::Locked { since } => Some(since),
      Self::Undetermined => None,
    }
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LockTimeResolver {
  settings: LockSettings,
}

impl LockTimeResolver {
  pub fn new(settings: LockSettings) -> Self { Self { settings } }

  pub fn settings(&self) -> &LockSettings { &self.settings }

  /// The instant after which picks for the show are frozen.
  pub fn lock_instant(
    &self,
    date: ShowDate,
    timezone: Option<&str>,
    region: Option<&str>,
  ) -> Result<DateTime<Utc>> {
    let zone = resolve_zone(timezone, &[region])?;
    self.lock_in_zone(date, zone)
  }

  /// Lock instant for a stored show, falling back from region to country.
  pub fn lock_instant_for(&self, show: &Show) -> Result<DateTime<Utc>> {
    let zone = resolve_zone(
      show.timezone.as_deref(),
      &[show.region.as_deref(), Some(show.country.as_str())],
    )?;
    self.lock_in_zone(show.show_date, zone)
  }

  /// Whether picks are frozen at `now`.
  ///
  /// An unresolvable timezone is logged and reported as *not* locked.
  pub fn is_locked_at(
    &self,
    date: ShowDate,
    timezone: Option<&str>,
    region: Option<&str>,
    now: DateTime<Utc>,
  ) -> bool {
    classify(self.lock_instant(date, timezone, region), date, now).is_locked()
  }

  pub fn is_locked(&self, date: ShowDate, timezone: Option<&str>, region: Option<&str>) -> bool {
    self.is_locked_at(date, timezone, region, Utc::now())
  }

  /// Lock state of a stored show at `now`.
  pub fn state_for(&self, show: &Show, now: DateTime<Utc>) -> LockState {
    classify(self.lock_instant_for(show), show.show_date, now)
  }

  fn lock_in_zone(&self, date: ShowDate, zone: Tz) -> Result<DateTime<Utc>> {
    let start = date.as_naive().and_time(self.settings.show_start);
    let local = start - TimeDelta::minutes(self.settings.lock_lead_minutes);
    zone
      .from_local_datetime(&local)
      .earliest()
      .map(|dt| dt.with_timezone(&Utc))
      .ok_or(Error::NonexistentLocalTime(local))
  }
}

fn classify(
  instant: Result<DateTime<Utc>>,
  date: ShowDate,
  now: DateTime<Utc>,
) -> LockState {
  match instant {
    Ok(at) if now >= at => LockState::Locked { since: at },
    Ok(at) => LockState::Open { locks_at: at },
    Err(e) => {
      tracing::error!(show_date = %date, error = %e, "cannot determine lock time; treating show as open");
      LockState::Undetermined
    }
  }
}

// ─── Timezone lookup ─────────────────────────────────────────────────────────

/// Pick a zone: an explicit, parseable timezone wins; otherwise the first
/// region hint with a known zone.
pub fn resolve_zone(timezone: Option<&str>, regions: &[Option<&str>]) -> Result<Tz> {
  let explicit = timezone.map(str::trim).filter(|tz| !tz.is_empty());
  let parsed = explicit.and_then(|tz| match tz.parse::<Tz>() {
    Ok(zone) => Some(zone),
    Err(_) => {
      tracing::warn!(timezone = tz, "unparseable timezone; falling back to region");
      None
    }
  });
  let regional = regions.iter().flatten().find_map(|r| zone_for_region(r));

  match (parsed, regional) {
    (Some(zone), Some(hint)) => {
      if zone != hint {
        tracing::debug!(%zone, %hint, "explicit timezone disagrees with region; keeping explicit");
      }
      Ok(zone)
    }
    (Some(zone), None) => Ok(zone),
    (None, Some(hint)) => Ok(hint),
    (None, None) => Err(Error::UnresolvedTimezone {
      timezone: explicit.map(str::to_owned),
      region:   regions.iter().flatten().next().map(|r| (*r).to_owned()),
    }),
  }
}

/// Zone for a US state / DC, Canadian province, or single-zone country.
pub fn zone_for_region(region: &str) -> Option<Tz> {
  use chrono_tz::{America, Asia, Europe, Pacific};

  let upper = region.trim().to_ascii_uppercase();
  let key = upper
    .strip_prefix("US-")
    .or_else(|| upper.strip_prefix("CA-"))
    .unwrap_or(&upper);

  let zone = match key {
    "CT" | "DE" | "DC" | "FL" | "GA" | "ME" | "MD" | "MA" | "NH" | "NJ" | "NY" | "NC"
    | "OH" | "PA" | "RI" | "SC" | "VT" | "VA" | "WV" | "KY" => America::New_York,
    "MI" => America::Detroit,
    "IN" => America::Indiana::Indianapolis,
    "AL" | "AR" | "IL" | "IA" | "KS" | "LA" | "MN" | "MS" | "MO" | "NE" | "ND" | "OK"
    | "SD" | "TN" | "TX" | "WI" => America::Chicago,
    "CO" | "MT" | "NM" | "UT" | "WY" => America::Denver,
    "ID" => America::Boise,
    "AZ" => America::Phoenix,
    "CA" | "NV" | "OR" | "WA" => America::Los_Angeles,
    "AK" => America::Anchorage,
    "HI" => Pacific::Honolulu,
    "ON" | "QC" => America::Toronto,
    "BC" => America::Vancouver,
    "AB" => America::Edmonton,
    "MB" => America::Winnipeg,
    "NS" => America::Halifax,
    "GB" | "UK" | "ENGLAND" | "SCOTLAND" | "UNITED KINGDOM" => Europe::London,
    "IE" | "IRELAND" => Europe::Dublin,
    "NETHERLANDS" => Europe::Amsterdam,
    "GERMANY" => Europe::Berlin,
    "FR" | "FRANCE" => Europe::Paris,
    "IT" | "ITALY" => Europe::Rome,
    "ES" | "SPAIN" => Europe::Madrid,
    "JP" | "JAPAN" => Asia::Tokyo,
    "JM" | "JAMAICA" => America::Jamaica,
    "DO" | "DOMINICAN REPUBLIC" => America::Santo_Domingo,
    _ => return None,
  };
  Some(zone)
}
