//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Show dates are bare `YYYY-MM-DD` days.
//! Enums are stored as their snake_case names; setlists and award metadata
//! as compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use encore_core::{
  achievement::UserAchievement,
  date::ShowDate,
  setlist::SetSongList,
  show::Show,
  song::Song,
  submission::{Pick, PickCategory, PickOutcome, Submission},
  tour::{Standing, Tour, TourStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Parse(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Parse(format!("date {s:?}: {e}")))
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn encode_status(s: TourStatus) -> String { s.to_string() }

pub fn decode_status(s: &str) -> Result<TourStatus> {
  s.parse().map_err(|_| Error::Parse(format!("unknown tour status: {s:?}")))
}

pub fn encode_category(c: PickCategory) -> String { c.to_string() }

pub fn decode_category(s: &str) -> Result<PickCategory> {
  s.parse().map_err(|_| Error::Parse(format!("unknown pick category: {s:?}")))
}

pub fn encode_outcome(o: Option<PickOutcome>) -> Option<String> { o.map(|o| o.to_string()) }

pub fn decode_outcome(s: Option<&str>) -> Result<Option<PickOutcome>> {
  s.map(|s| {
    s.parse()
      .map_err(|_| Error::Parse(format!("unknown pick outcome: {s:?}")))
  })
  .transpose()
}

// ─── Setlist ──────────────────────────────────────────────────────────────────

pub fn encode_setlist(list: &SetSongList) -> Result<String> { Ok(serde_json::to_string(list)?) }

pub fn decode_setlist(s: &str) -> Result<SetSongList> { Ok(serde_json::from_str(s)?) }

fn to_u32(v: i64, what: &str) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Parse(format!("{what} out of range: {v}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `tours` row.
pub struct RawTour {
  pub tour_id:    String,
  pub name:       String,
  pub start_date: String,
  pub end_date:   String,
  pub status:     String,
}

impl RawTour {
  pub fn into_tour(self) -> Result<Tour> {
    Ok(Tour {
      tour_id:    decode_uuid(&self.tour_id)?,
      name:       self.name,
      start_date: decode_date(&self.start_date)?,
      end_date:   decode_date(&self.end_date)?,
      status:     decode_status(&self.status)?,
    })
  }
}

/// Raw values read from a `shows` row.
pub struct RawShow {
  pub show_id:              String,
  pub tour_id:              String,
  pub show_date:            String,
  pub venue:                String,
  pub city:                 String,
  pub region:               Option<String>,
  pub country:              String,
  pub timezone:             Option<String>,
  pub is_complete:          bool,
  pub completion_signalled: bool,
  pub setlist_json:         Option<String>,
  pub setlist_fetched_at:   Option<String>,
  pub lock_at:              Option<String>,
  pub last_scored_at:       Option<String>,
}

impl RawShow {
  pub fn into_show(self) -> Result<Show> {
    Ok(Show {
      show_id:              decode_uuid(&self.show_id)?,
      tour_id:              decode_uuid(&self.tour_id)?,
      show_date:            ShowDate::new(decode_date(&self.show_date)?),
      venue:                self.venue,
      city:                 self.city,
      region:               self.region,
      country:              self.country,
      timezone:             self.timezone,
      is_complete:          self.is_complete,
      completion_signalled: self.completion_signalled,
      setlist:              self.setlist_json.as_deref().map(decode_setlist).transpose()?,
      setlist_fetched_at:   self.setlist_fetched_at.as_deref().map(decode_dt).transpose()?,
      lock_at:              self.lock_at.as_deref().map(decode_dt).transpose()?,
      last_scored_at:       self.last_scored_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read from a `songs` row.
pub struct RawSong {
  pub song_id:      String,
  pub name:         String,
  pub slug:         String,
  pub artist:       String,
  pub times_played: i64,
  pub gap:          i64,
  pub last_played:  Option<String>,
}

impl RawSong {
  pub fn into_song(self) -> Result<Song> {
    Ok(Song {
      song_id:      decode_uuid(&self.song_id)?,
      name:         self.name,
      slug:         self.slug,
      artist:       self.artist,
      times_played: to_u32(self.times_played, "times_played")?,
      gap:          to_u32(self.gap, "gap")?,
      last_played:  self.last_played.as_deref().map(decode_date).transpose()?,
    })
  }
}

/// Raw values read from a `submissions` row.
pub struct RawSubmission {
  pub submission_id:        String,
  pub user_id:              String,
  pub show_id:              String,
  pub points:               i64,
  pub is_scored:            bool,
  pub last_seen_song_count: i64,
  pub created_at:           String,
}

impl RawSubmission {
  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id:        decode_uuid(&self.submission_id)?,
      user_id:              decode_uuid(&self.user_id)?,
      show_id:              decode_uuid(&self.show_id)?,
      points:               self.points,
      is_scored:            self.is_scored,
      last_seen_song_count: to_u32(self.last_seen_song_count, "last_seen_song_count")?,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `picks` row.
pub struct RawPick {
  pub pick_id:       String,
  pub submission_id: String,
  pub song_slug:     String,
  pub category:      String,
  pub outcome:       Option<String>,
  pub points_earned: i64,
}

impl RawPick {
  pub fn into_pick(self) -> Result<Pick> {
    Ok(Pick {
      pick_id:       decode_uuid(&self.pick_id)?,
      submission_id: decode_uuid(&self.submission_id)?,
      song_slug:     self.song_slug,
      category:      decode_category(&self.category)?,
      outcome:       decode_outcome(self.outcome.as_deref())?,
      points_earned: self.points_earned,
    })
  }
}

/// Raw values read from a `user_achievements` row.
pub struct RawUserAchievement {
  pub user_id:          String,
  pub achievement_slug: String,
  pub earned_at:        String,
  pub source_show_id:   Option<String>,
  pub metadata_json:    String,
}

impl RawUserAchievement {
  pub fn into_award(self) -> Result<UserAchievement> {
    Ok(UserAchievement {
      user_id:          decode_uuid(&self.user_id)?,
      achievement_slug: self.achievement_slug,
      earned_at:        decode_dt(&self.earned_at)?,
      source_show_id:   self.source_show_id.as_deref().map(decode_uuid).transpose()?,
      metadata:         serde_json::from_str(&self.metadata_json)?,
    })
  }
}

/// Raw values read from a `tour_podiums` row.
pub struct RawStanding {
  pub rank:        i64,
  pub user_id:     String,
  pub points:      i64,
  pub submissions: i64,
}

impl RawStanding {
  pub fn into_standing(self) -> Result<Standing> {
    Ok(Standing {
      rank:        to_u32(self.rank, "rank")?,
      user_id:     decode_uuid(&self.user_id)?,
      points:      self.points,
      submissions: to_u32(self.submissions, "submissions")?,
    })
  }
}
