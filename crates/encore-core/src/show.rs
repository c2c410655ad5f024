//! Shows: one night of a tour, and the derived scoring state cached on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{date::ShowDate, setlist::SetSongList};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
  pub show_id:              Uuid,
  pub tour_id:              Uuid,
  pub show_date:            ShowDate,
  pub venue:                String,
  pub city:                 String,
  /// State, province or region code (e.g. `"NY"`).
  pub region:               Option<String>,
  pub country:              String,
  /// IANA identifier such as `"America/New_York"`.
  pub timezone:             Option<String>,
  pub is_complete:          bool,
  /// An admin declared the show over. Survives failed passes so later
  /// passes keep treating the setlist as final; cleared by a reset.
  pub completion_signalled: bool,
  pub setlist:              Option<SetSongList>,
  pub setlist_fetched_at:   Option<DateTime<Utc>>,
  /// Cached copy of the resolved lock instant.
  pub lock_at:              Option<DateTime<Utc>>,
  pub last_scored_at:       Option<DateTime<Utc>>,
}

impl Show {
  /// A freshly scheduled show with no derived state.
  pub fn scheduled(
    tour_id: Uuid,
    show_date: ShowDate,
    venue: impl Into<String>,
    city: impl Into<String>,
    region: Option<String>,
    country: impl Into<String>,
    timezone: Option<String>,
  ) -> Self {
    Self {
      show_id: Uuid::new_v4(),
      tour_id,
      show_date,
      venue: venue.into(),
      city: city.into(),
      region,
      country: country.into(),
      timezone,
      is_complete: false,
      completion_signalled: false,
      setlist: None,
      setlist_fetched_at: None,
      lock_at: None,
      last_scored_at: None,
    }
  }

  /// Fingerprint of the cached setlist, if one was fetched.
  pub fn setlist_fingerprint(&self) -> Option<String> {
    self.setlist.as_ref().map(SetSongList::fingerprint)
  }
}
