//! Decoding of the feed's `setlists/showdate` response.
//!
//! The feed answers with an envelope:
//!
//! ```json
//! { "error": false, "error_message": "", "data": [
//!   { "showdate": "2024-07-19", "set": "1", "position": 1,
//!     "song": "Tweezer", "slug": "tweezer", "artist_slug": "phish" }
//! ] }
//! ```
//!
//! Set labels are either a set number (`"1"`, `"2"`) or one of the
//! configured encore labels (`"e"`, `"e2"`); the N-th encore label maps to
//! `Encore(N)`.

use encore_core::{
  date::ShowDate,
  setlist::{Segment, SetSongList, SetlistEntry},
  song::normalize_slug,
};
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
  #[serde(default)]
  error:         bool,
  #[serde(default)]
  error_message: String,
  #[serde(default)]
  data:          Vec<Row>,
}

/// Some feed versions send numbers as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
  Int(u16),
  Text(String),
}

impl Number {
  fn value(&self) -> Option<u16> {
    match self {
      Self::Int(n) => Some(*n),
      Self::Text(s) => s.trim().parse().ok(),
    }
  }
}

#[derive(Debug, Deserialize)]
struct Row {
  showdate:    String,
  set:         String,
  position:    Option<Number>,
  song:        String,
  slug:        String,
  #[serde(default)]
  artist_slug: Option<String>,
}

/// Map a feed set label to a [`Segment`].
pub fn segment_for(label: &str, encore_labels: &[String]) -> Result<Segment> {
  let label = label.trim();
  if let Some(idx) = encore_labels.iter().position(|l| l.eq_ignore_ascii_case(label)) {
    let n = u8::try_from(idx + 1)
      .map_err(|_| Error::Schema(format!("too many encore labels to number {label:?}")))?;
    return Ok(Segment::Encore(n));
  }
  label
    .parse::<u8>()
    .ok()
    .filter(|n| *n > 0)
    .map(Segment::Set)
    .ok_or_else(|| Error::Schema(format!("unknown set label {label:?}")))
}

/// Decode a response body into the setlist for `date`.
///
/// Rows for other artists or other dates are dropped. Returns `None` when no
/// row remains. If any row lacks a usable position, every row is numbered by
/// feed order instead, so explicit and fallback positions never collide.
pub fn parse_payload(
  body: &str,
  date: ShowDate,
  artist_slug: &str,
  encore_labels: &[String],
) -> Result<Option<SetSongList>> {
  let envelope: Envelope = serde_json::from_str(body)?;
  if envelope.error {
    return Err(Error::Api(envelope.error_message));
  }

  let wanted = date.to_string();
  let mut entries = Vec::new();
  let mut positioned = true;
  for (idx, row) in envelope.data.into_iter().enumerate() {
    if row.showdate.trim() != wanted {
      continue;
    }
    if let Some(artist) = &row.artist_slug {
      if !artist.eq_ignore_ascii_case(artist_slug) {
        continue;
      }
    }
    let slug = normalize_slug(&row.slug);
    if slug.is_empty() {
      return Err(Error::Schema(format!("row {idx} has no song slug")));
    }
    let position = row.position.as_ref().and_then(Number::value).unwrap_or(0);
    positioned &= position > 0;
    entries.push(SetlistEntry {
      position,
      segment: segment_for(&row.set, encore_labels)?,
      slug,
      song: row.song,
    });
  }

  if entries.is_empty() {
    return Ok(None);
  }
  if !positioned {
    for (i, entry) in entries.iter_mut().enumerate() {
      entry.position = u16::try_from(i + 1)
        .map_err(|_| Error::Schema(format!("too many rows to number: {}", i + 1)))?;
    }
  }
  Ok(Some(SetSongList::new(date, entries)))
}
