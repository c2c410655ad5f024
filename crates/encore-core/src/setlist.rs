//! Setlists as reported by the external feed.
//!
//! A setlist is an ordered list of entries, each tagged with the segment it
//! was played in. Sets are numbered from 1; encores are their own segment.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{date::ShowDate, song::normalize_slug};

// ─── Segment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum Segment {
  Set(u8),
  Encore(u8),
}

impl Segment {
  pub fn is_encore(self) -> bool { matches!(self, Self::Encore(_)) }
}

impl fmt::Display for Segment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Set(n) => write!(f, "set {n}"),
      Self::Encore(1) => write!(f, "encore"),
      Self::Encore(n) => write!(f, "encore {n}"),
    }
  }
}

// ─── Entry / list ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetlistEntry {
  /// Running position within the whole show, starting at 1.
  pub position: u16,
  pub segment:  Segment,
  pub slug:     String,
  /// Display name; informational only.
  pub song:     String,
}

/// The songs played at one show so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSongList {
  pub show_date: ShowDate,
  pub entries:   Vec<SetlistEntry>,
}

impl SetSongList {
  /// Build a list, ordering entries by position.
  pub fn new(show_date: ShowDate, mut entries: Vec<SetlistEntry>) -> Self {
    entries.sort_by_key(|e| e.position);
    Self { show_date, entries }
  }

  pub fn empty(show_date: ShowDate) -> Self { Self { show_date, entries: Vec::new() } }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn song_count(&self) -> u32 { self.entries.len() as u32 }

  /// First song of the first set, if set 1 has started.
  pub fn opener(&self) -> Option<&SetlistEntry> {
    self
      .entries
      .iter()
      .filter(|e| e.segment == Segment::Set(1))
      .min_by_key(|e| e.position)
  }

  pub fn contains(&self, slug: &str) -> bool {
    let slug = normalize_slug(slug);
    self.entries.iter().any(|e| normalize_slug(&e.slug) == slug)
  }

  pub fn in_encore(&self, slug: &str) -> bool {
    let slug = normalize_slug(slug);
    self
      .entries
      .iter()
      .any(|e| e.segment.is_encore() && normalize_slug(&e.slug) == slug)
  }

  pub fn has_encore(&self) -> bool { self.entries.iter().any(|e| e.segment.is_encore()) }

  /// Stable digest of the list's content. Two fetches with the same songs in
  /// the same places share a fingerprint; display names do not participate.
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.show_date.to_string().as_bytes());
    for e in &self.entries {
      hasher.update(e.position.to_le_bytes());
      let (kind, n) = match e.segment {
        Segment::Set(n) => (0u8, n),
        Segment::Encore(n) => (1u8, n),
      };
      hasher.update([kind, n]);
      hasher.update(normalize_slug(&e.slug).as_bytes());
      hasher.update([0]);
    }
    hex::encode(hasher.finalize())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(position: u16, segment: Segment, slug: &str) -> SetlistEntry {
    SetlistEntry { position, segment, slug: slug.into(), song: slug.to_uppercase() }
  }

  fn date() -> ShowDate { ShowDate::from_ymd(2024, 7, 19).unwrap() }

  #[test]
  fn opener_is_first_song_of_set_one() {
    let list = SetSongList::new(date(), vec![
      entry(3, Segment::Set(2), "down-with-disease"),
      entry(2, Segment::Set(1), "ac-dc-bag"),
      entry(1, Segment::Set(1), "chalk-dust-torture"),
    ]);
    assert_eq!(list.opener().unwrap().slug, "chalk-dust-torture");
    assert_eq!(list.entries[0].position, 1);
  }

  #[test]
  fn no_opener_without_set_one() {
    let list = SetSongList::new(date(), vec![entry(1, Segment::Set(2), "ghost")]);
    assert!(list.opener().is_none());
  }

  #[test]
  fn slug_matching_ignores_case_and_whitespace() {
    let list = SetSongList::new(date(), vec![entry(1, Segment::Encore(1), "Loving-Cup")]);
    assert!(list.contains(" loving-cup"));
    assert!(list.in_encore("LOVING-CUP"));
    assert!(list.has_encore());
  }

  #[test]
  fn fingerprint_tracks_content_not_names() {
    let a = SetSongList::new(date(), vec![entry(1, Segment::Set(1), "ghost")]);
    let mut b = a.clone();
    b.entries[0].song = "Ghost (renamed)".into();
    assert_eq!(a.fingerprint(), b.fingerprint());

    let c = SetSongList::new(date(), vec![entry(1, Segment::Set(1), "sand")]);
    assert_ne!(a.fingerprint(), c.fingerprint());
  }
}
