//! Loading a tour schedule and song catalog from a JSON file.
//!
//! ```json
//! {
//!   "tour":  { "tour_id": "…", "name": "Summer 2024", "start_date": "2024-07-01",
//!              "end_date": "2024-08-31", "status": "active" },
//!   "shows": [{ "show_id": "…", "show_date": "2024-07-19", "venue": "MSG",
//!               "city": "New York", "region": "NY", "country": "USA",
//!               "timezone": "America/New_York" }],
//!   "songs": [{ "slug": "tweezer", "name": "Tweezer", "gap": 3 }]
//! }
//! ```
//!
//! Every record is upserted, so importing the same file twice is harmless
//! and re-importing never touches scoring state.

use anyhow::Context as _;
use chrono::NaiveDate;
use encore_core::{date::ShowDate, show::Show, song::Song, store::ScoringStore, tour::Tour};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct Schedule {
  pub tour:  Tour,
  #[serde(default)]
  pub shows: Vec<ScheduledShow>,
  #[serde(default)]
  pub songs: Vec<CatalogSong>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduledShow {
  pub show_id:   Uuid,
  pub show_date: ShowDate,
  pub venue:     String,
  pub city:      String,
  pub region:    Option<String>,
  pub country:   String,
  pub timezone:  Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogSong {
  pub slug:         String,
  pub name:         String,
  #[serde(default)]
  pub artist:       String,
  #[serde(default)]
  pub times_played: u32,
  #[serde(default)]
  pub gap:          u32,
  pub last_played:  Option<NaiveDate>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub shows: usize,
  pub songs: usize,
}

pub fn parse(json: &str) -> anyhow::Result<Schedule> {
  serde_json::from_str(json).context("invalid schedule file")
}

pub async fn apply<S: ScoringStore>(store: &S, schedule: Schedule) -> anyhow::Result<ImportSummary> {
  let tour = schedule.tour;
  let tour_id = tour.tour_id;
  let (start, end) = (tour.start_date, tour.end_date);
  store.upsert_tour(tour).await.context("failed to store tour")?;

  let mut summary = ImportSummary::default();
  for s in schedule.shows {
    let date = s.show_date.as_naive();
    if date < start || date > end {
      tracing::warn!(show_id = %s.show_id, show_date = %s.show_date, "show falls outside its tour dates");
    }
    let mut show =
      Show::scheduled(tour_id, s.show_date, s.venue, s.city, s.region, s.country, s.timezone);
    show.show_id = s.show_id;
    store
      .upsert_show(show)
      .await
      .with_context(|| format!("failed to store show {}", s.show_id))?;
    summary.shows += 1;
  }

  for s in schedule.songs {
    let slug = s.slug.clone();
    store
      .upsert_song(Song {
        song_id:      Uuid::new_v4(),
        name:         s.name,
        slug:         s.slug,
        artist:       s.artist,
        times_played: s.times_played,
        gap:          s.gap,
        last_played:  s.last_played,
      })
      .await
      .with_context(|| format!("failed to store song {slug}"))?;
    summary.songs += 1;
  }

  tracing::info!(%tour_id, shows = summary.shows, songs = summary.songs, "schedule imported");
  Ok(summary)
}

#[cfg(test)]
mod tests {
  use encore_core::tour::TourStatus;
  use encore_store_sqlite::SqliteStore;

  use super::*;

  const SCHEDULE: &str = r#"{
    "tour": {
      "tour_id": "5b0c1c9e-7f55-4a53-9a3b-1f2f4d6a8e01",
      "name": "Summer 2024",
      "start_date": "2024-07-01",
      "end_date": "2024-08-31",
      "status": "active"
    },
    "shows": [{
      "show_id": "0f6c2f0a-94a5-4bd4-8f44-4a3de7f6b2c9",
      "show_date": "2024-07-19",
      "venue": "Madison Square Garden",
      "city": "New York",
      "region": "NY",
      "country": "USA",
      "timezone": null
    }],
    "songs": [
      { "slug": "Tweezer", "name": "Tweezer", "gap": 3 },
      { "slug": "fuego", "name": "Fuego", "artist": "phish", "times_played": 120 }
    ]
  }"#;

  #[tokio::test]
  async fn import_is_repeatable() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let first = apply(&store, parse(SCHEDULE).unwrap()).await.unwrap();
    assert_eq!(first, ImportSummary { shows: 1, songs: 2 });
    apply(&store, parse(SCHEDULE).unwrap()).await.unwrap();

    let tours = store.list_tours().await.unwrap();
    assert_eq!(tours.len(), 1);
    assert_eq!(tours[0].status, TourStatus::Active);

    let shows = store.list_shows(tours[0].tour_id).await.unwrap();
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].show_date.to_string(), "2024-07-19");
    assert_eq!(shows[0].region.as_deref(), Some("NY"));

    let songs = store
      .songs_by_slugs(vec!["tweezer".into(), "fuego".into()])
      .await
      .unwrap();
    assert_eq!(songs.len(), 2);
  }

  #[test]
  fn missing_tour_is_rejected() {
    assert!(parse(r#"{ "shows": [] }"#).is_err());
  }
}
