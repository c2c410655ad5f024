use std::{convert::Infallible, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::IntoResponse,
};
use chrono::{NaiveDate, TimeDelta, Utc};
use encore_core::{
  date::ShowDate,
  lock::LockSettings,
  scoring::PointTable,
  setlist::{Segment, SetSongList, SetlistEntry},
  show::Show,
  song::Song,
  source::SetlistSource,
  store::ScoringStore,
  submission::PickCategory,
  tour::{Tour, TourStatus},
};
use encore_engine::{ScoringSettings, SubmissionStateManager};
use encore_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiError, api_router};

/// Serves one fixed setlist for every date.
struct StaticFeed(Option<SetSongList>);

impl SetlistSource for StaticFeed {
  type Error = Infallible;

  async fn fetch_setlist(&self, _date: ShowDate) -> Result<Option<SetSongList>, Infallible> {
    Ok(self.0.clone())
  }

  async fn is_show_started(
    &self,
    _date: ShowDate,
    _timezone: Option<String>,
    _region: Option<String>,
  ) -> Result<bool, Infallible> {
    Ok(false)
  }
}

struct Fixture {
  router:  Router,
  store:   Arc<SqliteStore>,
  tour_id: Uuid,
  show_id: Uuid,
}

/// An active tour with one New York show a month from now, songs `song-0`
/// to `song-12`, and a feed whose setlist opens with `song-0`.
async fn fixture(test_tools_enabled: bool) -> Fixture {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let tour = Tour {
    tour_id:    Uuid::new_v4(),
    name:       "Summer".into(),
    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    end_date:   NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
    status:     TourStatus::Active,
  };
  store.upsert_tour(tour.clone()).await.unwrap();

  let date = ShowDate::new((Utc::now() + TimeDelta::days(30)).date_naive());
  let show = Show::scheduled(
    tour.tour_id,
    date,
    "Madison Square Garden",
    "New York",
    Some("NY".into()),
    "USA",
    Some("America/New_York".into()),
  );
  store.upsert_show(show.clone()).await.unwrap();

  for i in 0..13 {
    let slug = format!("song-{i}");
    store
      .upsert_song(Song {
        song_id: Uuid::new_v4(),
        name: slug.clone(),
        slug,
        artist: "phish".into(),
        times_played: 1,
        gap: 1,
        last_played: None,
      })
      .await
      .unwrap();
  }

  let entries = (0..13u16)
    .map(|i| SetlistEntry {
      position: i + 1,
      segment:  if i == 12 { Segment::Encore(1) } else { Segment::Set(1) },
      slug:     if i == 0 { "song-0".into() } else { format!("filler-{i}") },
      song:     format!("Song {i}"),
    })
    .collect();
  let feed = Arc::new(StaticFeed(Some(SetSongList::new(date, entries))));

  let points = PointTable::new([
    (PickCategory::Opener, 10),
    (PickCategory::Encore, 10),
    (PickCategory::General, 3),
  ]);
  let manager = SubmissionStateManager::new(
    Arc::clone(&store),
    feed,
    LockSettings::default(),
    ScoringSettings { points, ..ScoringSettings::default() },
  );

  Fixture {
    router: api_router(manager, test_tools_enabled),
    store,
    tour_id: tour.tour_id,
    show_id: show.show_id,
  }
}

fn picks_json(general_first: usize) -> Value {
  let mut picks = vec![
    json!({ "song_slug": "song-0", "category": "opener" }),
    json!({ "song_slug": "song-1", "category": "encore" }),
  ];
  picks.extend(
    (general_first..general_first + 11)
      .map(|i| json!({ "song_slug": format!("song-{i}"), "category": "general" })),
  );
  Value::Array(picks)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn submit(f: &Fixture, user_id: Uuid) -> (StatusCode, Value) {
  call(
    &f.router,
    "POST",
    &format!("/shows/{}/picks", f.show_id),
    Some(json!({ "user_id": user_id, "picks": picks_json(2) })),
  )
  .await
}

// ── Shows ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_show_is_404_with_json_error() {
  let f = fixture(false).await;
  let (status, body) = call(&f.router, "GET", &format!("/shows/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn get_show_returns_schedule() {
  let f = fixture(false).await;
  let (status, body) = call(&f.router, "GET", &format!("/shows/{}", f.show_id), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["venue"], "Madison Square Garden");
  assert_eq!(body["is_complete"], false);
}

#[tokio::test]
async fn picks_are_accepted_before_the_lock() {
  let f = fixture(false).await;
  let (status, body) = submit(&f, Uuid::new_v4()).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["is_scored"], false);
}

#[tokio::test]
async fn unknown_songs_are_unprocessable() {
  let f = fixture(false).await;
  let (status, body) = call(
    &f.router,
    "POST",
    &format!("/shows/{}/picks", f.show_id),
    Some(json!({ "user_id": Uuid::new_v4(), "picks": picks_json(3) })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("song-13"));
}

#[tokio::test]
async fn manual_score_completes_the_show() {
  let f = fixture(false).await;
  submit(&f, Uuid::new_v4()).await;

  let (status, body) = call(
    &f.router,
    "POST",
    &format!("/shows/{}/score", f.show_id),
    Some(json!({ "mark_complete": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["newly_completed"], true);
  assert_eq!(body["submissions_updated"], 1);
  assert!(f.store.get_show(f.show_id).await.unwrap().unwrap().is_complete);

  let (status, body) = call(&f.router, "POST", &format!("/shows/{}/reset", f.show_id), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["submissions_cleared"], 1);
  assert_eq!(body["picks_cleared"], 13);
  assert!(!f.store.get_show(f.show_id).await.unwrap().unwrap().is_complete);
}

#[tokio::test]
async fn open_show_is_skipped_by_a_pass() {
  let f = fixture(false).await;
  let (status, body) = call(&f.router, "POST", "/passes", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["shows"][0]["skipped"]["reason"], "not_locked");
}

// ── Test tools ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_score_is_forbidden_when_disabled() {
  let f = fixture(false).await;
  let user = Uuid::new_v4();
  submit(&f, user).await;

  let (status, _) = call(
    &f.router,
    "POST",
    &format!("/shows/{}/test-score", f.show_id),
    Some(json!({ "user_id": user })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_score_ignores_the_lock_when_enabled() {
  let f = fixture(true).await;
  let user = Uuid::new_v4();
  submit(&f, user).await;

  let (status, body) = call(
    &f.router,
    "POST",
    &format!("/shows/{}/test-score", f.show_id),
    Some(json!({ "user_id": user })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["total"], 10);
  assert_eq!(body["songs_seen"], 13);

  let (status, _) = call(
    &f.router,
    "POST",
    &format!("/shows/{}/test-score", f.show_id),
    Some(json!({ "user_id": Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Tours ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reactivation_without_confirmation_conflicts() {
  let f = fixture(false).await;
  let uri = format!("/tours/{}/status", f.tour_id);

  let (status, body) = call(&f.router, "POST", &uri, Some(json!({ "status": "completed" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "completed");

  let (status, _) = call(&f.router, "POST", &uri, Some(json!({ "status": "active" }))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) =
    call(&f.router, "POST", &uri, Some(json!({ "status": "active", "confirm": true }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn future_tour_standings_are_not_found() {
  let f = fixture(false).await;
  let future = Tour {
    tour_id:    Uuid::new_v4(),
    name:       "Next year".into(),
    start_date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
    end_date:   NaiveDate::from_ymd_opt(2099, 2, 1).unwrap(),
    status:     TourStatus::Future,
  };
  f.store.upsert_tour(future.clone()).await.unwrap();

  let (status, _) =
    call(&f.router, "GET", &format!("/tours/{}/standings", future.tour_id), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = call(&f.router, "GET", &format!("/tours/{}/standings", f.tour_id), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));

  let (status, body) = call(&f.router, "GET", "/tours", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 2);
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_failures_hide_their_details() {
  let err = encore_engine::Error::store(std::io::Error::other("disk I/O error at /var/lib/encore.db"));
  let resp = ApiError::from(err).into_response();
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body, json!({ "error": "store unavailable" }));
}
