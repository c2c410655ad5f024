//! Engine tests against an in-memory SQLite store and a scripted feed.


use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use encore_core::{
  TransientError,
  achievement::UserAchievement,
  date::ShowDate,
  lock::LockSettings,
  scoring::PointTable,
  setlist::{Segment, SetSongList, SetlistEntry},
  show::Show,
  song::Song,
  source::SetlistSource,
  store::{ResetSummary, ScoringStore},
  submission::{NewPick, Pick, PickCategory, Submission, SubmissionScore},
  tour::{Standing, Tour, TourStatus},
};
use encore_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{RetryPolicy, RetryingStore, ScoringSettings, SubmissionStateManager};

// ─── Scripted feed ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("feed unavailable")]
pub struct FeedDown;

#[derive(Default)]
pub struct FakeFeed {
  setlists: Mutex<HashMap<ShowDate, SetSongList>>,
  down:     AtomicBool,
  started:  AtomicBool,
  fetches:  AtomicUsize,
}

impl FakeFeed {
  pub fn publish(&self, list: SetSongList) {
    self.setlists.lock().unwrap().insert(list.show_date, list);
  }

  pub fn set_down(&self, down: bool) { self.down.store(down, Ordering::SeqCst) }

  pub fn set_started(&self, started: bool) { self.started.store(started, Ordering::SeqCst) }

  pub fn fetches(&self) -> usize { self.fetches.load(Ordering::SeqCst) }
}

impl SetlistSource for FakeFeed {
  type Error = FeedDown;

  async fn fetch_setlist(&self, date: ShowDate) -> Result<Option<SetSongList>, FeedDown> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    if self.down.load(Ordering::SeqCst) {
      return Err(FeedDown);
    }
    Ok(self.setlists.lock().unwrap().get(&date).cloned())
  }

  async fn is_show_started(
    &self,
    _date: ShowDate,
    _timezone: Option<String>,
    _region: Option<String>,
  ) -> Result<bool, FeedDown> {
    if self.down.load(Ordering::SeqCst) {
      return Err(FeedDown);
    }
    Ok(self.started.load(Ordering::SeqCst))
  }
}

// ─── Probing store ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
  #[error(transparent)]
  Inner(#[from] encore_store_sqlite::Error),
  #[error("injected failure (transient: {0})")]
  Injected(bool),
}

impl TransientError for ProbeError {
  fn is_transient(&self) -> bool {
    match self {
      Self::Inner(e) => e.is_transient(),
      Self::Injected(transient) => *transient,
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
  Always,
  /// Fail transiently this many more times, then succeed.
  Transient(u32),
}

/// A [`SqliteStore`] that records every call and fails on request.
pub struct ProbeStore {
  inner:          SqliteStore,
  calls:          Mutex<Vec<&'static str>>,
  failing:        Mutex<HashMap<&'static str, Failure>>,
  failing_scores: Mutex<HashSet<Uuid>>,
}

impl ProbeStore {
  pub async fn new() -> Self {
    Self {
      inner:          SqliteStore::open_in_memory().await.unwrap(),
      calls:          Mutex::default(),
      failing:        Mutex::default(),
      failing_scores: Mutex::default(),
    }
  }

  pub fn calls(&self) -> Vec<&'static str> { self.calls.lock().unwrap().clone() }

  pub fn clear_calls(&self) { self.calls.lock().unwrap().clear() }

  pub fn fail(&self, op: &'static str, failure: Failure) {
    self.failing.lock().unwrap().insert(op, failure);
  }

  pub fn fail_score_of(&self, submission_id: Uuid) {
    self.failing_scores.lock().unwrap().insert(submission_id);
  }

  pub fn heal(&self) {
    self.failing.lock().unwrap().clear();
    self.failing_scores.lock().unwrap().clear();
  }

  fn enter(&self, op: &'static str) -> Result<(), ProbeError> {
    self.calls.lock().unwrap().push(op);
    let mut failing = self.failing.lock().unwrap();
    match failing.get(op).copied() {
      None => Ok(()),
      Some(Failure::Always) => Err(ProbeError::Injected(false)),
      Some(Failure::Transient(0)) => {
        failing.remove(op);
        Ok(())
      }
      Some(Failure::Transient(n)) => {
        failing.insert(op, Failure::Transient(n - 1));
        Err(ProbeError::Injected(true))
      }
    }
  }
}

impl ScoringStore for ProbeStore {
  type Error = ProbeError;

  async fn count_active_tours(&self) -> Result<u64, ProbeError> {
    self.enter("count_active_tours")?;
    Ok(self.inner.count_active_tours().await?)
  }

  async fn upsert_tour(&self, tour: Tour) -> Result<(), ProbeError> {
    self.enter("upsert_tour")?;
    Ok(self.inner.upsert_tour(tour).await?)
  }

  async fn get_tour(&self, tour_id: Uuid) -> Result<Option<Tour>, ProbeError> {
    self.enter("get_tour")?;
    Ok(self.inner.get_tour(tour_id).await?)
  }

  async fn list_tours(&self) -> Result<Vec<Tour>, ProbeError> {
    self.enter("list_tours")?;
    Ok(self.inner.list_tours().await?)
  }

  async fn set_tour_status(&self, tour_id: Uuid, status: TourStatus) -> Result<(), ProbeError> {
    self.enter("set_tour_status")?;
    Ok(self.inner.set_tour_status(tour_id, status).await?)
  }

  async fn tour_standings(&self, tour_id: Uuid) -> Result<Vec<Standing>, ProbeError> {
    self.enter("tour_standings")?;
    Ok(self.inner.tour_standings(tour_id).await?)
  }

  async fn replace_podium(&self, tour_id: Uuid, podium: Vec<Standing>) -> Result<(), ProbeError> {
    self.enter("replace_podium")?;
    Ok(self.inner.replace_podium(tour_id, podium).await?)
  }

  async fn get_podium(&self, tour_id: Uuid) -> Result<Vec<Standing>, ProbeError> {
    self.enter("get_podium")?;
    Ok(self.inner.get_podium(tour_id).await?)
  }

  async fn upsert_show(&self, show: Show) -> Result<(), ProbeError> {
    self.enter("upsert_show")?;
    Ok(self.inner.upsert_show(show).await?)
  }

  async fn get_show(&self, show_id: Uuid) -> Result<Option<Show>, ProbeError> {
    self.enter("get_show")?;
    Ok(self.inner.get_show(show_id).await?)
  }

  async fn list_active_shows(&self) -> Result<Vec<Show>, ProbeError> {
    self.enter("list_active_shows")?;
    Ok(self.inner.list_active_shows().await?)
  }

  async fn list_shows(&self, tour_id: Uuid) -> Result<Vec<Show>, ProbeError> {
    self.enter("list_shows")?;
    Ok(self.inner.list_shows(tour_id).await?)
  }

  async fn cache_setlist(
    &self,
    show_id: Uuid,
    setlist: SetSongList,
    fetched_at: DateTime<Utc>,
  ) -> Result<(), ProbeError> {
    self.enter("cache_setlist")?;
    Ok(self.inner.cache_setlist(show_id, setlist, fetched_at).await?)
  }

  async fn cache_lock_instant(&self, show_id: Uuid, lock_at: DateTime<Utc>) -> Result<(), ProbeError> {
    self.enter("cache_lock_instant")?;
    Ok(self.inner.cache_lock_instant(show_id, lock_at).await?)
  }

  async fn mark_show_scored(
    &self,
    show_id: Uuid,
    complete: bool,
    scored_at: DateTime<Utc>,
  ) -> Result<(), ProbeError> {
    self.enter("mark_show_scored")?;
    Ok(self.inner.mark_show_scored(show_id, complete, scored_at).await?)
  }

  async fn signal_completion(&self, show_id: Uuid) -> Result<(), ProbeError> {
    self.enter("signal_completion")?;
    Ok(self.inner.signal_completion(show_id).await?)
  }

  async fn reset_show(&self, show_id: Uuid) -> Result<ResetSummary, ProbeError> {
    self.enter("reset_show")?;
    Ok(self.inner.reset_show(show_id).await?)
  }

  async fn upsert_song(&self, song: Song) -> Result<(), ProbeError> {
    self.enter("upsert_song")?;
    Ok(self.inner.upsert_song(song).await?)
  }

  async fn songs_by_slugs(&self, slugs: Vec<String>) -> Result<Vec<Song>, ProbeError> {
    self.enter("songs_by_slugs")?;
    Ok(self.inner.songs_by_slugs(slugs).await?)
  }

  async fn save_submission(
    &self,
    user_id: Uuid,
    show_id: Uuid,
    picks: Vec<NewPick>,
  ) -> Result<Submission, ProbeError> {
    self.enter("save_submission")?;
    Ok(self.inner.save_submission(user_id, show_id, picks).await?)
  }

  async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>, ProbeError> {
    self.enter("get_submission")?;
    Ok(self.inner.get_submission(submission_id).await?)
  }

  async fn find_submission(
    &self,
    user_id: Uuid,
    show_id: Uuid,
  ) -> Result<Option<Submission>, ProbeError> {
    self.enter("find_submission")?;
    Ok(self.inner.find_submission(user_id, show_id).await?)
  }

  async fn list_submissions(&self, show_id: Uuid) -> Result<Vec<Submission>, ProbeError> {
    self.enter("list_submissions")?;
    Ok(self.inner.list_submissions(show_id).await?)
  }

  async fn get_picks(&self, submission_id: Uuid) -> Result<Vec<Pick>, ProbeError> {
    self.enter("get_picks")?;
    Ok(self.inner.get_picks(submission_id).await?)
  }

  async fn apply_score(&self, score: SubmissionScore) -> Result<(), ProbeError> {
    self.enter("apply_score")?;
    if self.failing_scores.lock().unwrap().contains(&score.submission_id) {
      return Err(ProbeError::Injected(false));
    }
    Ok(self.inner.apply_score(score).await?)
  }

  async fn user_achievements(&self, user_id: Uuid) -> Result<Vec<UserAchievement>, ProbeError> {
    self.enter("user_achievements")?;
    Ok(self.inner.user_achievements(user_id).await?)
  }

  async fn award_achievement(&self, award: UserAchievement) -> Result<bool, ProbeError> {
    self.enter("award_achievement")?;
    Ok(self.inner.award_achievement(award).await?)
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn table(opener: i64, encore: i64, general: i64) -> PointTable {
  PointTable::new([
    (PickCategory::Opener, opener),
    (PickCategory::Encore, encore),
    (PickCategory::General, general),
  ])
}

pub fn scoring(points: PointTable) -> ScoringSettings {
  ScoringSettings { points, ..ScoringSettings::default() }
}

pub fn show_date() -> ShowDate { ShowDate::from_ymd(2024, 7, 19).unwrap() }

/// 20:00 UTC on show day: picks still open (lock is 23:00 UTC).
pub fn before_lock() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 7, 19, 20, 0, 0).unwrap() }

/// Ninety minutes into the show.
pub fn after_lock() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 7, 20, 0, 30, 0).unwrap() }

/// Past the six hour completion timeout.
pub fn late() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 7, 20, 5, 30, 0).unwrap() }

pub fn picks(opener: &str, encore: &str, general: &[&str]) -> Vec<NewPick> {
  let mut out = vec![
    NewPick::new(opener, PickCategory::Opener),
    NewPick::new(encore, PickCategory::Encore),
  ];
  out.extend(general.iter().map(|s| NewPick::new(*s, PickCategory::General)));
  out
}

pub fn song_names(range: std::ops::Range<usize>) -> Vec<String> {
  range.map(|i| format!("song-{i}")).collect()
}

/// Opener `song-0`, encore `song-1`, general `song-2` to `song-12`.
pub fn default_picks() -> Vec<NewPick> {
  let general = song_names(2..13);
  let general: Vec<&str> = general.iter().map(String::as_str).collect();
  picks("song-0", "song-1", &general)
}

/// `filler-0`, `filler-1`, ...: songs nobody picked.
pub fn fillers(n: usize) -> Vec<String> { (0..n).map(|i| format!("filler-{i}")).collect() }

pub fn setlist(set1: &[&str], encore: &[&str]) -> SetSongList {
  let entries = set1
    .iter()
    .map(|s| (Segment::Set(1), *s))
    .chain(encore.iter().map(|s| (Segment::Encore(1), *s)))
    .enumerate()
    .map(|(i, (segment, slug))| SetlistEntry {
      position: i as u16 + 1,
      segment,
      slug: slug.into(),
      song: slug.into(),
    })
    .collect();
  SetSongList::new(show_date(), entries)
}

pub type Store = RetryingStore<ProbeStore>;

pub struct World {
  pub store:   Arc<Store>,
  pub feed:    Arc<FakeFeed>,
  pub manager: SubmissionStateManager<Store, FakeFeed>,
  pub tour_id: Uuid,
  pub show:    Show,
}

impl World {
  /// An active tour with one show in New York on 2024-07-19, and a catalog
  /// of `song-0` to `song-19` plus `dog-log`, a song unplayed for 150 shows.
  pub async fn new(points: PointTable) -> Self {
    Self::with_show(points, |show| show).await
  }

  pub async fn with_show(points: PointTable, edit: impl FnOnce(Show) -> Show) -> Self {
    let store = Arc::new(RetryingStore::new(ProbeStore::new().await, RetryPolicy {
      max_attempts: 3,
      backoff_ms:   1,
    }));
    let tour = Tour {
      tour_id:    Uuid::new_v4(),
      name:       "Summer 2024".into(),
      start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
      end_date:   NaiveDate::from_ymd_opt(2024, 8, 31).unwrap(),
      status:     TourStatus::Active,
    };
    store.upsert_tour(tour.clone()).await.unwrap();

    let show = edit(Show::scheduled(
      tour.tour_id,
      show_date(),
      "Madison Square Garden",
      "New York",
      Some("NY".into()),
      "USA",
      Some("America/New_York".into()),
    ));
    store.upsert_show(show.clone()).await.unwrap();

    for slug in song_names(0..20) {
      store.upsert_song(catalog_song(&slug, 3)).await.unwrap();
    }
    store.upsert_song(catalog_song("dog-log", 150)).await.unwrap();

    let feed = Arc::new(FakeFeed::default());
    let manager = SubmissionStateManager::new(
      Arc::clone(&store),
      Arc::clone(&feed),
      LockSettings::default(),
      scoring(points),
    );
    store.inner().clear_calls();
    Self { store, feed, manager, tour_id: tour.tour_id, show }
  }

  pub async fn submit(&self, user_id: Uuid, picks: Vec<NewPick>) -> Submission {
    self
      .manager
      .submit_picks_at(user_id, self.show.show_id, picks, before_lock())
      .await
      .unwrap()
  }

  pub fn probe(&self) -> &ProbeStore { self.store.inner() }

  pub async fn show(&self) -> Show { self.store.get_show(self.show.show_id).await.unwrap().unwrap() }

  /// Every submission of the show with its picks.
  pub async fn snapshot(&self) -> Vec<(Submission, Vec<Pick>)> {
    let mut out = Vec::new();
    for sub in self.store.list_submissions(self.show.show_id).await.unwrap() {
      let picks = self.store.get_picks(sub.submission_id).await.unwrap();
      out.push((sub, picks));
    }
    out
  }
}

pub fn catalog_song(slug: &str, gap: u32) -> Song {
  Song {
    song_id: Uuid::new_v4(),
    name: slug.into(),
    slug: slug.into(),
    artist: "phish".into(),
    times_played: 10,
    gap,
    last_played: None,
  }
}
