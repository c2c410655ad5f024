//! [`SqliteStore`], the SQLite implementation of [`ScoringStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use encore_core::{
  achievement::{Achievement, AchievementRule, UserAchievement},
  setlist::SetSongList,
  show::Show,
  song::{Song, normalize_slug},
  store::{ResetSummary, ScoringStore},
  submission::{NewPick, Pick, Submission, SubmissionScore},
  tour::{Standing, Tour, TourStatus, rank_standings},
};

use crate::{
  Error, Result,
  encode::{
    RawPick, RawShow, RawSong, RawStanding, RawSubmission, RawTour, RawUserAchievement,
    decode_dt, decode_uuid, encode_category, encode_date, encode_dt, encode_outcome,
    encode_setlist, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SHOW_COLUMNS: &str = "show_id, tour_id, show_date, venue, city, region, country, timezone,
   is_complete, completion_signalled, setlist_json, setlist_fetched_at, lock_at, last_scored_at";

const SUBMISSION_COLUMNS: &str =
  "submission_id, user_id, show_id, points, is_scored, last_seen_song_count, created_at";

const SONG_COLUMNS: &str = "song_id, name, slug, artist, times_played, gap, last_played";

fn tour_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTour> {
  Ok(RawTour {
    tour_id:    row.get(0)?,
    name:       row.get(1)?,
    start_date: row.get(2)?,
    end_date:   row.get(3)?,
    status:     row.get(4)?,
  })
}

fn show_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawShow> {
  Ok(RawShow {
    show_id:              row.get(0)?,
    tour_id:              row.get(1)?,
    show_date:            row.get(2)?,
    venue:                row.get(3)?,
    city:                 row.get(4)?,
    region:               row.get(5)?,
    country:              row.get(6)?,
    timezone:             row.get(7)?,
    is_complete:          row.get(8)?,
    completion_signalled: row.get(9)?,
    setlist_json:         row.get(10)?,
    setlist_fetched_at:   row.get(11)?,
    lock_at:              row.get(12)?,
    last_scored_at:       row.get(13)?,
  })
}

fn song_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSong> {
  Ok(RawSong {
    song_id:      row.get(0)?,
    name:         row.get(1)?,
    slug:         row.get(2)?,
    artist:       row.get(3)?,
    times_played: row.get(4)?,
    gap:          row.get(5)?,
    last_played:  row.get(6)?,
  })
}

fn submission_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubmission> {
  Ok(RawSubmission {
    submission_id:        row.get(0)?,
    user_id:              row.get(1)?,
    show_id:              row.get(2)?,
    points:               row.get(3)?,
    is_scored:            row.get(4)?,
    last_seen_song_count: row.get(5)?,
    created_at:           row.get(6)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Encore scoring store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests and dry runs.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Create tables and seed the achievement catalog.
  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    for rule in AchievementRule::all() {
      self.put_achievement(rule.catalog_entry()).await?;
    }
    Ok(())
  }

  async fn put_achievement(&self, a: Achievement) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO achievements (slug, name, icon, category) VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(slug) DO UPDATE SET
             name = excluded.name, icon = excluded.icon, category = excluded.category",
          rusqlite::params![a.slug, a.name, a.icon, a.category],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_shows(&self, sql: String, arg: String) -> Result<Vec<Show>> {
    let raws: Vec<RawShow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![arg], show_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawShow::into_show).collect()
  }

  async fn query_submissions(
    &self,
    where_clause: &'static str,
    args: Vec<String>,
  ) -> Result<Vec<Submission>> {
    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE {where_clause}
           ORDER BY created_at, submission_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), submission_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn update_show(
    &self,
    show_id: Uuid,
    sql: &'static str,
    args: Vec<Option<String>>,
  ) -> Result<()> {
    let id_str = encode_uuid(show_id);
    let changed = self
      .conn
      .call(move |conn| {
        let mut params: Vec<Option<String>> = vec![Some(id_str)];
        params.extend(args);
        Ok(conn.execute(sql, rusqlite::params_from_iter(params.iter()))?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::ShowNotFound(show_id));
    }
    Ok(())
  }
}

// ─── ScoringStore impl ───────────────────────────────────────────────────────

impl ScoringStore for SqliteStore {
  type Error = Error;

  // ── Tours ─────────────────────────────────────────────────────────────────

  async fn count_active_tours(&self) -> Result<u64> {
    let status = encode_status(TourStatus::Active);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM tours WHERE status = ?1",
          rusqlite::params![status],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn upsert_tour(&self, tour: Tour) -> Result<()> {
    let id_str = encode_uuid(tour.tour_id);
    let start = encode_date(tour.start_date);
    let end = encode_date(tour.end_date);
    let status = encode_status(tour.status);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tours (tour_id, name, start_date, end_date, status)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(tour_id) DO UPDATE SET
             name = excluded.name, start_date = excluded.start_date,
             end_date = excluded.end_date, status = excluded.status",
          rusqlite::params![id_str, tour.name, start, end, status],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_tour(&self, tour_id: Uuid) -> Result<Option<Tour>> {
    let id_str = encode_uuid(tour_id);
    let raw: Option<RawTour> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT tour_id, name, start_date, end_date, status FROM tours WHERE tour_id = ?1",
              rusqlite::params![id_str],
              tour_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTour::into_tour).transpose()
  }

  async fn list_tours(&self) -> Result<Vec<Tour>> {
    let raws: Vec<RawTour> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT tour_id, name, start_date, end_date, status FROM tours
           ORDER BY start_date, name",
        )?;
        let rows = stmt
          .query_map([], tour_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawTour::into_tour).collect()
  }

  async fn set_tour_status(&self, tour_id: Uuid, status: TourStatus) -> Result<()> {
    let id_str = encode_uuid(tour_id);
    let status = encode_status(status);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tours SET status = ?2 WHERE tour_id = ?1",
          rusqlite::params![id_str, status],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::TourNotFound(tour_id));
    }
    Ok(())
  }

  async fn tour_standings(&self, tour_id: Uuid) -> Result<Vec<Standing>> {
    let id_str = encode_uuid(tour_id);
    let rows: Vec<(String, i64, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.user_id, SUM(s.points), COUNT(*)
           FROM submissions s
           JOIN shows sh ON sh.show_id = s.show_id
           WHERE sh.tour_id = ?1 AND s.is_scored = 1
           GROUP BY s.user_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let totals = rows
      .into_iter()
      .map(|(user, points, count)| {
        let submissions = u32::try_from(count)
          .map_err(|_| Error::Parse(format!("submission count out of range: {count}")))?;
        Ok((decode_uuid(&user)?, points, submissions))
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(rank_standings(totals))
  }

  async fn replace_podium(&self, tour_id: Uuid, podium: Vec<Standing>) -> Result<()> {
    let id_str = encode_uuid(tour_id);
    let rows: Vec<(String, i64, i64, i64)> = podium
      .into_iter()
      .map(|s| (encode_uuid(s.user_id), i64::from(s.rank), s.points, i64::from(s.submissions)))
      .collect();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tour_podiums WHERE tour_id = ?1", rusqlite::params![id_str])?;
        for (user, rank, points, submissions) in &rows {
          tx.execute(
            "INSERT INTO tour_podiums (tour_id, user_id, rank, points, submissions)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id_str, user, rank, points, submissions],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_podium(&self, tour_id: Uuid) -> Result<Vec<Standing>> {
    let id_str = encode_uuid(tour_id);
    let raws: Vec<RawStanding> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT rank, user_id, points, submissions FROM tour_podiums
           WHERE tour_id = ?1 ORDER BY rank, user_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |r| {
            Ok(RawStanding {
              rank:        r.get(0)?,
              user_id:     r.get(1)?,
              points:      r.get(2)?,
              submissions: r.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawStanding::into_standing).collect()
  }

  // ── Shows ─────────────────────────────────────────────────────────────────

  async fn upsert_show(&self, show: Show) -> Result<()> {
    let id_str = encode_uuid(show.show_id);
    let tour_str = encode_uuid(show.tour_id);
    let date = encode_date(show.show_date.as_naive());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shows (show_id, tour_id, show_date, venue, city, region, country, timezone)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT(show_id) DO UPDATE SET
             tour_id = excluded.tour_id, show_date = excluded.show_date,
             venue = excluded.venue, city = excluded.city, region = excluded.region,
             country = excluded.country, timezone = excluded.timezone",
          rusqlite::params![
            id_str,
            tour_str,
            date,
            show.venue,
            show.city,
            show.region,
            show.country,
            show.timezone,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_show(&self, show_id: Uuid) -> Result<Option<Show>> {
    let id_str = encode_uuid(show_id);
    let raw: Option<RawShow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SHOW_COLUMNS} FROM shows WHERE show_id = ?1"),
              rusqlite::params![id_str],
              show_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawShow::into_show).transpose()
  }

  async fn list_active_shows(&self) -> Result<Vec<Show>> {
    let sql = format!(
      "SELECT {} FROM shows s JOIN tours t ON t.tour_id = s.tour_id
       WHERE t.status = ?1 ORDER BY s.show_date, s.show_id",
      SHOW_COLUMNS
        .split(',')
        .map(|c| format!("s.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
    );
    self.query_shows(sql, encode_status(TourStatus::Active)).await
  }

  async fn list_shows(&self, tour_id: Uuid) -> Result<Vec<Show>> {
    let sql = format!(
      "SELECT {SHOW_COLUMNS} FROM shows WHERE tour_id = ?1 ORDER BY show_date, show_id"
    );
    self.query_shows(sql, encode_uuid(tour_id)).await
  }

  async fn cache_setlist(
    &self,
    show_id: Uuid,
    setlist: SetSongList,
    fetched_at: DateTime<Utc>,
  ) -> Result<()> {
    let json = encode_setlist(&setlist)?;
    self
      .update_show(
        show_id,
        "UPDATE shows SET setlist_json = ?2, setlist_fetched_at = ?3 WHERE show_id = ?1",
        vec![Some(json), Some(encode_dt(fetched_at))],
      )
      .await
  }

  async fn cache_lock_instant(&self, show_id: Uuid, lock_at: DateTime<Utc>) -> Result<()> {
    self
      .update_show(
        show_id,
        "UPDATE shows SET lock_at = ?2 WHERE show_id = ?1",
        vec![Some(encode_dt(lock_at))],
      )
      .await
  }

  async fn mark_show_scored(
    &self,
    show_id: Uuid,
    complete: bool,
    scored_at: DateTime<Utc>,
  ) -> Result<()> {
    let flag = if complete { "1" } else { "0" };
    self
      .update_show(
        show_id,
        "UPDATE shows SET is_complete = MAX(is_complete, CAST(?2 AS INTEGER)), last_scored_at = ?3
         WHERE show_id = ?1",
        vec![Some(flag.to_owned()), Some(encode_dt(scored_at))],
      )
      .await
  }

  async fn signal_completion(&self, show_id: Uuid) -> Result<()> {
    self
      .update_show(
        show_id,
        "UPDATE shows SET completion_signalled = 1 WHERE show_id = ?1",
        vec![],
      )
      .await
  }

  async fn reset_show(&self, show_id: Uuid) -> Result<ResetSummary> {
    let id_str = encode_uuid(show_id);
    let summary: Option<ResetSummary> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM shows WHERE show_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let picks_cleared = tx.execute(
          "UPDATE picks SET outcome = NULL, points_earned = 0
           WHERE submission_id IN (SELECT submission_id FROM submissions WHERE show_id = ?1)
             AND (outcome IS NOT NULL OR points_earned != 0)",
          rusqlite::params![id_str],
        )?;
        let submissions_cleared = tx.execute(
          "UPDATE submissions SET points = 0, is_scored = 0, last_seen_song_count = 0
           WHERE show_id = ?1
             AND (points != 0 OR is_scored != 0 OR last_seen_song_count != 0)",
          rusqlite::params![id_str],
        )?;
        tx.execute("DELETE FROM award_sources WHERE show_id = ?1", rusqlite::params![id_str])?;
        // Badges left without any source go; the rest fall back to their
        // earliest remaining source.
        let awards_removed = tx.execute(
          "DELETE FROM user_achievements
           WHERE source_show_id = ?1
             AND NOT EXISTS (
               SELECT 1 FROM award_sources s
               WHERE s.user_id = user_achievements.user_id
                 AND s.achievement_slug = user_achievements.achievement_slug)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "UPDATE user_achievements
           SET (source_show_id, earned_at, metadata_json) = (
             SELECT s.show_id, s.earned_at, s.metadata_json FROM award_sources s
             WHERE s.user_id = user_achievements.user_id
               AND s.achievement_slug = user_achievements.achievement_slug
             ORDER BY s.earned_at, s.show_id LIMIT 1)
           WHERE source_show_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "UPDATE shows SET setlist_json = NULL, setlist_fetched_at = NULL,
             is_complete = 0, completion_signalled = 0, last_scored_at = NULL
           WHERE show_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;

        Ok(Some(ResetSummary {
          submissions_cleared: submissions_cleared as u64,
          picks_cleared:       picks_cleared as u64,
          awards_removed:      awards_removed as u64,
        }))
      })
      .await?;
    summary.ok_or(Error::ShowNotFound(show_id))
  }

  // ── Songs ─────────────────────────────────────────────────────────────────

  async fn upsert_song(&self, song: Song) -> Result<()> {
    let id_str = encode_uuid(song.song_id);
    let slug = normalize_slug(&song.slug);
    let last_played = song.last_played.map(encode_date);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO songs (song_id, slug, name, artist, times_played, gap, last_played)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(slug) DO UPDATE SET
             name = excluded.name, artist = excluded.artist,
             times_played = excluded.times_played, gap = excluded.gap,
             last_played = excluded.last_played",
          rusqlite::params![
            id_str,
            slug,
            song.name,
            song.artist,
            song.times_played,
            song.gap,
            last_played,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn songs_by_slugs(&self, slugs: Vec<String>) -> Result<Vec<Song>> {
    let mut slugs: Vec<String> = slugs.iter().map(|s| normalize_slug(s)).collect();
    slugs.sort();
    slugs.dedup();

    let raws: Vec<RawSong> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE slug = ?1"))?;
        let mut out = Vec::with_capacity(slugs.len());
        for slug in &slugs {
          if let Some(raw) = stmt.query_row(rusqlite::params![slug], song_row).optional()? {
            out.push(raw);
          }
        }
        Ok(out)
      })
      .await?;
    raws.into_iter().map(RawSong::into_song).collect()
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn save_submission(
    &self,
    user_id: Uuid,
    show_id: Uuid,
    picks: Vec<NewPick>,
  ) -> Result<Submission> {
    let user_str = encode_uuid(user_id);
    let show_str = encode_uuid(show_id);
    let fresh_id = encode_uuid(Uuid::new_v4());
    let now_str = encode_dt(Utc::now());
    let rows: Vec<(String, String, String)> = picks
      .iter()
      .map(|p| {
        (encode_uuid(Uuid::new_v4()), normalize_slug(&p.song_slug), encode_category(p.category))
      })
      .collect();

    let (sub_id, created_at): (String, String) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<(String, String)> = tx
          .query_row(
            "SELECT submission_id, created_at FROM submissions WHERE user_id = ?1 AND show_id = ?2",
            rusqlite::params![user_str, show_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let (sub_id, created_at) = match existing {
          Some((id, created_at)) => {
            tx.execute(
              "UPDATE submissions SET points = 0, is_scored = 0, last_seen_song_count = 0
               WHERE submission_id = ?1",
              rusqlite::params![id],
            )?;
            tx.execute("DELETE FROM picks WHERE submission_id = ?1", rusqlite::params![id])?;
            (id, created_at)
          }
          None => {
            tx.execute(
              "INSERT INTO submissions (submission_id, user_id, show_id, created_at)
               VALUES (?1, ?2, ?3, ?4)",
              rusqlite::params![fresh_id, user_str, show_str, now_str],
            )?;
            (fresh_id, now_str)
          }
        };

        for (slot, (pick_id, slug, category)) in rows.iter().enumerate() {
          tx.execute(
            "INSERT INTO picks (pick_id, submission_id, slot, song_slug, category)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![pick_id, sub_id, slot as i64, slug, category],
          )?;
        }
        tx.commit()?;
        Ok((sub_id, created_at))
      })
      .await?;

    Ok(Submission {
      submission_id: decode_uuid(&sub_id)?,
      user_id,
      show_id,
      points: 0,
      is_scored: false,
      last_seen_song_count: 0,
      created_at: decode_dt(&created_at)?,
    })
  }

  async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>> {
    Ok(
      self
        .query_submissions("submission_id = ?1", vec![encode_uuid(submission_id)])
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn find_submission(&self, user_id: Uuid, show_id: Uuid) -> Result<Option<Submission>> {
    Ok(
      self
        .query_submissions(
          "user_id = ?1 AND show_id = ?2",
          vec![encode_uuid(user_id), encode_uuid(show_id)],
        )
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn list_submissions(&self, show_id: Uuid) -> Result<Vec<Submission>> {
    self
      .query_submissions("show_id = ?1", vec![encode_uuid(show_id)])
      .await
  }

  async fn get_picks(&self, submission_id: Uuid) -> Result<Vec<Pick>> {
    let id_str = encode_uuid(submission_id);
    let raws: Vec<RawPick> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT pick_id, submission_id, song_slug, category, outcome, points_earned
           FROM picks WHERE submission_id = ?1 ORDER BY slot",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |r| {
            Ok(RawPick {
              pick_id:       r.get(0)?,
              submission_id: r.get(1)?,
              song_slug:     r.get(2)?,
              category:      r.get(3)?,
              outcome:       r.get(4)?,
              points_earned: r.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPick::into_pick).collect()
  }

  async fn apply_score(&self, score: SubmissionScore) -> Result<()> {
    let submission_id = score.submission_id;
    let id_str = encode_uuid(submission_id);
    let picks: Vec<(String, Option<String>, i64)> = score
      .picks
      .iter()
      .map(|p| (encode_uuid(p.pick_id), encode_outcome(p.outcome), p.points_earned))
      .collect();
    let total = score.total;
    let song_count = score.song_count;

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE submissions SET points = ?2, is_scored = 1, last_seen_song_count = ?3
           WHERE submission_id = ?1",
          rusqlite::params![id_str, total, song_count],
        )?;
        if changed == 0 {
          // Dropping the transaction rolls it back.
          return Ok(false);
        }
        for (pick_id, outcome, points) in &picks {
          tx.execute(
            "UPDATE picks SET outcome = ?3, points_earned = ?4
             WHERE pick_id = ?1 AND submission_id = ?2",
            rusqlite::params![pick_id, id_str, outcome, points],
          )?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !applied {
      return Err(Error::SubmissionNotFound(submission_id));
    }
    Ok(())
  }

  // ── Achievements ──────────────────────────────────────────────────────────

  async fn user_achievements(&self, user_id: Uuid) -> Result<Vec<UserAchievement>> {
    let id_str = encode_uuid(user_id);
    let raws: Vec<RawUserAchievement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, achievement_slug, earned_at, source_show_id, metadata_json
           FROM user_achievements WHERE user_id = ?1
           ORDER BY earned_at, achievement_slug",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |r| {
            Ok(RawUserAchievement {
              user_id:          r.get(0)?,
              achievement_slug: r.get(1)?,
              earned_at:        r.get(2)?,
              source_show_id:   r.get(3)?,
              metadata_json:    r.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawUserAchievement::into_award).collect()
  }

  async fn award_achievement(&self, award: UserAchievement) -> Result<bool> {
    let user_str = encode_uuid(award.user_id);
    let earned_at = encode_dt(award.earned_at);
    let source = award.source_show_id.map(encode_uuid);
    let metadata = award.metadata.to_string();
    let slug = award.achievement_slug;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(show) = &source {
          tx.execute(
            "INSERT OR IGNORE INTO award_sources
               (user_id, achievement_slug, show_id, earned_at, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![user_str, slug, show, earned_at, metadata],
          )?;
        }
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO user_achievements
             (user_id, achievement_slug, earned_at, source_show_id, metadata_json)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![user_str, slug, earned_at, source, metadata],
        )?;
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted == 1)
  }
}
