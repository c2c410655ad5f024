//! SQL schema for the Encore SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tours (
    tour_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'future'  -- 'future' | 'active' | 'completed' | 'closed'
);

CREATE TABLE IF NOT EXISTS shows (
    show_id              TEXT PRIMARY KEY,
    tour_id              TEXT NOT NULL REFERENCES tours(tour_id),
    show_date            TEXT NOT NULL,   -- YYYY-MM-DD; a calendar day, no time part
    venue                TEXT NOT NULL,
    city                 TEXT NOT NULL,
    region               TEXT,
    country              TEXT NOT NULL,
    timezone             TEXT,            -- IANA identifier
    is_complete          INTEGER NOT NULL DEFAULT 0,
    completion_signalled INTEGER NOT NULL DEFAULT 0,  -- manual completion signal
    setlist_json         TEXT,            -- last fetched SetSongList
    setlist_fetched_at   TEXT,
    lock_at              TEXT,            -- cached lock instant
    last_scored_at       TEXT
);

CREATE TABLE IF NOT EXISTS songs (
    song_id      TEXT PRIMARY KEY,
    slug         TEXT NOT NULL UNIQUE,  -- normalized; all matching uses this
    name         TEXT NOT NULL,
    artist       TEXT NOT NULL,
    times_played INTEGER NOT NULL DEFAULT 0,
    gap          INTEGER NOT NULL DEFAULT 0,
    last_played  TEXT
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id        TEXT PRIMARY KEY,
    user_id              TEXT NOT NULL,
    show_id              TEXT NOT NULL REFERENCES shows(show_id),
    points               INTEGER NOT NULL DEFAULT 0,
    is_scored            INTEGER NOT NULL DEFAULT 0,
    last_seen_song_count INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL,
    UNIQUE (user_id, show_id)
);

CREATE TABLE IF NOT EXISTS picks (
    pick_id       TEXT PRIMARY KEY,
    submission_id TEXT NOT NULL REFERENCES submissions(submission_id) ON DELETE CASCADE,
    slot          INTEGER NOT NULL,
    song_slug     TEXT NOT NULL REFERENCES songs(slug),
    category      TEXT NOT NULL,   -- 'opener' | 'encore' | 'general'
    outcome       TEXT,            -- NULL = unscored | 'not_played' | 'played'
    points_earned INTEGER NOT NULL DEFAULT 0,
    UNIQUE (submission_id, slot)
);

CREATE TABLE IF NOT EXISTS achievements (
    slug     TEXT PRIMARY KEY,
    name     TEXT NOT NULL,
    icon     TEXT NOT NULL,
    category TEXT NOT NULL
);

-- One row per held badge. It mirrors the earliest of its remaining sources.
CREATE TABLE IF NOT EXISTS user_achievements (
    user_id          TEXT NOT NULL,
    achievement_slug TEXT NOT NULL REFERENCES achievements(slug),
    earned_at        TEXT NOT NULL,
    source_show_id   TEXT,
    metadata_json    TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (user_id, achievement_slug)
);

-- Every show whose scoring qualified a user for a badge. A show reset drops
-- its sources; the badge goes only with its last source.
CREATE TABLE IF NOT EXISTS award_sources (
    user_id          TEXT NOT NULL,
    achievement_slug TEXT NOT NULL REFERENCES achievements(slug),
    show_id          TEXT NOT NULL,
    earned_at        TEXT NOT NULL,
    metadata_json    TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (user_id, achievement_slug, show_id)
);

CREATE TABLE IF NOT EXISTS tour_podiums (
    tour_id     TEXT NOT NULL REFERENCES tours(tour_id),
    user_id     TEXT NOT NULL,
    rank        INTEGER NOT NULL,
    points      INTEGER NOT NULL,
    submissions INTEGER NOT NULL,
    PRIMARY KEY (tour_id, user_id)
);

CREATE INDEX IF NOT EXISTS tours_status_idx       ON tours(status);
CREATE INDEX IF NOT EXISTS shows_tour_idx         ON shows(tour_id, show_date);
CREATE INDEX IF NOT EXISTS submissions_show_idx   ON submissions(show_id);
CREATE INDEX IF NOT EXISTS awards_source_show_idx ON user_achievements(source_show_id);
CREATE INDEX IF NOT EXISTS award_sources_show_idx ON award_sources(show_id);

PRAGMA user_version = 1;
";
