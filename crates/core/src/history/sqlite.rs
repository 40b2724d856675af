//! SQLite-backed series catalog and download history.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{DownloadHistory, HistoryError, SeriesCatalog};
use crate::series::{Episode, EpisodeId, IdentifiedBy, LatestDownload, Release, Series};

/// SQLite-backed history store.
///
/// Holds series definitions, which runs track which series, and the
/// episodes/releases seen so far.
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HistoryError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS series (
                name TEXT PRIMARY KEY,
                identified_by TEXT NOT NULL DEFAULT 'episode',
                begin_season INTEGER CHECK (begin_season IS NULL OR begin_season BETWEEN 1 AND 99999),
                begin_number INTEGER CHECK (begin_number IS NULL OR begin_number BETWEEN 1 AND 99999)
            );

            -- Which runs (tasks) track which series
            CREATE TABLE IF NOT EXISTS series_runs (
                run_id TEXT NOT NULL,
                series_name TEXT NOT NULL REFERENCES series(name) ON DELETE CASCADE,
                PRIMARY KEY (run_id, series_name)
            );

            CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                series_name TEXT NOT NULL REFERENCES series(name) ON DELETE CASCADE,
                season INTEGER NOT NULL CHECK (season BETWEEN 1 AND 99999),
                number INTEGER NOT NULL CHECK (number BETWEEN 1 AND 99999),
                UNIQUE(series_name, season, number)
            );

            CREATE INDEX IF NOT EXISTS idx_episodes_series_season ON episodes(series_name, season);

            CREATE TABLE IF NOT EXISTS releases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                episode_id INTEGER NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                downloaded INTEGER NOT NULL DEFAULT 0,
                first_seen_at TEXT NOT NULL,
                UNIQUE(episode_id, title)
            );

            CREATE INDEX IF NOT EXISTS idx_releases_episode ON releases(episode_id);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|e| HistoryError::Database(format!("lock poisoned: {}", e)))
    }

    /// Insert or update a series definition.
    pub fn upsert_series(&self, series: &Series) -> Result<(), HistoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO series (name, identified_by, begin_season, begin_number)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                identified_by = excluded.identified_by,
                begin_season = excluded.begin_season,
                begin_number = excluded.begin_number",
            params![
                series.name,
                series.identified_by.as_str(),
                series.begin.map(|b| b.season),
                series.begin.map(|b| b.number),
            ],
        )?;
        Ok(())
    }

    /// Every stored series, ordered by name.
    pub fn list_series(&self) -> Result<Vec<Series>, HistoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, identified_by, begin_season, begin_number
             FROM series
             ORDER BY name",
        )?;

        let rows = stmt.query_map([], Self::series_columns)?;

        let mut series = Vec::new();
        for row in rows {
            let (name, identified_by, begin_season, begin_number) = row?;
            series.push(Self::series_from_row(
                name,
                identified_by,
                begin_season,
                begin_number,
            )?);
        }
        Ok(series)
    }

    /// Look up a single series by name.
    pub fn get_series(&self, name: &str) -> Result<Series, HistoryError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT name, identified_by, begin_season, begin_number
                 FROM series
                 WHERE name = ?1",
                params![name],
                Self::series_columns,
            )
            .optional()?;

        match row {
            Some((name, identified_by, begin_season, begin_number)) => {
                Self::series_from_row(name, identified_by, begin_season, begin_number)
            }
            None => Err(HistoryError::SeriesNotFound(name.to_string())),
        }
    }

    /// Make `series_name` part of the given run.
    pub fn assign_to_run(&self, run_id: &str, series_name: &str) -> Result<(), HistoryError> {
        let conn = self.lock()?;
        Self::ensure_series(&conn, series_name)?;
        conn.execute(
            "INSERT OR IGNORE INTO series_runs (run_id, series_name) VALUES (?1, ?2)",
            params![run_id, series_name],
        )?;
        Ok(())
    }

    /// Record that an episode exists, without any release.
    pub fn record_episode(&self, series_name: &str, id: EpisodeId) -> Result<(), HistoryError> {
        let conn = self.lock()?;
        Self::ensure_series(&conn, series_name)?;
        Self::episode_row(&conn, series_name, id)?;
        Ok(())
    }

    /// Record a release for an episode, creating the episode if needed.
    ///
    /// Recording the same title twice keeps a single row; a `downloaded` flag
    /// never flips back to false.
    pub fn record_release(
        &self,
        series_name: &str,
        id: EpisodeId,
        title: &str,
        downloaded: bool,
    ) -> Result<(), HistoryError> {
        let conn = self.lock()?;
        Self::ensure_series(&conn, series_name)?;
        let episode_id = Self::episode_row(&conn, series_name, id)?;
        conn.execute(
            "INSERT INTO releases (episode_id, title, downloaded, first_seen_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(episode_id, title) DO UPDATE SET
                downloaded = MAX(downloaded, excluded.downloaded)",
            params![episode_id, title, downloaded, Utc::now().to_rfc3339()],
        )?;
        debug!(
            "Recorded release '{}' for {} {} (downloaded: {})",
            title, series_name, id, downloaded
        );
        Ok(())
    }

    /// Releases recorded for an episode, oldest first.
    pub fn releases(&self, series_name: &str, id: EpisodeId) -> Result<Vec<Release>, HistoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT r.title, r.downloaded, r.first_seen_at
             FROM releases r
             JOIN episodes e ON e.id = r.episode_id
             WHERE e.series_name = ?1 AND e.season = ?2 AND e.number = ?3
             ORDER BY r.id",
        )?;

        let rows = stmt.query_map(params![series_name, id.season, id.number], |row| {
            let first_seen_str: String = row.get(2)?;
            let first_seen_at = DateTime::parse_from_rfc3339(&first_seen_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            Ok(Release {
                title: row.get(0)?,
                downloaded: row.get(1)?,
                first_seen_at,
            })
        })?;

        let mut releases = Vec::new();
        for row in rows {
            releases.push(row?);
        }
        Ok(releases)
    }

    fn ensure_series(conn: &Connection, series_name: &str) -> Result<(), HistoryError> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM series WHERE name = ?1)",
            params![series_name],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(HistoryError::SeriesNotFound(series_name.to_string()))
        }
    }

    /// Return the row id of an episode, inserting it if missing.
    fn episode_row(conn: &Connection, series_name: &str, id: EpisodeId) -> Result<i64, HistoryError> {
        conn.execute(
            "INSERT OR IGNORE INTO episodes (series_name, season, number) VALUES (?1, ?2, ?3)",
            params![series_name, id.season, id.number],
        )?;
        let row_id = conn.query_row(
            "SELECT id FROM episodes WHERE series_name = ?1 AND season = ?2 AND number = ?3",
            params![series_name, id.season, id.number],
            |row| row.get(0),
        )?;
        Ok(row_id)
    }

    fn series_columns(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(String, String, Option<u32>, Option<u32>)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn series_from_row(
        name: String,
        identified_by: String,
        begin_season: Option<u32>,
        begin_number: Option<u32>,
    ) -> Result<Series, HistoryError> {
        let begin = match (begin_season, begin_number) {
            (Some(season), Some(number)) => Some(
                EpisodeId::new(season, number)
                    .map_err(|e| HistoryError::InvalidData(format!("{}: {}", name, e)))?,
            ),
            (None, None) => None,
            _ => {
                return Err(HistoryError::InvalidData(format!(
                    "{}: begin point must have both season and number",
                    name
                )))
            }
        };
        Ok(Series {
            name,
            identified_by: IdentifiedBy::parse(&identified_by),
            begin,
        })
    }
}

impl SeriesCatalog for SqliteHistory {
    fn list_series_for_run(&self, run_id: &str) -> Result<Vec<Series>, HistoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT s.name, s.identified_by, s.begin_season, s.begin_number
             FROM series s
             JOIN series_runs r ON r.series_name = s.name
             WHERE r.run_id = ?1
             ORDER BY s.name",
        )?;

        let rows = stmt.query_map(params![run_id], Self::series_columns)?;

        let mut series = Vec::new();
        for row in rows {
            let (name, identified_by, begin_season, begin_number) = row?;
            series.push(Self::series_from_row(
                name,
                identified_by,
                begin_season,
                begin_number,
            )?);
        }
        Ok(series)
    }
}

impl DownloadHistory for SqliteHistory {
    fn latest_download(&self, series: &Series) -> Result<Option<LatestDownload>, HistoryError> {
        let conn = self.lock()?;
        let latest = conn
            .query_row(
                "SELECT e.season, e.number
                 FROM episodes e
                 WHERE e.series_name = ?1
                   AND EXISTS (SELECT 1 FROM releases r WHERE r.episode_id = e.id AND r.downloaded = 1)
                 ORDER BY e.season DESC, e.number DESC
                 LIMIT 1",
                params![series.name],
                |row| {
                    Ok(EpisodeId {
                        season: row.get(0)?,
                        number: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(latest)
    }

    fn episodes_in_season(
        &self,
        series: &Series,
        season: u32,
    ) -> Result<Vec<Episode>, HistoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT e.season, e.number,
                    EXISTS (SELECT 1 FROM releases r WHERE r.episode_id = e.id AND r.downloaded = 1)
             FROM episodes e
             WHERE e.series_name = ?1 AND e.season = ?2
             ORDER BY e.number",
        )?;

        let rows = stmt.query_map(params![series.name, season], |row| {
            Ok(Episode {
                season: row.get(0)?,
                number: row.get(1)?,
                has_downloaded_release: row.get(2)?,
            })
        })?;

        let mut episodes = Vec::new();
        for row in rows {
            episodes.push(row?);
        }
        Ok(episodes)
    }
}
