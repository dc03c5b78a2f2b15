use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::update::checker::{CachedRelease, ReleaseStorer};
use crate::version::error::CacheError;
use crate::version::types::{ReleaseInfo, RepositoryId};

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: index for refresh scans
    &["CREATE INDEX IF NOT EXISTS idx_releases_fetched_at ON releases(fetched_at)"],
];

pub struct Cache {
    conn: Mutex<Connection>,
    refresh_interval: i64,
}

impl Cache {
    pub fn new(db_path: &Path, refresh_interval: i64) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let cache = Self {
            conn: Mutex::new(conn),
            refresh_interval,
        };

        cache.create_schema()?;
        info!("Cache initialized successfully");

        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS releases (
                repository TEXT PRIMARY KEY,
                tag TEXT NOT NULL,
                artifact_url TEXT NOT NULL,
                fetched_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CacheError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }
}

impl ReleaseStorer for Cache {
    fn refresh_interval_ms(&self) -> i64 {
        self.refresh_interval
    }

    fn get_release(&self, repository: &RepositoryId) -> Result<Option<CachedRelease>, CacheError> {
        let conn = self.lock_conn()?;

        let row = conn
            .query_row(
                "SELECT tag, artifact_url, fetched_at FROM releases WHERE repository = ?1",
                [repository.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        // Rows with blank fields cannot form a ReleaseInfo and count as missing
        Ok(row.and_then(|(tag, artifact_url, fetched_at)| {
            ReleaseInfo::new(tag, artifact_url).map(|release| CachedRelease {
                release,
                fetched_at,
            })
        }))
    }

    fn save_release(
        &self,
        repository: &RepositoryId,
        release: &ReleaseInfo,
        fetched_at: i64,
    ) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            INSERT INTO releases (repository, tag, artifact_url, fetched_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(repository) DO UPDATE SET
                tag = excluded.tag,
                artifact_url = excluded.artifact_url,
                fetched_at = excluded.fetched_at
            "#,
            (
                repository.to_string(),
                release.tag(),
                release.artifact_url(),
                fetched_at,
            ),
        )?;

        debug!("Saved release {} for {}", release.tag(), repository);
        Ok(())
    }

    fn invalidate(&self, repository: &RepositoryId) -> Result<bool, CacheError> {
        let conn = self.lock_conn()?;
        let rows = conn.execute(
            "DELETE FROM releases WHERE repository = ?1",
            [repository.to_string()],
        )?;

        if rows > 0 {
            debug!("Invalidated cached release for {}", repository);
        }
        Ok(rows > 0)
    }

    fn repositories_needing_refresh(&self, now: i64) -> Result<Vec<RepositoryId>, CacheError> {
        let threshold = now.saturating_sub(self.refresh_interval);

        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT repository FROM releases WHERE fetched_at <= ?1 ORDER BY repository",
        )?;

        let repositories = stmt
            .query_map([threshold], |row| row.get::<_, String>(0))?
            .filter_map(|result| result.ok().and_then(|s| s.parse::<RepositoryId>().ok()))
            .collect();

        Ok(repositories)
    }
}
