pub mod ingestion;
pub mod schema;

use crate::model::ProcessStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Data integrity error: {0}")]
    Integrity(String),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Clone)]
pub struct ElectionsDatabase {
    pool: SqlitePool,
}

impl ElectionsDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;

        schema::create_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn create_in_memory() -> Result<Self> {
        // Every pooled connection would otherwise open its own empty database
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        schema::create_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get election process by ID
    pub async fn get_process_by_id(&self, process_id: i64) -> Result<Option<ProcessInfo>> {
        let process = sqlx::query_as::<_, ProcessInfo>(
            r#"
            SELECT id, name, date, status, period_id, created_at
            FROM election_processes
            WHERE id = ?
            "#,
        )
        .bind(process_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(process)
    }

    /// Get all election processes, newest first
    pub async fn get_all_processes(&self) -> Result<Vec<ProcessInfo>> {
        let processes = sqlx::query_as::<_, ProcessInfo>(
            r#"
            SELECT id, name, date, status, period_id, created_at
            FROM election_processes
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(processes)
    }

    /// Count list votes for a process, highest count first
    pub async fn get_list_vote_counts(&self, process_id: i64) -> Result<Vec<ListVoteCount>> {
        let counts = sqlx::query_as::<_, ListVoteCount>(
            r#"
            SELECT
                v.list_id AS list_id,
                l.name AS list_name,
                COUNT(v.id) AS votes
            FROM votes v
            JOIN lists l ON l.id = v.list_id
            WHERE v.process_id = ? AND v.list_id IS NOT NULL
            GROUP BY v.list_id, l.name
            ORDER BY votes DESC, v.list_id ASC
            "#,
        )
        .bind(process_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Count all, blank and null votes for a process
    pub async fn get_vote_totals(&self, process_id: i64) -> Result<VoteTotals> {
        let totals = sqlx::query_as::<_, VoteTotals>(
            r#"
            SELECT
                COUNT(id) AS total,
                COALESCE(SUM(CASE WHEN is_blank THEN 1 ELSE 0 END), 0) AS blank,
                COALESCE(SUM(CASE WHEN is_null THEN 1 ELSE 0 END), 0) AS null_votes
            FROM votes
            WHERE process_id = ?
            "#,
        )
        .bind(process_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Count voters on the roll for a period
    pub async fn count_eligible_voters(&self, period_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM voter_roll WHERE period_id = ?")
            .bind(period_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Get the full voter roll of a process's period with each voter's participation
    pub async fn get_roster_for_process(&self, process: &ProcessInfo) -> Result<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, RosterRow>(
            r#"
            SELECT
                r.id,
                r.national_id,
                r.first_names,
                r.last_names,
                r.grade,
                r.section,
                EXISTS(
                    SELECT 1 FROM votes v
                    WHERE v.process_id = ? AND v.voter_id = r.id
                ) AS voted
            FROM voter_roll r
            WHERE r.period_id = ?
            ORDER BY r.last_names, r.first_names, r.id
            "#,
        )
        .bind(process.id)
        .bind(process.period_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RosterEntry::from).collect())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProcessInfo {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub status: ProcessStatus,
    pub period_id: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ListVoteCount {
    pub list_id: i64,
    pub list_name: String,
    pub votes: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct VoteTotals {
    pub total: i64,
    pub blank: i64,
    pub null_votes: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct RosterRow {
    id: i64,
    national_id: String,
    first_names: String,
    last_names: String,
    grade: String,
    section: String,
    voted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub id: i64,
    pub national_id: String,
    pub first_names: String,
    pub last_names: String,
    pub grade: String,
    pub section: String,
    pub voted: bool,
}

impl RosterEntry {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_names, self.first_names)
    }

    pub fn class_group(&self) -> String {
        if self.section.is_empty() {
            self.grade.clone()
        } else {
            format!("{} \"{}\"", self.grade, self.section)
        }
    }
}

impl From<RosterRow> for RosterEntry {
    fn from(row: RosterRow) -> Self {
        Self {
            id: row.id,
            national_id: row.national_id,
            first_names: row.first_names,
            last_names: row.last_names,
            grade: row.grade,
            section: row.section,
            voted: row.voted != 0,
        }
    }
}
