/// Snapshot import of election data exported by the administration app
use crate::database::{DatabaseError, ElectionsDatabase, Result};
use crate::model::ProcessStatus;
use chrono::{NaiveDate, NaiveDateTime};
use colored::*;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct ElectionSnapshot {
    #[serde(default)]
    pub periods: Vec<PeriodRecord>,
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
    #[serde(default)]
    pub lists: Vec<ListRecord>,
    #[serde(default)]
    pub roll: Vec<RollRecord>,
    #[serde(default)]
    pub votes: Vec<VoteRecord>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRecord {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub status: ProcessStatus,
    pub period_id: i64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct ListRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RollRecord {
    pub id: i64,
    pub period_id: i64,
    pub national_id: String,
    pub first_names: String,
    pub last_names: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub section: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRecord {
    pub process_id: i64,
    #[serde(default)]
    pub list_id: Option<i64>,
    #[serde(default)]
    pub blank: bool,
    #[serde(default)]
    pub null: bool,
    #[serde(default)]
    pub voter_id: Option<i64>,
}

impl VoteRecord {
    /// A ballot is exactly one of: a list vote, a blank vote or a null vote.
    fn validate(&self, index: usize) -> Result<()> {
        let kinds = [self.list_id.is_some(), self.blank, self.null]
            .iter()
            .filter(|set| **set)
            .count();

        if kinds != 1 {
            return Err(DatabaseError::Integrity(format!(
                "Vote #{} for process {} must be exactly one of list, blank or null",
                index, self.process_id
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub periods: usize,
    pub processes: usize,
    pub lists: usize,
    pub voters: usize,
    pub votes: usize,
}

pub struct SnapshotImporter {
    db: ElectionsDatabase,
}

impl SnapshotImporter {
    pub fn new(db: ElectionsDatabase) -> Self {
        Self { db }
    }

    /// Read and import a JSON snapshot file
    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        println!(
            "📥 Reading snapshot {}",
            path.display().to_string().bright_cyan()
        );

        let raw = tokio::fs::read(path).await?;
        let snapshot: ElectionSnapshot = serde_json::from_slice(&raw)?;

        self.import(&snapshot).await
    }

    /// Insert snapshot data in a single transaction
    pub async fn import(&self, snapshot: &ElectionSnapshot) -> Result<ImportSummary> {
        // Validate before touching the database so a bad ballot writes nothing
        for (index, vote) in snapshot.votes.iter().enumerate() {
            vote.validate(index)?;
        }

        let mut tx = self.db.pool().begin().await?;

        // A snapshot carries the full ballot set of each process it touches
        let process_ids: BTreeSet<i64> = snapshot
            .processes
            .iter()
            .map(|p| p.id)
            .chain(snapshot.votes.iter().map(|v| v.process_id))
            .collect();
        for process_id in process_ids {
            let replaced = sqlx::query("DELETE FROM votes WHERE process_id = ?")
                .bind(process_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            if replaced > 0 {
                log::info!("Replacing {} votes of process {}", replaced, process_id);
            }
        }

        for period in &snapshot.periods {
            sqlx::query("INSERT OR REPLACE INTO periods (id, name) VALUES (?, ?)")
                .bind(period.id)
                .bind(&period.name)
                .execute(&mut *tx)
                .await?;
        }

        for process in &snapshot.processes {
            let created_at = process
                .created_at
                .unwrap_or_else(|| chrono::Utc::now().naive_utc());

            sqlx::query(
                r#"
                INSERT OR REPLACE INTO election_processes (id, name, date, status, period_id, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(process.id)
            .bind(&process.name)
            .bind(process.date)
            .bind(process.status)
            .bind(process.period_id)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        for list in &snapshot.lists {
            sqlx::query("INSERT OR REPLACE INTO lists (id, name) VALUES (?, ?)")
                .bind(list.id)
                .bind(&list.name)
                .execute(&mut *tx)
                .await?;
        }

        for voter in &snapshot.roll {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO voter_roll (id, period_id, national_id, first_names, last_names, grade, section)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(voter.id)
            .bind(voter.period_id)
            .bind(&voter.national_id)
            .bind(&voter.first_names)
            .bind(&voter.last_names)
            .bind(&voter.grade)
            .bind(&voter.section)
            .execute(&mut *tx)
            .await?;
        }

        for vote in &snapshot.votes {
            sqlx::query(
                r#"
                INSERT INTO votes (process_id, list_id, is_blank, is_null, voter_id)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(vote.process_id)
            .bind(vote.list_id)
            .bind(vote.blank)
            .bind(vote.null)
            .bind(vote.voter_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let summary = ImportSummary {
            periods: snapshot.periods.len(),
            processes: snapshot.processes.len(),
            lists: snapshot.lists.len(),
            voters: snapshot.roll.len(),
            votes: snapshot.votes.len(),
        };

        log::info!("Imported snapshot: {:?}", summary);
        Ok(summary)
    }
}
