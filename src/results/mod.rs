use crate::database::{DatabaseError, ElectionsDatabase, ProcessInfo};
use serde::Serialize;

pub mod tally;

use tally::Tally;

#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Election process not found: {0}")]
    ProcessNotFound(i64),
    #[error("Results are only available for finalized processes ({name} is {status})")]
    NotFinalized { name: String, status: String },
}

pub type ResultsResult<T> = std::result::Result<T, ResultsError>;

/// Warning shown when results are requested before a process is finalized
pub const NOT_FINALIZED_WARNING: &str =
    "Los resultados solo están disponibles para procesos electorales finalizados.";

pub const PROCESS_LIST_TITLE: &str = "Resultados de Procesos Electorales";

/// Results of a process together with the process itself
#[derive(Debug, Clone, Serialize)]
pub struct ElectionResults {
    pub process: ProcessInfo,
    #[serde(flatten)]
    pub tally: Tally,
}

/// Fetch a process that exists, whatever its status
pub async fn get_process(db: &ElectionsDatabase, process_id: i64) -> ResultsResult<ProcessInfo> {
    db.get_process_by_id(process_id)
        .await?
        .ok_or(ResultsError::ProcessNotFound(process_id))
}

/// Fetch a process and make sure its results may be computed
pub async fn get_finalized_process(
    db: &ElectionsDatabase,
    process_id: i64,
) -> ResultsResult<ProcessInfo> {
    let process = get_process(db, process_id).await?;

    if !process.status.is_finalized() {
        log::warn!(
            "Results requested for process {} in status {}",
            process.id,
            process.status
        );
        return Err(ResultsError::NotFinalized {
            name: process.name,
            status: process.status.to_string(),
        });
    }

    Ok(process)
}

/// Compute the results of a finalized process
pub async fn compute_results(
    db: &ElectionsDatabase,
    process: ProcessInfo,
) -> ResultsResult<ElectionResults> {
    let counts = db.get_list_vote_counts(process.id).await?;
    let totals = db.get_vote_totals(process.id).await?;
    let eligible_voters = db.count_eligible_voters(process.period_id).await?;

    log::debug!(
        "Tallying {} lists and {} ballots for process {}",
        counts.len(),
        totals.total,
        process.id
    );

    let tally = tally::tally(&counts, totals, eligible_voters);

    Ok(ElectionResults { process, tally })
}

/// Guard and compute in one step
pub async fn results_for_process(
    db: &ElectionsDatabase,
    process_id: i64,
) -> ResultsResult<ElectionResults> {
    let process = get_finalized_process(db, process_id).await?;
    compute_results(db, process).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ingestion::{tests::sample_snapshot, SnapshotImporter};
    use pretty_assertions::assert_eq;

    async fn seeded() -> ElectionsDatabase {
        let db = ElectionsDatabase::create_in_memory().await.unwrap();
        SnapshotImporter::new(db.clone())
            .import(&sample_snapshot())
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn finalized_process_results() {
        let db = seeded().await;
        let results = results_for_process(&db, 1).await.unwrap();

        assert_eq!(results.process.name, "Consejo Estudiantil");
        assert_eq!(results.tally.total_votes, 7);
        assert_eq!(results.tally.eligible_voters, 10);
        assert_eq!(results.tally.not_voted, 3);
        assert_eq!(results.tally.participation_percentage, 70.0);
        assert_eq!(results.tally.winner.as_ref().map(|w| w.name.as_str()), Some("Lista B"));
        assert_eq!(results.tally.blank.votes, 1);
        assert_eq!(results.tally.null.votes, 1);
    }

    #[tokio::test]
    async fn open_process_is_refused() {
        let db = seeded().await;
        let err = results_for_process(&db, 2).await.unwrap_err();

        assert!(matches!(err, ResultsError::NotFinalized { .. }));
    }

    #[tokio::test]
    async fn unknown_process_is_not_found() {
        let db = seeded().await;
        let err = results_for_process(&db, 42).await.unwrap_err();

        assert!(matches!(err, ResultsError::ProcessNotFound(42)));
    }

    #[tokio::test]
    async fn results_serialize_flat() {
        let db = seeded().await;
        let results = results_for_process(&db, 1).await.unwrap();
        let json = serde_json::to_value(&results).unwrap();

        assert_eq!(json["total_votes"], 7);
        assert_eq!(json["process"]["status"], "finalizado");
        assert_eq!(json["lists"][0]["is_winner"], true);
    }
}
