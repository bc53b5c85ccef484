use crate::database::{DatabaseError, Result};
/// Database schema definitions and integrity checks
use sqlx::SqlitePool;

const EXPECTED_TABLES: [&str; 5] = [
    "election_processes",
    "lists",
    "periods",
    "voter_roll",
    "votes",
];

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Create periods table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS periods (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create election processes table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS election_processes (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            date DATE NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('borrador', 'abierto', 'finalizado')),
            period_id INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (period_id) REFERENCES periods(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create candidate lists table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lists (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create voter roll table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS voter_roll (
            id INTEGER PRIMARY KEY,
            period_id INTEGER NOT NULL,
            national_id TEXT NOT NULL,
            first_names TEXT NOT NULL,
            last_names TEXT NOT NULL,
            grade TEXT NOT NULL DEFAULT '',
            section TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (period_id) REFERENCES periods(id),
            UNIQUE(period_id, national_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create votes table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            id INTEGER PRIMARY KEY,
            process_id INTEGER NOT NULL,
            list_id INTEGER,
            is_blank BOOLEAN NOT NULL DEFAULT 0,
            is_null BOOLEAN NOT NULL DEFAULT 0,
            voter_id INTEGER,
            cast_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (process_id) REFERENCES election_processes(id),
            FOREIGN KEY (list_id) REFERENCES lists(id),
            FOREIGN KEY (voter_id) REFERENCES voter_roll(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for performance
    create_indexes(pool).await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_processes_period ON election_processes(period_id)",
        "CREATE INDEX IF NOT EXISTS idx_voter_roll_period ON voter_roll(period_id)",
        "CREATE INDEX IF NOT EXISTS idx_votes_process ON votes(process_id)",
        "CREATE INDEX IF NOT EXISTS idx_votes_list ON votes(list_id)",
        // One ballot per voter per process
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_voter ON votes(process_id, voter_id) WHERE voter_id IS NOT NULL",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}

/// Verify database schema integrity
pub async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(pool)
            .await?;

    for expected in &EXPECTED_TABLES {
        if !tables.iter().any(|name| name == expected) {
            return Err(DatabaseError::Integrity(format!(
                "Missing table: {}",
                expected
            )));
        }
    }

    Ok(())
}
