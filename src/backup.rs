/// Export of the SQLite database file
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKUP_PREFIX: &str = "backup_escuela_riobamba";

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Configuración de base de datos no encontrada")]
    NotConfigured,
    #[error("Archivo de base de datos no encontrado en: {0}")]
    Missing(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File behind a `sqlite:` URL, or `None` for in-memory databases
pub fn database_file(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

pub fn backup_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.sqlite3", prefix, date.format("%Y-%m-%d"))
}

/// Database file ready to be streamed or copied
#[derive(Debug)]
pub struct BackupSource {
    pub path: PathBuf,
    pub filename: String,
}

/// Resolve the configured database file, failing when it is not configured or absent
pub fn locate(database_url: &str, prefix: &str, date: NaiveDate) -> Result<BackupSource, BackupError> {
    let path = database_file(database_url).ok_or(BackupError::NotConfigured)?;

    if !path.is_file() {
        return Err(BackupError::Missing(path.display().to_string()));
    }

    Ok(BackupSource {
        path,
        filename: backup_filename(prefix, date),
    })
}

/// Copy the database file into `output_dir` under its dated name
pub async fn copy_to(source: &BackupSource, output_dir: &Path) -> Result<PathBuf, BackupError> {
    tokio::fs::create_dir_all(output_dir).await?;
    let target = output_dir.join(&source.filename);
    tokio::fs::copy(&source.path, &target).await?;

    log::info!("Backed up {} to {}", source.path.display(), target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 24).unwrap()
    }

    #[rstest]
    #[case("sqlite:elecciones.sqlite3", Some("elecciones.sqlite3"))]
    #[case("sqlite://data/db.sqlite3?mode=rwc", Some("data/db.sqlite3"))]
    #[case("sqlite:///var/lib/app/db.sqlite3", Some("/var/lib/app/db.sqlite3"))]
    #[case("sqlite::memory:", None)]
    #[case("postgres://localhost/app", None)]
    fn resolves_database_file(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(database_file(url), expected.map(PathBuf::from));
    }

    #[test]
    fn dated_filename() {
        assert_eq!(
            backup_filename(DEFAULT_BACKUP_PREFIX, date()),
            "backup_escuela_riobamba_2025-11-24.sqlite3"
        );
    }

    #[test]
    fn in_memory_database_is_not_configured() {
        let err = locate("sqlite::memory:", DEFAULT_BACKUP_PREFIX, date()).unwrap_err();
        assert!(matches!(err, BackupError::NotConfigured));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = locate("sqlite:/nonexistent/db.sqlite3", DEFAULT_BACKUP_PREFIX, date()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Archivo de base de datos no encontrado en: /nonexistent/db.sqlite3"
        );
    }

    #[tokio::test]
    async fn copies_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("elecciones.sqlite3");
        std::fs::write(&db_path, b"SQLite format 3\0").unwrap();

        let url = format!("sqlite:{}", db_path.display());
        let source = locate(&url, "copia", date()).unwrap();
        let target = copy_to(&source, &dir.path().join("out")).await.unwrap();

        assert_eq!(target.file_name().unwrap(), "copia_2025-11-24.sqlite3");
        assert_eq!(std::fs::read(target).unwrap(), b"SQLite format 3\0");
    }
}
