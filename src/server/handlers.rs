use super::error::{AppError, NOT_FINALIZED_CODE};
use super::AppState;
use crate::backup::{self, BackupError};
use crate::database::ProcessInfo;
use crate::report::{self, ReportOptions};
use crate::results::{self, ElectionResults, NOT_FINALIZED_WARNING, PROCESS_LIST_TITLE};
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

#[derive(Debug, Deserialize)]
pub struct ProcessListQuery {
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessListing {
    pub title: &'static str,
    pub warning: Option<&'static str>,
    pub processes: Vec<ProcessInfo>,
}

pub async fn list_processes(
    State(state): State<AppState>,
    Query(query): Query<ProcessListQuery>,
) -> Result<Json<ProcessListing>, AppError> {
    let processes = state.db.get_all_processes().await?;
    let warning = query
        .warning
        .filter(|code| code == NOT_FINALIZED_CODE)
        .map(|_| NOT_FINALIZED_WARNING);

    Ok(Json(ProcessListing {
        title: PROCESS_LIST_TITLE,
        warning,
        processes,
    }))
}

pub async fn process_results(
    State(state): State<AppState>,
    Path(process_id): Path<i64>,
) -> Result<Json<ElectionResults>, AppError> {
    let results = results::results_for_process(&state.db, process_id).await?;
    Ok(Json(results))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub padron: bool,
}

pub async fn results_pdf(
    State(state): State<AppState>,
    Path(process_id): Path<i64>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let options = ReportOptions {
        include_roster: query.padron,
    };
    let report =
        report::generate_report(&state.db, process_id, options, &state.settings.report).await?;

    Ok(attachment("application/pdf", &report.filename, Body::from(report.bytes)))
}

pub async fn download_backup(State(state): State<AppState>) -> Result<Response, AppError> {
    let source = backup::locate(
        &state.settings.database_url,
        &state.settings.backup_prefix,
        chrono::Local::now().date_naive(),
    )?;

    let file = tokio::fs::File::open(&source.path)
        .await
        .map_err(BackupError::from)?;
    let body = Body::from_stream(ReaderStream::new(file));

    Ok(attachment("application/vnd.sqlite3", &source.filename, body))
}

fn attachment(content_type: &'static str, filename: &str, body: Body) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        body,
    )
        .into_response()
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name per RFC 6266
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                char::from(b).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_filename_disposition() {
        assert_eq!(
            content_disposition("Resultados_Consejo_2025-11-24.pdf"),
            "attachment; filename=\"Resultados_Consejo_2025-11-24.pdf\""
        );
    }

    #[test]
    fn accented_filename_gets_encoded_variant() {
        assert_eq!(
            content_disposition("Resultados_Elección.pdf"),
            "attachment; filename=\"Resultados_Elecci_n.pdf\"; filename*=UTF-8''Resultados_Elecci%C3%B3n.pdf"
        );
    }
}
