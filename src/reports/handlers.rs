use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::DateRange,
    reports::{csv::render_csv, data::ReportRow, pdf::render_pdf},
    state::AppState,
    transactions::repo::TransactionRow,
};

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/data/export", get(export))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    /// Case-insensitive; anything but csv/pdf is rejected up front, before
    /// any database work happens.
    fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("pdf") => Ok(Self::Pdf),
            _ => Err(ApiError::bad_request("format must be csv or pdf")),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    pub format: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[instrument(skip(state))]
pub async fn export(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = ExportFormat::parse(q.format.as_deref())?;
    let range = DateRange::parse(q.start_date.as_deref(), q.end_date.as_deref())?;

    // The whole filtered range is materialized before any response bytes go
    // out, so a failing fetch never leaks partial output.
    let rows: Vec<ReportRow> = TransactionRow::list_for_report(&state.db, user_id, range)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    info!(%user_id, rows = rows.len(), format = ?format, "export requested");

    match format {
        ExportFormat::Csv => {
            let bytes = render_csv(&rows)?;
            Ok(download(bytes, "text/csv", "transactions.csv"))
        }
        ExportFormat::Pdf => {
            // Rendering is CPU-bound; keep it off the async workers. The body
            // is dropped, aborting the transfer, if the client disconnects.
            let font_path = state.config.report_font_path.clone();
            let bytes = tokio::task::spawn_blocking(move || {
                render_pdf(&rows, font_path.as_deref())
            })
            .await
            .map_err(|e| ApiError::Internal(e.into()))??;
            Ok(download(bytes, "application/pdf", "transactions-report.pdf"))
        }
    }
}

fn download(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_case_insensitive() {
        assert_eq!(ExportFormat::parse(Some("csv")).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(Some("CSV")).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(Some("Pdf")).unwrap(), ExportFormat::Pdf);
    }

    #[test]
    fn unknown_or_missing_format_is_rejected() {
        assert!(ExportFormat::parse(Some("xml")).is_err());
        assert!(ExportFormat::parse(Some("")).is_err());
        assert!(ExportFormat::parse(None).is_err());
    }

    #[test]
    fn download_sets_attachment_headers() {
        let resp = download(b"data".to_vec(), "text/csv", "transactions.csv");
        let headers = resp.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/csv");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"transactions.csv\""
        );
    }
}
