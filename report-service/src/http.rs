//! Report download endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use time::{macros::format_description, Date};

use crate::{
    delivery::Download,
    error::ReportError,
    orchestrator::{Orchestrator, ReportQuery},
};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Used when the request does not say whether to add analysis sheets.
    pub default_analysis: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/reports/feeders", get(feeder_report))
        .with_state(state)
}

/// Raw query string of `GET /reports/feeders`.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub region: Option<String>,
    pub business_hub: Option<String>,
    /// Comma separated.
    pub feeder_ids: Option<String>,
    pub analysis: Option<bool>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_day(s: &str) -> Result<Date, String> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date '{s}', expected YYYY-MM-DD: {e}"))
}

fn parse_opt_day(s: Option<String>) -> Result<Option<Date>, String> {
    non_empty(s).map(|v| parse_day(&v)).transpose()
}

impl ReportParams {
    pub fn into_query(self, default_analysis: bool) -> Result<ReportQuery, String> {
        let feeder_ids = non_empty(self.feeder_ids).map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        Ok(ReportQuery {
            date: parse_opt_day(self.date)?,
            start: parse_opt_day(self.start)?,
            end: parse_opt_day(self.end)?,
            region: non_empty(self.region),
            business_hub: non_empty(self.business_hub),
            feeder_ids,
            include_analysis: self.analysis.unwrap_or(default_analysis),
        })
    }
}

pub fn status_for(err: &ReportError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_bad_request() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn feeder_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Response {
    let query = match params.into_query(state.default_analysis) {
        Ok(q) => q,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };

    let download = match state.orchestrator.run(&query).await {
        Ok(report) => Download::from_report(&report),
        Err(e) => Err(e),
    };

    match download {
        Ok(d) => (
            [
                (header::CONTENT_TYPE, d.content_type.to_string()),
                (header::CONTENT_DISPOSITION, d.content_disposition()),
            ],
            d.bytes,
        )
            .into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, "report generation failed");
            } else {
                tracing::info!(error = %e, "report request rejected");
            }
            (status, e.to_string()).into_response()
        }
    }
}
