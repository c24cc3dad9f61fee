//! Analytics endpoints - thin wrappers over the reporting layer.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use chrono::{Datelike, Utc};
use libman_business::LendingError;
use libman_core::ValidationErrors;
use libman_reports::Period;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MostBorrowedQuery {
    pub limit: Option<i64>,
    pub period: Option<String>,
}

#[derive(Deserialize)]
pub struct MonthlyReportQuery {
    pub year: Option<i32>,
}

/// Dashboard overview: counters plus category/user-type breakdowns
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let report = state.reports.dashboard().await?;
    Ok(ApiResponse::success(report))
}

/// Most-borrowed titles inside a period window
pub async fn most_borrowed(
    State(state): State<AppState>,
    Query(query): Query<MostBorrowedQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    let period = match query.period.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(raw) => Period::from_str(raw).ok_or_else(|| {
            ApiError(LendingError::Validation(ValidationErrors(vec![format!(
                "period must be one of: all, week, month, year (got {})",
                raw
            )])))
        })?,
        None => Period::All,
    };

    let rows = state.reports.most_borrowed(limit, period).await?;
    Ok(ApiResponse::success(rows))
}

/// Borrowing totals per user type
pub async fn user_categories(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rows = state.reports.patron_type_activity().await?;
    Ok(ApiResponse::success(rows))
}

/// Borrowing activity per calendar month, across all years
pub async fn reading_patterns(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rows = state.reports.reading_patterns().await?;
    Ok(ApiResponse::success(rows))
}

/// Borrows/returns/overdue per month of one year
pub async fn monthly_report(
    State(state): State<AppState>,
    Query(query): Query<MonthlyReportQuery>,
) -> ApiResult<impl IntoResponse> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let rows = state.reports.monthly_report(year).await?;
    Ok(ApiResponse::success(rows))
}
