//! Transaction endpoints: the borrow/return/renew workflow, the ledger
//! listing, overdue view and the sweep trigger.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use libman_business::LendingError;
use libman_core::{
    BookRef, LoanDetail, LoanStatus, PatronRef, ValidationErrors, DEFAULT_LOAN_DAYS,
    DEFAULT_RENEWAL_DAYS,
};
use libman_persistence::{LoanFilter, LoanRepo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{limit_or_default, page_or_default, ApiResponse, Pagination};
use crate::state::AppState;

/// A resolved ledger entry as the client sees it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub transaction_id: String,
    pub status: LoanStatus,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub renewal_count: i64,
    pub fine_amount: Decimal,
    pub book: BookRef,
    pub user: PatronRef,
}

impl From<LoanDetail> for TransactionDto {
    fn from(detail: LoanDetail) -> Self {
        Self {
            transaction_id: detail.loan.id,
            status: detail.loan.status,
            borrow_date: detail.loan.borrow_date,
            due_date: detail.loan.due_date,
            return_date: detail.loan.return_date,
            renewal_count: detail.loan.renewal_count,
            fine_amount: detail.loan.fine_amount,
            book: detail.book,
            user: detail.patron,
        }
    }
}

/// Return outcome: the closed transaction with the fine called out.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOutcome {
    #[serde(flatten)]
    pub transaction: TransactionDto,
    pub fine: Decimal,
}

/// An overdue entry with the day count the dashboard displays.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueDto {
    #[serde(flatten)]
    pub transaction: TransactionDto,
    pub overdue_days: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub book_id: String,
    pub user_id: String,
    pub days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub transaction_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewRequest {
    pub transaction_id: String,
    pub additional_days: Option<i64>,
}

#[derive(Deserialize)]
pub struct LoanListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// Borrow a book
pub async fn borrow(
    State(state): State<AppState>,
    Json(payload): Json<BorrowRequest>,
) -> ApiResult<impl IntoResponse> {
    let days = payload.days.unwrap_or(DEFAULT_LOAN_DAYS);
    let detail = state
        .lending
        .borrow(&payload.book_id, &payload.user_id, days)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success(TransactionDto::from(detail)),
    ))
}

/// Return a borrowed book
pub async fn return_book(
    State(state): State<AppState>,
    Json(payload): Json<ReturnRequest>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.lending.return_loan(&payload.transaction_id).await?;
    let transaction = TransactionDto::from(detail);
    let fine = transaction.fine_amount;
    Ok(ApiResponse::success(ReturnOutcome { transaction, fine }))
}

/// Extend a loan's due date
pub async fn renew(
    State(state): State<AppState>,
    Json(payload): Json<RenewRequest>,
) -> ApiResult<impl IntoResponse> {
    let days = payload.additional_days.unwrap_or(DEFAULT_RENEWAL_DAYS);
    let detail = state
        .lending
        .renew(&payload.transaction_id, days)
        .await?;
    Ok(ApiResponse::success(TransactionDto::from(detail)))
}

/// List transactions, newest first, optionally filtered by status
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LoanListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = match query.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => {
            let parsed = LoanStatus::from_str(raw).ok_or_else(|| {
                ApiError(LendingError::Validation(ValidationErrors(vec![format!(
                    "status must be one of: borrowed, returned, overdue (got {})",
                    raw
                )])))
            })?;
            Some(parsed.as_str().to_string())
        }
        None => None,
    };

    let page = page_or_default(query.page);
    let limit = limit_or_default(query.limit);
    let filter = LoanFilter {
        status,
        page,
        limit,
    };

    let (rows, total) = LoanRepo::list(state.db.pool(), &filter).await?;
    let transactions = rows
        .into_iter()
        .map(|row| LoanDetail::try_from(row).map(TransactionDto::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApiResponse::paginated(
        transactions,
        Pagination::new(page, limit, total),
    ))
}

/// Every entry currently past due, with day counts
pub async fn overdue(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let rows = LoanRepo::list_overdue(state.db.pool(), now).await?;
    let entries = rows
        .into_iter()
        .map(|row| {
            LoanDetail::try_from(row).map(|detail| {
                let overdue_days = detail.loan.days_overdue_at(now);
                OverdueDto {
                    transaction: TransactionDto::from(detail),
                    overdue_days,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApiResponse::success(entries))
}

/// Run the overdue sweep once and report how many entries were flipped
pub async fn sweep(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let updated = state.sweeper.sweep().await?;
    Ok(ApiResponse::success(serde_json::json!({ "updated": updated })))
}
