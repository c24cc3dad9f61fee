//! Patron endpoints (the API speaks of "users")

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use libman_business::{NewPatron, PatronUpdate};
use libman_core::Patron;
use libman_persistence::PatronFilter;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::handlers::{limit_or_default, page_or_default, ApiResponse, Pagination};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub user_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatronRequest {
    pub name: String,
    pub email: String,
    pub user_type: String,
    pub department: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatronRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub user_type: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

/// List patrons with optional type filter
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PatronListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = page_or_default(query.page);
    let limit = limit_or_default(query.limit);
    let filter = PatronFilter {
        patron_type: query.user_type.filter(|t| !t.trim().is_empty()),
        page,
        limit,
    };

    let (patrons, total) = state.patrons.list(&filter).await?;
    Ok(ApiResponse::paginated(
        patrons,
        Pagination::new(page, limit, total),
    ))
}

/// The patron types the system accepts
pub async fn types(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::success(state.patrons.types())
}

/// Register a patron
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreatePatronRequest>,
) -> ApiResult<impl IntoResponse> {
    let patron = state
        .patrons
        .create(NewPatron {
            name: payload.name,
            email: payload.email,
            patron_type: payload.user_type,
            department: payload.department,
        })
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::success(patron)))
}

/// Get one patron
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Patron>>> {
    let patron = state.patrons.get(&id).await?;
    Ok(ApiResponse::success(patron))
}

/// Edit a patron, including re-activation
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePatronRequest>,
) -> ApiResult<impl IntoResponse> {
    let patron = state
        .patrons
        .update(
            &id,
            PatronUpdate {
                name: payload.name,
                email: payload.email,
                patron_type: payload.user_type,
                department: payload.department,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(ApiResponse::success(patron))
}

/// Soft delete: deactivate, keeping loan history
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.patrons.deactivate(&id).await?;
    Ok(ApiResponse::success("User deactivated"))
}
