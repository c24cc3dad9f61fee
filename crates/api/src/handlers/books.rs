//! Catalog endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use libman_business::{BookUpdate, NewBook};
use libman_core::Book;
use libman_persistence::BookFilter;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::handlers::{limit_or_default, page_or_default, ApiResponse, Pagination};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub category: String,
    pub isbn: Option<String>,
    pub published_year: Option<i64>,
    pub description: Option<String>,
    pub total_copies: i64,
    pub available_copies: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i64>,
    pub description: Option<String>,
    pub total_copies: Option<i64>,
    pub available_copies: Option<i64>,
}

/// List books with optional free-text search and category filter
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = page_or_default(query.page);
    let limit = limit_or_default(query.limit);
    let filter = BookFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        category: query.category.filter(|c| !c.trim().is_empty()),
        page,
        limit,
    };

    let (books, total) = state.catalog.list(&filter).await?;
    Ok(ApiResponse::paginated(
        books,
        Pagination::new(page, limit, total),
    ))
}

/// Distinct categories present in the catalog
pub async fn categories(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let categories = state.catalog.categories().await?;
    Ok(ApiResponse::success(categories))
}

/// Add a book to the catalog
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookRequest>,
) -> ApiResult<impl IntoResponse> {
    let book = state
        .catalog
        .create(NewBook {
            title: payload.title,
            author: payload.author,
            category: payload.category,
            isbn: payload.isbn,
            published_year: payload.published_year,
            description: payload.description,
            total_copies: payload.total_copies,
            available_copies: payload.available_copies,
        })
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::success(book)))
}

/// Get one book
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Book>>> {
    let book = state.catalog.get(&id).await?;
    Ok(ApiResponse::success(book))
}

/// Edit a book; shrinking the total re-clamps availability
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookRequest>,
) -> ApiResult<impl IntoResponse> {
    let book = state
        .catalog
        .update(
            &id,
            BookUpdate {
                title: payload.title,
                author: payload.author,
                category: payload.category,
                isbn: payload.isbn,
                published_year: payload.published_year,
                description: payload.description,
                total_copies: payload.total_copies,
                available_copies: payload.available_copies,
            },
        )
        .await?;
    Ok(ApiResponse::success(book))
}

/// Remove a book; refused while copies are still out
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.catalog.delete(&id).await?;
    Ok(ApiResponse::success("Book deleted"))
}
