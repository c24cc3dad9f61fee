//! API handlers, grouped per resource, plus the shared response envelope.

pub mod analytics;
pub mod books;
pub mod health;
pub mod loans;
pub mod patrons;

use axum::Json;
use serde::Serialize;

/// Response envelope every endpoint uses: `{success, data, error}` with an
/// optional pagination block on list endpoints.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            pagination: None,
        })
    }

    pub fn paginated(data: T, pagination: Pagination) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            pagination: Some(pagination),
        })
    }

    pub fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.into()),
            pagination: None,
        })
    }
}

/// Page defaults shared by every list endpoint.
pub fn page_or_default(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

pub fn limit_or_default(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}
