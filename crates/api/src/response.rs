//! Shared response envelope types for API handlers.
//!
//! Every JSON response uses the `{success, message, data?}` envelope; `data`
//! is omitted entirely on failure. Use [`Envelope`] instead of ad-hoc
//! `serde_json::json!` so serialization stays consistent.

use serde::{Deserialize, Serialize};

/// Standard `{success, message, data?}` response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// Successful response carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Failed response. `data` is omitted.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl Envelope<serde_json::Value> {
    /// Successful response with no payload.
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// List wrapper with pagination metadata, for large result sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PaginatedResponse<T> {
    /// Assemble a page from its items and the total row count.
    pub fn from_page(items: Vec<T>, page: i64, size: i64, total_items: i64) -> Self {
        let total_pages = if size > 0 {
            (total_items + size - 1) / size
        } else {
            0
        };
        Self {
            items,
            current_page: page,
            page_size: size,
            total_pages,
            total_items,
            has_next: page + 1 < total_pages,
            has_previous: page > 0,
        }
    }
}
