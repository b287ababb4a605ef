//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Outcome of a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub id: String,
    pub attempts: u64,
    pub allowed: bool,
    /// Warning or rejection message, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Contents of a whitelist or blocklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub list: String,
    pub ids: Vec<String>,
}

/// Optional single-id filter for list queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub id: Option<String>,
}
