//! Client-related types shared between server and clients
//!
//! Request/response bodies of the public HTTP surface, used by staff apps
//! and by the entry/exit sensor firmware.

use serde::{Deserialize, Serialize};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response (`POST /api-auth-token`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Table bound to this account, if any
    pub table: Option<i64>,
    pub is_staff: bool,
}

/// Current user status (`GET /user-status`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatus {
    pub username: String,
    pub table: Option<i64>,
    pub is_staff: bool,
}

// =============================================================================
// Visitor API DTOs
// =============================================================================

/// Plain acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn success() -> Self {
        Self {
            message: "success".to_string(),
        }
    }
}

/// Current visitor count (`GET /count`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub amount: i64,
}

/// One point of the statistics window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatPoint {
    pub date: chrono::DateTime<chrono::Utc>,
    pub amount: i64,
}

/// Statistics window (`GET /stat`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatResponse {
    pub stat: Vec<StatPoint>,
}

/// One row of the visitor log (`GET /log`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub log_time: chrono::DateTime<chrono::Utc>,
    pub amount: i64,
}
