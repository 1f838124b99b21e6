//! Shared types for the Ranlao pub service
//!
//! Common types used by the server and its clients (staff apps, entry/exit
//! sensors): error types, response structures, domain models and DTOs.

pub mod client;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
