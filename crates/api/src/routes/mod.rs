pub mod admin;
pub mod auth;
pub mod comment;
pub mod dashboard;
pub mod member;
pub mod message;
pub mod notification;
pub mod project;
pub mod proposal;
pub mod status_request;
pub mod task;

use bson::{DateTime, oid::ObjectId};
use taskflow_db::models::TaskStatus;
use validator::ValidationError;

use crate::error::ApiError;

pub(crate) fn parse_id(raw: &str, field: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}

pub(crate) fn parse_ids(raw: &[String], field: &str) -> Result<Vec<ObjectId>, ApiError> {
    raw.iter().map(|id| parse_id(id, field)).collect()
}

pub(crate) fn hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

pub(crate) fn rfc3339(at: DateTime) -> String {
    at.to_chrono().to_rfc3339()
}

pub(crate) fn from_chrono(at: chrono::DateTime<chrono::Utc>) -> DateTime {
    DateTime::from_chrono(at)
}

/// Field validator for task status names.
pub(crate) fn known_status(value: &str) -> Result<(), ValidationError> {
    if TaskStatus::parse(value).is_some() {
        return Ok(());
    }
    let mut error = ValidationError::new("unknown_status");
    error.message = Some(
        format!(
            "must be one of {}",
            TaskStatus::ALL.map(|s| s.as_str()).join(", ")
        )
        .into(),
    );
    Err(error)
}
