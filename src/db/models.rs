use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted violation awaiting staff review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewLog {
    pub id: Uuid,
    pub camera_number: String,
    pub date: String,
    pub time: String,
    pub violation: String,
    pub violation_id: String,
    pub url: Option<String>,
    pub confidence: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
