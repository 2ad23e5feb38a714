// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub text: String,
    pub order_index: i32,
}

/// A recorded vote. Rows are append-only; the anonymous signals are kept
/// even for authenticated voters, and `user_id` is the tag that decides
/// which uniqueness key the store applies.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ip_address: String,
    pub user_agent: String,
    pub session_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Client-submitted poll shape, shared by the create and update paths.
#[derive(Debug, Clone, Deserialize)]
pub struct PollPayload {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PollDetail {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionTally {
    pub option_id: Uuid,
    pub text: String,
    pub count: i64,
    pub percentage: f64,
    pub order_index: i32,
}

#[derive(Debug, Serialize)]
pub struct PollResults {
    pub poll_id: Uuid,
    pub total_votes: i64,
    pub tallies: Vec<OptionTally>,
}
