use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HelpRequestStatus {
    Open,
    Claimed,
    Completed,
    Cancelled,
}

impl std::fmt::Display for HelpRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HelpRequestStatus::Open => "open",
            HelpRequestStatus::Claimed => "claimed",
            HelpRequestStatus::Completed => "completed",
            HelpRequestStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for HelpRequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(HelpRequestStatus::Open),
            "claimed" => Ok(HelpRequestStatus::Claimed),
            "completed" => Ok(HelpRequestStatus::Completed),
            "cancelled" => Ok(HelpRequestStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Unknown help request status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HelpRequest {
    pub id: Uuid,
    pub group_id: Uuid,
    pub requester_id: Uuid,
    pub description: String,
    pub estimated_duration_seconds: i64,
    pub needed_by: Option<DateTime<Utc>>,
    pub status: String,
    pub claimed_by: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resulting_share_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request/Response DTOs

#[derive(Debug, Deserialize)]
pub struct CreateHelpRequestRequest {
    pub description: String,
    pub estimated_duration_seconds: i64,
    pub needed_by: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteHelpRequestRequest {
    pub resulting_share_id: Uuid,
}
