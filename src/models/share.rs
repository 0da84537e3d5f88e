use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum duration of a single share: 24 hours.
pub const MAX_SHARE_DURATION_SECONDS: i64 = 86_400;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Pending,
    Confirmed,
    Disputed,
}

impl std::fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShareStatus::Pending => "pending",
            ShareStatus::Confirmed => "confirmed",
            ShareStatus::Disputed => "disputed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ShareStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShareStatus::Pending),
            "confirmed" => Ok(ShareStatus::Confirmed),
            "disputed" => Ok(ShareStatus::Disputed),
            _ => Err(anyhow::anyhow!("Unknown share status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Share {
    pub id: Uuid,
    pub group_id: Uuid,
    pub giver_user_id: Uuid,
    pub receiver_user_id: Uuid,
    pub description: String,
    pub category: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub status: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<Uuid>,
    pub thank_you_note: Option<String>,
    pub created_by: Uuid,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Share {
    /// Only confirmed, non-deleted shares count toward balances.
    pub fn counts_toward_balance(&self) -> bool {
        self.status == ShareStatus::Confirmed.to_string() && !self.is_deleted
    }
}

// Request/Response DTOs

#[derive(Debug, Deserialize)]
pub struct CreateShareRequest {
    pub giver_user_id: Uuid,
    pub receiver_user_id: Uuid,
    pub description: String,
    pub category: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmShareRequest {
    pub thank_you_note: Option<String>,
}
