use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Creator,
    Member,
}

impl std::fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MembershipRole::Creator => "creator",
            MembershipRole::Member => "member",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MembershipRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(MembershipRole::Creator),
            "member" => Ok(MembershipRole::Member),
            _ => Err(anyhow::anyhow!("Unknown membership role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub emoji: String,
    pub max_members: i16,
    pub is_archived: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub invite_code: String,
    pub invite_expires_at: DateTime<Utc>,
}

impl Group {
    /// Invite codes expire by wall-clock comparison only; used codes stay
    /// valid until expiry.
    pub fn is_invite_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.invite_expires_at
    }
}

/// Row struct — role fetched as TEXT, same pattern as User.auth_provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMembership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub role: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

// Request/Response DTOs

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub emoji: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinGroupRequest {
    pub invite_code: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct GroupMemberDto {
    pub user_id: Uuid,
    pub nickname: String,
    pub avatar_emoji: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BalanceSummaryResponse {
    pub group_id: Uuid,
    pub entries: Vec<BalanceEntryDto>,
    pub total_time_exchanged_seconds: i64,
    pub is_balanced: bool,
}

#[derive(Debug, Serialize)]
pub struct BalanceEntryDto {
    pub user_id: Uuid,
    pub nickname: String,
    pub avatar_emoji: String,
    pub balance_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn group_expiring_at(expires: DateTime<Utc>) -> Group {
        Group {
            id: Uuid::new_v4(),
            name: "우리 가족".into(),
            emoji: "👥".into(),
            max_members: 5,
            is_archived: false,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
            invite_code: "AB12CD34".into(),
            invite_expires_at: expires,
        }
    }

    #[test]
    fn invite_valid_until_expiry() {
        let now = Utc::now();
        let group = group_expiring_at(now + Duration::hours(24));

        assert!(group.is_invite_valid(now));
        assert!(group.is_invite_valid(now + Duration::hours(24) - Duration::seconds(1)));
        assert!(!group.is_invite_valid(now + Duration::hours(24)));
        assert!(!group.is_invite_valid(now + Duration::hours(24) + Duration::seconds(1)));
    }
}
