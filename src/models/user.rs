use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Apple,
    Kakao,
    Anonymous,
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuthProvider::Apple => "apple",
            AuthProvider::Kakao => "kakao",
            AuthProvider::Anonymous => "anonymous",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apple" => Ok(AuthProvider::Apple),
            "kakao" => Ok(AuthProvider::Kakao),
            "anonymous" => Ok(AuthProvider::Anonymous),
            _ => Err(anyhow::anyhow!("Unknown auth provider: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub nickname: String,
    pub avatar_emoji: String,
    pub auth_provider: String,
    #[serde(skip_serializing)]
    pub auth_provider_id: String,
    pub language: String,
    pub notifications_enabled: bool,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PushToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String, // "android" | "ios"
    pub token: String,
    pub created_at: DateTime<Utc>,
}

// Request/Response DTOs

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub auth_provider: AuthProvider,
    pub auth_provider_id: String,
    /// Used when the login creates a new account.
    pub nickname: Option<String>,
    pub avatar_emoji: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
    pub is_new_user: bool,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub nickname: String,
    pub avatar_emoji: String,
    pub language: String,
    pub notifications_enabled: bool,
    pub is_premium: bool,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            nickname: u.nickname,
            avatar_emoji: u.avatar_emoji,
            language: u.language,
            notifications_enabled: u.notifications_enabled,
            is_premium: u.is_premium,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    pub avatar_emoji: Option<String>,
    pub language: Option<String>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPushTokenRequest {
    pub platform: String,
    pub token: String,
}
