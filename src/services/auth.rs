use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::auth::{Claims, RefreshClaims};
use crate::models::user::{
    LoginRequest, LoginResponse, RefreshToken, UpdateProfileRequest, User, UserProfile,
};
use crate::services::validation;

pub struct AuthService;

impl AuthService {
    /// Provider-based sign-in: the app authenticates with Apple/Kakao (or
    /// anonymously) and presents the provider's stable user id. First login
    /// creates the account; later logins return the existing one.
    pub async fn login(
        pool: &PgPool,
        req: &LoginRequest,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> ApiResult<LoginResponse> {
        if req.auth_provider_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("로그인 정보가 올바르지 않습니다".into()));
        }

        let existing = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE auth_provider = $1 AND auth_provider_id = $2",
        )
        .bind(req.auth_provider.to_string())
        .bind(&req.auth_provider_id)
        .fetch_optional(pool)
        .await?;

        let (user, is_new_user) = match existing {
            Some(user) => {
                sqlx::query("UPDATE users SET last_active_at = now() WHERE id = $1")
                    .bind(user.id)
                    .execute(pool)
                    .await?;
                (user, false)
            }
            None => {
                let nickname = match &req.nickname {
                    Some(n) => validation::nickname(n)?,
                    None => return Err(ApiError::InvalidInput("닉네임을 입력해 주세요".into())),
                };
                let user = sqlx::query_as::<_, User>(
                    "INSERT INTO users (nickname, avatar_emoji, auth_provider, auth_provider_id, language)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING *",
                )
                .bind(&nickname)
                .bind(req.avatar_emoji.as_deref().unwrap_or("🙂"))
                .bind(req.auth_provider.to_string())
                .bind(&req.auth_provider_id)
                .bind(req.language.as_deref().unwrap_or("ko"))
                .fetch_one(pool)
                .await?;
                (user, true)
            }
        };

        let access_token = Self::generate_access_token(user.id, jwt_secret, access_ttl)?;
        let refresh_token =
            Self::issue_refresh_token(pool, user.id, refresh_secret, refresh_ttl_days).await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: user.into(),
            is_new_user,
        })
    }

    /// Rotate a refresh token: validate, revoke the presented one, issue a
    /// fresh pair.
    pub async fn refresh(
        pool: &PgPool,
        presented: &str,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> ApiResult<(String, String)> {
        let key = jsonwebtoken::DecodingKey::from_secret(refresh_secret.as_bytes());
        let mut validation = jsonwebtoken::Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let claims = jsonwebtoken::decode::<RefreshClaims>(presented, &key, &validation)
            .map_err(|_| ApiError::Unauthorized("세션이 만료되었습니다. 다시 로그인해 주세요".into()))?
            .claims;
        let jti: Uuid = claims
            .jti
            .parse()
            .map_err(|_| ApiError::Unauthorized("세션이 만료되었습니다. 다시 로그인해 주세요".into()))?;
        let user_id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("세션이 만료되었습니다. 다시 로그인해 주세요".into()))?;

        let stored = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE id = $1 AND user_id = $2",
        )
        .bind(jti)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("세션이 만료되었습니다. 다시 로그인해 주세요".into()))?;

        if stored.revoked
            || stored.expires_at < Utc::now()
            || stored.token_hash != hash_token(presented)
        {
            return Err(ApiError::Unauthorized(
                "세션이 만료되었습니다. 다시 로그인해 주세요".into(),
            ));
        }

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(jti)
            .execute(pool)
            .await?;

        let access_token = Self::generate_access_token(user_id, jwt_secret, access_ttl)?;
        let refresh_token =
            Self::issue_refresh_token(pool, user_id, refresh_secret, refresh_ttl_days).await?;
        Ok((access_token, refresh_token))
    }

    pub async fn me(pool: &PgPool, user_id: Uuid) -> ApiResult<UserProfile> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("사용자를 찾을 수 없습니다".into()))?;
        Ok(user.into())
    }

    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> ApiResult<UserProfile> {
        let nickname = match &req.nickname {
            Some(n) => Some(validation::nickname(n)?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET nickname = COALESCE($2, nickname),
                 avatar_emoji = COALESCE($3, avatar_emoji),
                 language = COALESCE($4, language),
                 notifications_enabled = COALESCE($5, notifications_enabled),
                 last_active_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(user_id)
        .bind(nickname)
        .bind(&req.avatar_emoji)
        .bind(&req.language)
        .bind(req.notifications_enabled)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("사용자를 찾을 수 없습니다".into()))?;
        Ok(user.into())
    }

    fn generate_access_token(user_id: Uuid, secret: &str, ttl_seconds: u64) -> ApiResult<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(anyhow::Error::from)?;
        Ok(token)
    }

    async fn issue_refresh_token(
        pool: &PgPool,
        user_id: Uuid,
        secret: &str,
        ttl_days: u64,
    ) -> ApiResult<String> {
        let jti = Uuid::new_v4();
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: jti.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + chrono::Duration::days(ttl_days as i64)).timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(anyhow::Error::from)?;

        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(jti)
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(now + chrono::Duration::days(ttl_days as i64))
        .execute(pool)
        .await?;

        Ok(token)
    }
}

/// Refresh tokens are high-entropy JWTs, so a plain SHA-256 digest is enough
/// for at-rest storage.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_deterministic_and_opaque() {
        let h1 = hash_token("token-a");
        let h2 = hash_token("token-a");
        let h3 = hash_token("token-b");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
        assert!(!h1.contains("token"));
    }
}
