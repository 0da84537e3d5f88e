use reqwest::Client;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::notification::{Notification, NotificationKind};

/// A notification produced by a lifecycle operation, as data. The lifecycle
/// services return these; the route layer hands them to `dispatch`.
#[derive(Debug, Clone)]
pub struct NotificationIntent {
    pub recipient_user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub related_entity_type: String,
    pub related_entity_id: Uuid,
}

pub struct NotificationService {
    client: Client,
    fcm_api_key: Option<String>,
}

impl NotificationService {
    pub fn new(fcm_api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            fcm_api_key,
        }
    }

    /// Record an intent in the recipient's inbox and fan out push delivery.
    /// The inbox insert is durable; push is fire-and-forget.
    pub async fn dispatch(&self, pool: &PgPool, intent: NotificationIntent) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO notifications
                (user_id, type, title, body, related_entity_type, related_entity_id)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(intent.recipient_user_id)
        .bind(intent.kind.to_string())
        .bind(&intent.title)
        .bind(&intent.body)
        .bind(&intent.related_entity_type)
        .bind(intent.related_entity_id)
        .execute(pool)
        .await?;

        self.push_to_user(pool, &intent).await;
        Ok(())
    }

    pub async fn dispatch_all(&self, pool: &PgPool, intents: Vec<NotificationIntent>) -> ApiResult<()> {
        for intent in intents {
            self.dispatch(pool, intent).await?;
        }
        Ok(())
    }

    /// Push delivery to the recipient's registered devices. Respects the
    /// user's notifications_enabled flag; failures are logged, never surfaced.
    async fn push_to_user(&self, pool: &PgPool, intent: &NotificationIntent) {
        let tokens: Vec<(String, String)> = match sqlx::query_as(
            "SELECT pt.platform, pt.token
             FROM push_tokens pt
             JOIN users u ON u.id = pt.user_id
             WHERE pt.user_id = $1 AND u.notifications_enabled = TRUE",
        )
        .bind(intent.recipient_user_id)
        .fetch_all(pool)
        .await
        {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("push token lookup failed: {e}");
                return;
            }
        };

        for (_platform, token) in tokens {
            if let Err(e) = self.send_fcm(&token, intent).await {
                tracing::warn!("push delivery failed: {e}");
            }
        }
    }

    async fn send_fcm(&self, token: &str, intent: &NotificationIntent) -> anyhow::Result<()> {
        let api_key = match &self.fcm_api_key {
            Some(k) => k,
            None => {
                tracing::debug!("FCM not configured, skipping push notification");
                return Ok(());
            }
        };

        let payload = json!({
            "to": token,
            "notification": {
                "title": intent.title,
                "body": intent.body,
            },
            "data": {
                "type": intent.kind.to_string(),
                "related_entity_type": intent.related_entity_type,
                "related_entity_id": intent.related_entity_id,
            }
        });

        let response = self
            .client
            .post("https://fcm.googleapis.com/fcm/send")
            .header("Authorization", format!("key={}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("FCM error {}: {}", status, text);
        }

        Ok(())
    }

    // ── Inbox ───────────────────────────────────────────────────────────────

    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> ApiResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications
             WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(notifications)
    }

    /// The read flag and read_at are the only in-place mutations allowed on
    /// a notification. Idempotent: re-marking a read notification succeeds.
    pub async fn mark_read(pool: &PgPool, user_id: Uuid, id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications
             SET is_read = TRUE, read_at = COALESCE(read_at, now())
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> ApiResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = now()
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn register_push_token(
        pool: &PgPool,
        user_id: Uuid,
        platform: &str,
        token: &str,
    ) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO push_tokens (user_id, platform, token)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, token) DO NOTHING",
        )
        .bind(user_id)
        .bind(platform)
        .bind(token)
        .execute(pool)
        .await?;
        Ok(())
    }
}
