use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::activity_log::ActivityLog;

/// An activity log entry to record.
pub struct ActivityEntry {
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub device_info: Option<String>,
}

/// Fire-and-forget activity log entry.
/// Spawns a background task — never blocks the request handler,
/// never propagates errors (logs a warning on failure).
pub fn log(pool: PgPool, entry: ActivityEntry) {
    tokio::spawn(async move {
        let res = sqlx::query(
            "INSERT INTO activity_logs (user_id, action, entity_type, entity_id, device_info)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.device_info)
        .execute(&pool)
        .await;

        if let Err(e) = res {
            tracing::warn!("activity log insert failed: {e}");
        }
    });
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid, limit: i64) -> ApiResult<Vec<ActivityLog>> {
    let entries = sqlx::query_as::<_, ActivityLog>(
        "SELECT * FROM activity_logs
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

pub async fn clear_for_user(pool: &PgPool, user_id: Uuid) -> ApiResult<u64> {
    let result = sqlx::query("DELETE FROM activity_logs WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
