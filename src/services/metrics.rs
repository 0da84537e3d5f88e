use lazy_static::lazy_static;
use prometheus::{register_counter, register_gauge, Counter, Gauge};
use sqlx::PgPool;
use tracing::warn;

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref SHARES_CREATED: Counter = register_counter!(
        "api_shares_created_total",
        "Shares recorded"
    ).unwrap();

    pub static ref SHARES_CONFIRMED: Counter = register_counter!(
        "api_shares_confirmed_total",
        "Shares confirmed by their receiver"
    ).unwrap();

    pub static ref SHARES_DISPUTED: Counter = register_counter!(
        "api_shares_disputed_total",
        "Shares disputed by their receiver"
    ).unwrap();

    pub static ref HELP_REQUESTS_CREATED: Counter = register_counter!(
        "api_help_requests_created_total",
        "Help requests opened"
    ).unwrap();

    pub static ref HELP_REQUESTS_CLAIMED: Counter = register_counter!(
        "api_help_requests_claimed_total",
        "Help requests claimed"
    ).unwrap();

    pub static ref GROUP_JOINS: Counter = register_counter!(
        "api_group_joins_total",
        "Successful invite-code joins"
    ).unwrap();

    // ── Business gauges (refreshed from the database) ───────────────────────
    pub static ref ACTIVE_GROUPS_GAUGE: Gauge = register_gauge!(
        "dayshare_groups_active_total",
        "Non-archived groups"
    ).unwrap();

    pub static ref USERS_GAUGE: Gauge = register_gauge!(
        "dayshare_users_total",
        "Registered users"
    ).unwrap();

    pub static ref TIME_EXCHANGED_GAUGE: Gauge = register_gauge!(
        "dayshare_time_exchanged_seconds_total",
        "Confirmed non-deleted share time across all groups, in seconds"
    ).unwrap();
}

/// Refresh the business gauges from the database. Called from the /metrics
/// handler before encoding; failures are logged, never surfaced.
pub async fn refresh_gauges(pool: &PgPool) {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups WHERE is_archived = FALSE")
        .fetch_one(pool)
        .await
    {
        Ok(count) => ACTIVE_GROUPS_GAUGE.set(count as f64),
        Err(e) => warn!("metrics: group count failed: {e}"),
    }

    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
    {
        Ok(count) => USERS_GAUGE.set(count as f64),
        Err(e) => warn!("metrics: user count failed: {e}"),
    }

    match sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(duration_seconds), 0) FROM shares
         WHERE status = 'confirmed' AND is_deleted = FALSE",
    )
    .fetch_one(pool)
    .await
    {
        Ok(total) => TIME_EXCHANGED_GAUGE.set(total as f64),
        Err(e) => warn!("metrics: time exchanged sum failed: {e}"),
    }
}
