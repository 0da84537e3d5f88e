//! Demo data seed script
//!
//! Seeds a demo group with realistic Korean-language data:
//! - 4 users (민수, 지은, 서준, 하은)
//! - 1 group: 우리 가족, all four as members with staggered joins
//! - 8 shares (6 confirmed, 2 pending) across the common categories
//! - 2 help requests (1 open, 1 claimed)
//!
//! Usage:
//!   DATABASE_URL=... ./seed-demo
//!
//! Environment variables:
//!   DATABASE_URL — PostgreSQL connection string (required)

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use std::env;
use uuid::Uuid;

use dayshare_api::db;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL required")?;

    println!("=== Seed Demo Data ===");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("connect to database")?;
    db::run_migrations(&pool).await?;

    let now = Utc::now();

    // Users
    let profiles = [("민수", "👨"), ("지은", "👩"), ("서준", "👦"), ("하은", "👧")];
    let mut users: Vec<Uuid> = Vec::new();
    for (i, (nickname, emoji)) in profiles.iter().enumerate() {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (nickname, avatar_emoji, auth_provider, auth_provider_id, created_at)
             VALUES ($1, $2, 'anonymous', $3, $4)
             ON CONFLICT (auth_provider, auth_provider_id) DO UPDATE SET nickname = EXCLUDED.nickname
             RETURNING id",
        )
        .bind(nickname)
        .bind(emoji)
        .bind(format!("demo-user-{i}"))
        .bind(now - Duration::days(30 - i as i64))
        .fetch_one(&pool)
        .await?;
        users.push(id);
        println!("user {nickname} {id}");
    }

    // Group with staggered memberships
    let group_id: Uuid = sqlx::query_scalar(
        "INSERT INTO groups (name, emoji, created_by, created_at, invite_code, invite_expires_at)
         VALUES ('우리 가족', '👨‍👩‍👧‍👦', $1, $2, 'DEMO0000', $3)
         RETURNING id",
    )
    .bind(users[0])
    .bind(now - Duration::days(30))
    .bind(now + Duration::hours(24))
    .fetch_one(&pool)
    .await?;
    println!("group 우리 가족 {group_id}");

    for (i, user_id) in users.iter().enumerate() {
        sqlx::query(
            "INSERT INTO group_memberships (user_id, group_id, role, joined_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(group_id)
        .bind(if i == 0 { "creator" } else { "member" })
        .bind(now - Duration::days(30 - i as i64))
        .execute(&pool)
        .await?;
    }

    // Shares: (giver, receiver, description, category, hours, confirmed)
    let shares = [
        (0usize, 1usize, "아이 돌봄", "childcare", 2.0, true),
        (1, 0, "장보기 대신", "errands", 1.0, true),
        (0, 2, "학교 픽업", "transport", 0.5, true),
        (2, 3, "숙제 도와주기", "other", 1.5, true),
        (3, 0, "집안일 도움", "housework", 2.0, true),
        (1, 3, "저녁 식사 준비", "cooking", 1.5, true),
        (0, 1, "병원 동행", "transport", 3.0, false),
        (2, 1, "짐 옮기기", "housework", 1.0, false),
    ];

    for (i, (giver, receiver, description, category, hours, confirmed)) in shares.iter().enumerate() {
        let occurred_at = now - Duration::days(i as i64);
        sqlx::query(
            "INSERT INTO shares
                (group_id, giver_user_id, receiver_user_id, description, category, occurred_at,
                 duration_seconds, status, confirmed_at, confirmed_by, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $2, $6)",
        )
        .bind(group_id)
        .bind(users[*giver])
        .bind(users[*receiver])
        .bind(description)
        .bind(category)
        .bind(occurred_at)
        .bind((hours * 3600.0) as i64)
        .bind(if *confirmed { "confirmed" } else { "pending" })
        .bind(confirmed.then(|| occurred_at + Duration::hours(1)))
        .bind(confirmed.then(|| users[*receiver]))
        .execute(&pool)
        .await?;
    }
    println!("{} shares", shares.len());

    // Help requests: one open, one claimed
    sqlx::query(
        "INSERT INTO help_requests
            (group_id, requester_id, description, estimated_duration_seconds, needed_by)
         VALUES ($1, $2, '내일 아이 하원 부탁해요', 7200, $3)",
    )
    .bind(group_id)
    .bind(users[1])
    .bind(now + Duration::days(1))
    .execute(&pool)
    .await?;

    sqlx::query(
        "INSERT INTO help_requests
            (group_id, requester_id, description, estimated_duration_seconds,
             status, claimed_by, claimed_at)
         VALUES ($1, $2, '주말에 이사 짐 정리 도와주실 분', 10800, 'claimed', $3, $4)",
    )
    .bind(group_id)
    .bind(users[3])
    .bind(users[0])
    .bind(now - Duration::hours(2))
    .execute(&pool)
    .await?;
    println!("2 help requests");

    println!("Done.");
    Ok(())
}
