use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dayshare_api::config::Config;
use dayshare_api::middleware::auth::JwtSecret;
use dayshare_api::services::notifications::NotificationService;
use dayshare_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let notifications = Arc::new(NotificationService::new(config.fcm_api_key.clone()));
    if config.fcm_api_key.is_some() {
        info!("FCM push configured");
    } else {
        info!("FCM not configured — push delivery disabled");
    }

    let state = AppState {
        db: pool,
        config: config.clone(),
        notifications,
    };

    // The clients are native mobile apps, so CORS only matters for tooling.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(AllowOrigin::any());

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Auth
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh_token))
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/push-token", post(routes::auth::register_push_token))
        .route("/users/me", put(routes::users::update_me))
        // Groups
        .route("/groups", get(routes::groups::list_groups).post(routes::groups::create_group))
        .route("/groups/join", post(routes::groups::join_group))
        .route("/groups/{id}", get(routes::groups::get_group))
        .route("/groups/{id}/members", get(routes::groups::list_members))
        .route("/groups/{id}/leave", post(routes::groups::leave_group))
        .route("/groups/{id}/archive", post(routes::groups::archive_group))
        .route("/groups/{id}/invite", post(routes::groups::regenerate_invite))
        // Balance (ledger)
        .route("/groups/{id}/balance", get(routes::groups::balance_summary))
        .route("/groups/{id}/balance/me", get(routes::groups::my_balance))
        // Shares
        .route("/groups/{id}/shares", get(routes::shares::list_shares).post(routes::shares::create_share))
        .route("/shares/{id}/confirm", post(routes::shares::confirm_share))
        .route("/shares/{id}/dispute", post(routes::shares::dispute_share))
        .route("/shares/{id}", delete(routes::shares::delete_share))
        // Help requests
        .route("/groups/{id}/help-requests", get(routes::help_requests::list_help_requests).post(routes::help_requests::create_help_request))
        .route("/help-requests/{id}/claim", post(routes::help_requests::claim_help_request))
        .route("/help-requests/{id}/complete", post(routes::help_requests::complete_help_request))
        .route("/help-requests/{id}/cancel", post(routes::help_requests::cancel_help_request))
        // Notifications
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/read-all", post(routes::notifications::mark_all_read))
        .route("/notifications/{id}/read", post(routes::notifications::mark_read))
        .route("/notifications/{id}", delete(routes::notifications::delete_notification))
        // Activity log
        .route("/activity", get(routes::activity_log::list_my_activity).delete(routes::activity_log::clear_my_activity))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("DayShare API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
