pub mod activity_log;
pub mod auth;
pub mod groups;
pub mod health;
pub mod help_requests;
pub mod metrics;
pub mod notifications;
pub mod shares;
pub mod users;
