pub mod activity_log;
pub mod auth;
pub mod group;
pub mod help_request;
pub mod notification;
pub mod share;
pub mod user;
