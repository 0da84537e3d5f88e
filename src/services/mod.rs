pub mod activity;
pub mod auth;
pub mod groups;
pub mod help_requests;
pub mod ledger;
pub mod metrics;
pub mod notifications;
pub mod shares;
pub mod validation;
