pub mod activity;
pub mod api;
pub mod auth;
pub mod config;
pub mod consumption;
pub mod db;
pub mod error;
pub mod reminders;
pub mod store;
