// src/lib.rs

pub mod db;
pub mod config;
pub mod repositories;
pub mod auth;
pub mod sheets;
pub mod analytics;

pub use db::Database;
pub use botwizard_common::error::Error;
pub use config::GoogleConfig;
