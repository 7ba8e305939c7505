pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod proxy;
pub mod sessions;
pub mod sheets;
pub mod uploads;

pub use db::create_pool;
