pub mod board;
pub mod config;
pub mod database;
pub mod docs;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod utils;

pub use config::AppConfig;
pub use database::Database;
pub use state::AppState;
