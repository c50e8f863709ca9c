//! Page-level operations. Each call validates input, scopes every query to
//! the session user and goes through the gateway.

pub mod account;
pub mod files;
pub mod overview;
pub mod projects;
pub mod tasks;
