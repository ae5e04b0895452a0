pub mod api;
pub mod auth;
pub mod config;
pub mod export;
pub mod output;
pub mod report;
pub mod session;
pub mod upload;
pub mod validate;
