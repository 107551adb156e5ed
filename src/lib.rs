pub mod app;
pub mod assume_role;
pub mod config;
pub mod context;
pub mod gateway;
pub mod handler;
pub mod metrics;
