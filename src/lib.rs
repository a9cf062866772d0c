pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod services;
pub mod store;
pub mod types;
