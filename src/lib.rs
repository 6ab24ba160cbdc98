pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod query;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;
pub mod view;
