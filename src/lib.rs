pub mod analysis;
pub mod api;
pub mod benchmark;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod summary;
