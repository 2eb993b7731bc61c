pub mod client;
pub mod endpoints;
pub mod lenient;
pub mod models;
