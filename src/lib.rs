pub mod accordion;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod session;
pub mod stats;
pub mod upstream;
