pub mod analyzer;
pub mod api;
pub mod config;
pub mod data_models;
pub mod error;
pub mod research;
pub mod search;
pub mod vision;
