pub mod assistant;
pub mod config;
