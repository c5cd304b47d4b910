pub mod actors;
pub mod cli;
pub mod error;
pub mod github;
pub mod models;
pub mod render;
pub mod status;
pub mod types;
