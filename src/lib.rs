pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod stats;

/// Application name for XDG paths
pub const APP_NAME: &str = "notestats";
