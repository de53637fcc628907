/// Admin account configuration from environment variables
pub mod admin;

/// Database configuration and connection management
pub mod database;

/// Store, pricing and seed catalog loading from config.toml
pub mod store;
