/// Database configuration and connection management
pub mod database;

/// Host settings loaded from environment variables
pub mod settings;
