//! Core library for pumble - a client for the Pumble team-messaging API.
//!
//! This crate provides:
//! - An async API client authenticated with a Pumble API key
//! - Normalized message, channel and user records
//! - Cursor pagination and client-side search over channel history
//! - Configuration loading, path resolution and schema generation
//! - Common types and error handling

pub mod config;
pub mod error;
pub mod paths;
pub mod pumble;
pub mod schema;

pub use config::{ApiConfig, AppConfig, LogLevel, LoggingConfig};
pub use error::{CoreError, Result};
pub use paths::AppPaths;
pub use pumble::{
    Channel, HttpTransport, Message, MessageCollection, PumbleService, SendAs, Transport, User,
};
pub use schema::{generate_example_config, generate_schema, write_generated_files};

/// Application name used for config directories and environment prefix.
pub const APP_NAME: &str = "pumble";

/// Environment variable holding the API key. Takes precedence over the config file.
pub const API_KEY_ENV: &str = "PUMBLE_API_KEY";

/// Returns the environment variable prefix for this application.
#[must_use]
pub fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
