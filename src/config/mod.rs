//! Configuration module

pub mod settings;

pub use settings::{
    GeminiConfig, LoggingConfig, RateLimitConfig, ServerConfig, Settings, StorageConfig,
};
