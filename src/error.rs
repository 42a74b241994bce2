//! Error types for the songplays ETL job
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every error is fatal: the job is fail-fast and never retries.

use thiserror::Error;

/// The main error type for the ETL job
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    // ============================================================================
    // Engine Errors
    // ============================================================================
    #[error("Engine error: {0}")]
    Engine(#[from] duckdb::Error),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Unsupported column type for '{column}': {data_type}")]
    UnsupportedType { column: String, data_type: String },

    #[error("Schema mismatch in relation '{relation}': {message}")]
    SchemaMismatch { relation: String, message: String },

    #[error("Upstream relation '{relation}' has no output at {location}")]
    MissingDependency { relation: String, location: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(relation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            relation: relation.into(),
            message: message.into(),
        }
    }

    /// Create a missing upstream relation error
    pub fn missing_dependency(relation: impl Into<String>, location: impl Into<String>) -> Self {
        Self::MissingDependency {
            relation: relation.into(),
            location: location.into(),
        }
    }
}

/// Result type alias for the ETL job
pub type Result<T> = std::result::Result<T, Error>;
