//! Error types for dwc-unify
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Per-value coercion failures and post-load verification findings are not
//! errors: they are reported as data (`CoercionStats`, `VerificationWarning`).

use thiserror::Error;

/// The main error type for dwc-unify
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Input / Schema Resolution Errors
    // ============================================================================
    #[error("Schema resolution failed: {message}")]
    SchemaResolution { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ============================================================================
    // Transformation Errors
    // ============================================================================
    #[error("Batch has no columns left after renaming ({context})")]
    EmptyColumnSet { context: String },

    #[error("Required column '{column}' not found in {context}")]
    MissingColumn { column: String, context: String },

    // ============================================================================
    // Arrow/Parquet/Object Store Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // Destination Store Errors
    // ============================================================================
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Batch {batch_index} failed to load into '{table}': {message}")]
    BatchLoad {
        table: String,
        batch_index: usize,
        message: String,
    },

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

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database {
            message: e.to_string(),
        }
    }
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

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a schema resolution error
    pub fn schema_resolution(message: impl Into<String>) -> Self {
        Self::SchemaResolution {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a batch load error
    pub fn batch_load(
        table: impl Into<String>,
        batch_index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::BatchLoad {
            table: table.into(),
            batch_index,
            message: message.into(),
        }
    }

    /// Whether this error must abort the current file or provider run.
    ///
    /// Only `BatchLoad` is recovered locally; everything else propagates.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::BatchLoad { .. })
    }

    /// Whether this error came from resolving inputs (directories, files, schemas)
    pub fn is_input_resolution(&self) -> bool {
        matches!(
            self,
            Error::SchemaResolution { .. } | Error::Validation { .. } | Error::FileNotFound { .. }
        )
    }
}

/// Result type alias for dwc-unify
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
