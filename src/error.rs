//! Error types for the publish pipeline

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for publish operations
pub type Result<T> = std::result::Result<T, PublishError>;

/// Exit status used when a generation task is killed at its deadline
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Publish pipeline errors
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to prepare working structure at {}: {source}", .path.display())]
    Structure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiler '{name}' was not found in configuration (available: {})", .available.join(", "))]
    CompilerNotFound { name: String, available: Vec<String> },

    #[error("Multiple compilers configured ({}); select one with --set-compiler", .0.join(", "))]
    MultipleCompilers(Vec<String>),

    #[error("Schema not found: {name}{}", suggestion_suffix(.suggestions))]
    SchemaNotFound { name: String, suggestions: Vec<String> },

    #[error("Generation task failed with status {code}: {description}")]
    TaskFailed { description: String, code: i32 },

    #[error("Generation task timed out after {}s: {description}", .timeout.as_secs())]
    TaskTimedOut { description: String, timeout: Duration },

    #[error("Failed to launch {description}: {source}")]
    Spawn {
        description: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid worker manifest: {0}")]
    InvalidManifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl PublishError {
    /// Process exit status for this error.
    ///
    /// A failed task propagates its own status so the driver exits with
    /// exactly what the worker reported.
    pub fn exit_code(&self) -> i32 {
        match self {
            PublishError::TaskFailed { code, .. } => *code,
            PublishError::TaskTimedOut { .. } => TIMEOUT_EXIT_CODE,
            _ => 1,
        }
    }
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
