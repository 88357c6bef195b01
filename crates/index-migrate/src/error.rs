//! Error types for index-migrate.

use std::path::PathBuf;

use thiserror::Error;

use crate::index::Category;

/// Result type alias for index-migrate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which orchestration phase a stage failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Listing and classifying source indices.
    Listing,
    /// Exporting and importing index content.
    Migration,
    /// Comparing source and target state.
    Validation,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listing => f.write_str("listing"),
            Self::Migration => f.write_str("migration"),
            Self::Validation => f.write_str("validation"),
        }
    }
}

const INSTALL_URL: &str =
    "https://www.algolia.com/doc/tools/cli/get-started/overview/#install-the-algolia-cli";

/// Errors that can occur while migrating or validating indices.
#[derive(Error, Debug)]
pub enum Error {
    /// The search service client tool could not be reached.
    #[error("Search client '{binary}' is not available: {reason}. Install it from {}", INSTALL_URL)]
    ToolUnavailable {
        /// Binary that was invoked.
        binary: String,
        /// Why the availability check failed.
        reason: String,
    },

    /// Required credential values are absent.
    #[error("Required profile data missing: {}", .0.join(", "))]
    ConfigMissing(Vec<String>),

    /// Configuration is present but invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Creating a credential profile failed.
    #[error("Failed to create profile '{profile}': {source}")]
    ProfileProvisioning {
        /// Profile name.
        profile: String,
        /// Underlying client error.
        #[source]
        source: Box<Error>,
    },

    /// A step of the listing, migration or validation phase failed.
    #[error("{phase} failed{}: {source}", describe_stage(.index, .category, .step))]
    Stage {
        /// Phase that was running.
        phase: Phase,
        /// Index being processed, if any.
        index: Option<String>,
        /// Category being processed, if any.
        category: Option<Category>,
        /// Step description (`export`, `import`, `list`, ...).
        step: &'static str,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },

    /// A search client command returned a failure.
    #[error("`{command}` exited with {status}: {stderr}")]
    Client {
        /// Command line, with secrets redacted.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The confirmation prompt could not be read.
    #[error("Confirmation prompt failed: {0}")]
    Prompt(String),

    /// Artifact file or directory error.
    #[error("Artifact error at {}: {source}", .path.display())]
    Artifact {
        /// Path being written or read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn describe_stage(index: &Option<String>, category: &Option<Category>, step: &str) -> String {
    match (index.as_deref(), *category) {
        (Some(index), Some(category)) => format!(" during {step} of {category} for '{index}'"),
        (Some(index), None) => format!(" during {step} for '{index}'"),
        (None, Some(category)) => format!(" during {step} of {category}"),
        (None, None) => format!(" during {step}"),
    }
}

impl Error {
    /// Wraps an error as a stage failure of `phase`.
    pub fn stage(phase: Phase, step: &'static str, source: Error) -> Self {
        Self::Stage {
            phase,
            index: None,
            category: None,
            step,
            source: Box::new(source),
        }
    }

    /// Wraps an error as a stage failure on a specific index and category.
    pub fn index_stage(
        phase: Phase,
        index: &str,
        category: Category,
        step: &'static str,
        source: Error,
    ) -> Self {
        Self::Stage {
            phase,
            index: Some(index.to_string()),
            category: Some(category),
            step,
            source: Box::new(source),
        }
    }

    /// Builds an artifact error for `path`.
    pub fn artifact(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Artifact {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is raised before any profile exists.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ToolUnavailable { .. } | Self::ConfigMissing(_) | Self::Config(_)
        )
    }
}
