//! Error types for vpclookup.
//!
//! This module defines the error types used throughout the crate. Every
//! failure mode of a run is reported explicitly: an unmet version
//! constraint, an unknown credential profile, an API failure, or a lookup
//! that matched zero or several VPCs all surface as distinct variants.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vpclookup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for vpclookup.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Descriptor Errors
    // ========================================================================
    /// Error parsing a descriptor file.
    #[error("Failed to parse descriptor '{path}': {message}")]
    DescriptorParse {
        /// Path to the descriptor file
        path: PathBuf,
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The descriptor parsed but is structurally invalid.
    #[error("Descriptor validation failed: {0}")]
    DescriptorValidation(String),

    /// An output expression could not be parsed.
    #[error("Invalid reference '{expression}': {message}")]
    InvalidReference {
        /// The offending expression
        expression: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Version Constraint Errors
    // ========================================================================
    /// A version constraint string is malformed.
    #[error("Invalid version constraint '{constraint}': {message}")]
    InvalidConstraint {
        /// The constraint as written
        constraint: String,
        /// Error message
        message: String,
    },

    /// A provider or the engine itself does not satisfy a declared constraint.
    #[error("{subject} version {actual} does not satisfy constraint '{constraint}'")]
    UnsatisfiedConstraint {
        /// What was checked (provider name or "vpclookup")
        subject: String,
        /// The version that was available
        actual: String,
        /// The declared constraint
        constraint: String,
    },

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// No plugin is registered under the requested provider name.
    #[error("Provider '{0}' is not available in this build")]
    ProviderNotFound(String),

    /// Provider configuration could not be initialized.
    #[error("Failed to configure provider '{provider}': {message}")]
    ProviderConfig {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// A call against the cloud API failed.
    #[error("{operation} failed: {message}")]
    Api {
        /// API operation name
        operation: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Credential Errors
    // ========================================================================
    /// The named credential profile is not defined in any AWS file.
    #[error("Credential profile '{profile}' not found (searched: {})", format_paths(.searched))]
    ProfileNotFound {
        /// Profile name
        profile: String,
        /// Files that were searched
        searched: Vec<PathBuf>,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// A data lookup matched nothing.
    #[error("Data source '{address}' matched no results")]
    NoMatchingResource {
        /// Data source address, e.g. `data.aws_vpc.default`
        address: String,
    },

    /// A data lookup matched more than one result.
    #[error("Data source '{address}' matched {count} results ({}); exactly one is required", .ids.join(", "))]
    AmbiguousMatch {
        /// Data source address
        address: String,
        /// Number of matches
        count: usize,
        /// Identifiers of the matches
        ids: Vec<String>,
    },

    /// A data lookup declared no criteria.
    #[error("Data source '{0}' declares no filter criteria")]
    EmptyFilter(String),

    // ========================================================================
    // Output Errors
    // ========================================================================
    /// An output name was requested that the descriptor does not declare.
    #[error("Output '{0}' is not declared")]
    OutputNotFound(String),

    /// A referenced attribute has no value on the resolved data.
    #[error("Attribute '{attribute}' of '{address}' has no value")]
    MissingAttribute {
        /// Data source address
        address: String,
        /// Attribute name
        attribute: String,
    },

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "none".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Creates a new descriptor parse error.
    pub fn descriptor_parse(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::DescriptorParse {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Creates a new invalid constraint error.
    pub fn invalid_constraint(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    /// Creates a new API error.
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a new provider configuration error.
    pub fn provider_config(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderConfig {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DescriptorParse { .. }
            | Error::DescriptorValidation(_)
            | Error::InvalidReference { .. }
            | Error::YamlParse(_)
            | Error::TomlParse(_)
            | Error::JsonParse(_) => 4,
            Error::InvalidConstraint { .. }
            | Error::UnsatisfiedConstraint { .. }
            | Error::ProviderNotFound(_) => 5,
            Error::ProfileNotFound { .. } | Error::ProviderConfig { .. } => 3,
            Error::NoMatchingResource { .. }
            | Error::AmbiguousMatch { .. }
            | Error::EmptyFilter(_) => 2,
            Error::Api { .. } => 6,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
