//! Error types for scheme resolution and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring, resolving or applying a color scheme.
#[derive(Debug, Error)]
pub enum SchemeError {
    /// No palette name in the fallback chain resolves to a known palette.
    #[error("invalid color scheme configuration: no palette named '{name}'")]
    InvalidConfiguration {
        /// The last name that was tried.
        name: String,
    },

    /// The platform is being followed but no platform scheme detector matches.
    #[error("no platform color scheme currently matches")]
    UnresolvableSystemScheme,

    /// An optional collaborator required by the operation was not supplied.
    #[error("missing {0}")]
    MissingCollaborator(&'static str),

    /// Two palettes share a name.
    #[error("duplicate palette '{0}'")]
    DuplicatePalette(String),

    /// Two platform schemes share a name.
    #[error("duplicate platform scheme '{0}'")]
    DuplicatePlatformScheme(String),

    /// A palette was named with the reserved follow-the-platform identifier.
    #[error("'{0}' is reserved and cannot name a palette")]
    ReservedPaletteName(String),

    /// An override references a platform scheme that is not configured.
    #[error("unknown platform scheme '{0}'")]
    UnknownPlatformScheme(String),

    /// A color value could not be split into numeric components.
    #[error("invalid color '{value}': {message}")]
    InvalidColor { value: String, message: String },

    /// The storage collaborator failed.
    #[error("settings storage error: {0}")]
    Storage(String),

    /// Configuration or palette file could not be parsed.
    #[error("failed to load configuration{}: {message}", display_path(.path))]
    Config {
        path: Option<PathBuf>,
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemeError {
    pub(crate) fn invalid(name: impl Into<String>) -> Self {
        Self::InvalidConfiguration { name: name.into() }
    }

    pub(crate) fn config(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path,
            message: message.into(),
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

/// Result type for scheme operations.
pub type Result<T> = std::result::Result<T, SchemeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_display() {
        let err = SchemeError::invalid("nonexistent");
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_config_error_display_with_path() {
        let err = SchemeError::config(Some(PathBuf::from("/tmp/schemes.yaml")), "bad yaml");
        let msg = err.to_string();
        assert!(msg.contains("/tmp/schemes.yaml"));
        assert!(msg.contains("bad yaml"));
    }

    #[test]
    fn test_config_error_display_without_path() {
        let err = SchemeError::config(None, "bad yaml");
        assert_eq!(err.to_string(), "failed to load configuration: bad yaml");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SchemeError = io_err.into();
        assert!(matches!(err, SchemeError::Io(_)));
    }
}
