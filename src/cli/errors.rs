//! CLI error types
//!
//! Error codes:
//! - CLI_CONFIG_INVALID
//! - CLI_IO_FAILED
//! - CLI_JSON_INVALID
//! - CLI_DECLARATION_FAILED
//! - CLI_RECORDS_REJECTED

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::ModelError;

/// Failures surfaced by the `simple-model` binary.
///
/// Lower-level errors are kept as the source so `main` can report the
/// full chain.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("CLI_CONFIG_INVALID: cannot read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CLI_CONFIG_INVALID: {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CLI_IO_FAILED: {0}")]
    Io(#[from] io::Error),

    #[error("CLI_JSON_INVALID: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CLI_DECLARATION_FAILED: {0}")]
    Declaration(#[from] ModelError),

    #[error("CLI_RECORDS_REJECTED: {rejected} of {total} records rejected")]
    RecordsRejected { rejected: usize, total: usize },
}

impl CliError {
    /// Stable code, matching the prefix of the display form.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigRead { .. } | Self::ConfigParse { .. } => "CLI_CONFIG_INVALID",
            Self::Io(_) => "CLI_IO_FAILED",
            Self::Json(_) => "CLI_JSON_INVALID",
            Self::Declaration(_) => "CLI_DECLARATION_FAILED",
            Self::RecordsRejected { .. } => "CLI_RECORDS_REJECTED",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_starts_with_code() {
        let errors = [
            CliError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
            CliError::RecordsRejected { rejected: 2, total: 5 },
            CliError::ConfigRead {
                path: PathBuf::from("cfg.json"),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            },
        ];
        for err in &errors {
            assert!(err.to_string().starts_with(err.code()), "{}", err);
        }
        assert_eq!(
            errors[1].to_string(),
            "CLI_RECORDS_REJECTED: 2 of 5 records rejected"
        );
    }

    #[test]
    fn test_config_parse_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CliError::ConfigParse {
            path: PathBuf::from("cfg.json"),
            source,
        };
        assert_eq!(err.code(), "CLI_CONFIG_INVALID");
        assert!(err.source().is_some());
    }
}
