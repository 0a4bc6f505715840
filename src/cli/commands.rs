//! CLI command implementations

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::model::{BuildOptions, Model, ModelRegistry};
use crate::observability::{log_event_with_fields, Event, LogConfig};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response, Request};

/// Configuration file structure
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logging level and stream
    pub log: LogConfig,
    /// Construction options applied to every checked record
    pub options: BuildOptions,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The file configuration, or defaults when no file is given
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Outcome of a check run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub accepted: usize,
    pub rejected: usize,
}

impl CheckSummary {
    pub fn total(&self) -> usize {
        self.accepted + self.rejected
    }
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check {
            models,
            model,
            config,
            allow_missing,
            allow_unknown,
        } => {
            let config = Config::load_or_default(config.as_deref())?;
            config.log.with_env_override().apply();

            let mut options = config.options;
            if allow_missing {
                options = options.allow_missing(true);
            }
            if allow_unknown {
                options = options.allow_unknown(true);
            }
            check(&models, &model, &options)
        }
        Command::Describe { models, config } => {
            let config = Config::load_or_default(config.as_deref())?;
            config.log.with_env_override().apply();
            describe(&models)
        }
    }
}

/// Load a declaration file, or every `*.json` file of a directory
pub fn load_registry(path: &Path) -> CliResult<ModelRegistry> {
    let mut registry = ModelRegistry::new();
    if path.is_dir() {
        registry.load_dir(path)?;
    } else {
        registry.load_file(path)?;
    }
    Ok(registry)
}

/// Validate stdin against one model, answering on stdout.
///
/// Fails with `CLI_RECORDS_REJECTED` when any line was rejected.
pub fn check(models: &Path, model_name: &str, options: &BuildOptions) -> CliResult<()> {
    let registry = load_registry(models)?;
    let model = registry.require(model_name)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let summary = check_stream(model, options, stdin.lock(), &mut stdout)?;

    if summary.rejected > 0 {
        return Err(CliError::RecordsRejected {
            rejected: summary.rejected,
            total: summary.total(),
        });
    }
    Ok(())
}

/// Build one record per input line, writing one response per line
pub fn check_stream<R: BufRead, W: Write>(
    model: &Model,
    options: &BuildOptions,
    reader: R,
    writer: &mut W,
) -> CliResult<CheckSummary> {
    let mut summary = CheckSummary::default();

    for request in read_requests(reader) {
        match request? {
            Request::Json(document) => match model.build_with(document, options) {
                Ok(record) => {
                    summary.accepted += 1;
                    write_response(writer, &record.to_mapping())?;
                }
                Err(e) => {
                    summary.rejected += 1;
                    write_error(writer, e.code().code(), e.kind().as_str(), e.message())?;
                }
            },
            Request::Invalid(reason) => {
                summary.rejected += 1;
                write_error(
                    writer,
                    "CLI_INVALID_JSON",
                    "INPUT",
                    &format!("Invalid JSON: {}", reason),
                )?;
            }
        }
    }

    let accepted = summary.accepted.to_string();
    let rejected = summary.rejected.to_string();
    log_event_with_fields(
        Event::CheckComplete,
        &[
            ("model", model.name()),
            ("accepted", accepted.as_str()),
            ("rejected", rejected.as_str()),
        ],
    );

    Ok(summary)
}

/// Print every declared model on stdout
pub fn describe(models: &Path) -> CliResult<()> {
    let registry = load_registry(models)?;
    let mut stdout = io::stdout();
    describe_to(&registry, &mut stdout)
}

/// Write one response line per model, in declaration order
pub fn describe_to<W: Write>(registry: &ModelRegistry, writer: &mut W) -> CliResult<()> {
    for name in registry.names() {
        let model = registry.require(name)?;
        let fields: Vec<_> = model
            .schema()
            .iter()
            .map(|(field, attr)| {
                json!({
                    "name": field,
                    "type": attr.caster().name(),
                    "nullable": attr.is_nullable(),
                    "fallback": attr.has_fallback(),
                    "default": attr.has_default(),
                    "alias": attr.alias_name(),
                    "mutable": attr.is_mutable(model.is_mutable()),
                    "help": attr.help_text(),
                })
            })
            .collect();

        let description = json!({
            "model": model.name(),
            "extends": model.base().map(|base| base.name()),
            "mutable": model.is_mutable(),
            "allow_unknown": model.allows_unknown(),
            "fields": fields,
        });
        write_response(writer, &description)?;
    }
    Ok(())
}
