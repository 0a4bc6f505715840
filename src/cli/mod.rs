//! Command-line front end
//!
//! - check: validate JSON lines from stdin against a declared model
//! - describe: print the fields of every declared model

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, check_stream, describe, describe_to, load_registry, run, run_command, CheckSummary, Config};
pub use errors::{CliError, CliResult};
pub use io::{read_requests, write_error, write_response, Request};
