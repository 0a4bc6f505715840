//! JSON line I/O for the CLI
//!
//! - Input: one JSON object per line
//! - Output: one JSON response per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::CliResult;

/// One input line
#[derive(Debug)]
pub enum Request {
    /// A parsed JSON document
    Json(Value),
    /// A line that is not valid JSON
    Invalid(String),
}

/// Reads JSON lines, skipping blank ones.
///
/// Unparseable lines are yielded as [`Request::Invalid`] so the caller can
/// answer them and carry on. Read failures end the stream with an error.
pub fn read_requests<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<Request>> {
    reader.lines().filter_map(|line| match line {
        Err(e) => Some(Err(e.into())),
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(Ok(match serde_json::from_str(&line) {
            Ok(value) => Request::Json(value),
            Err(e) => Request::Invalid(e.to_string()),
        })),
    })
}

/// Write a success response
pub fn write_response<W: Write, T: Serialize>(writer: &mut W, data: &T) -> CliResult<()> {
    let response = json!({
        "status": "ok",
        "data": data
    });
    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write an error response
pub fn write_error<W: Write>(writer: &mut W, code: &str, kind: &str, message: &str) -> CliResult<()> {
    let response = json!({
        "status": "error",
        "code": code,
        "kind": kind,
        "message": message
    });
    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
