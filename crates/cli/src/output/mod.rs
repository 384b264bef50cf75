//! Structured output envelope for all CLI commands.
//!
//! Every command produces a result envelope on stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "export",
//!   "data": { "sessions": 412, "favorites": 9 },
//!   "timings": { "durationMs": 5310 },
//!   "artifacts": [{ "type": "catalog", "path": "sessions.json" }]
//! }
//! ```
//!
//! On failure:
//!
//! ```json
//! {
//!   "ok": false,
//!   "command": "export",
//!   "error": {
//!     "code": "PROTOCOL_VIOLATION",
//!     "message": "protocol violation during LOGIN: expected status 302 ...",
//!     "details": { "step": "LOGIN" }
//!   }
//! }
//! ```


use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use reinvent::MergedCatalog;
use serde::{Deserialize, Serialize};

/// Current schema version for command output.
///
/// Increment this when making breaking changes to the output structure.
pub const SCHEMA_VERSION: u32 = 1;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// TOON output (default, token-efficient for LLMs)
	#[default]
	Toon,
	/// JSON output
	Json,
	/// Newline-delimited JSON (streaming)
	Ndjson,
	/// Human-readable text
	Text,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Toon => write!(f, "toon"),
			OutputFormat::Json => write!(f, "json"),
			OutputFormat::Ndjson => write!(f, "ndjson"),
			OutputFormat::Text => write!(f, "text"),
		}
	}
}

/// The main result envelope returned by all commands.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,

	pub ok: bool,

	/// Command name (`export`, `login`, `merge`)
	pub command: String,

	/// Inputs used for this command (for traceability)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inputs: Option<CommandInputs>,

	/// Command-specific result data (only present on success)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	/// Error information (only present on failure)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,

	/// Files written by the command
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub artifacts: Vec<Artifact>,

	/// Non-fatal findings such as favorites missing from the catalog
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub diagnostics: Vec<Diagnostic>,
}

/// Inputs that were used for the command. Never carries credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommandInputs {
	/// Portal origin the command talked to
	#[serde(skip_serializing_if = "Option::is_none")]
	pub root_url: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub sessions_path: Option<PathBuf>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub favorites_path: Option<PathBuf>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub output_path: Option<PathBuf>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub include_favorites: Option<bool>,
}

/// Error information for failed commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	/// Human-readable error message, already redacted
	pub message: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// A handshake step did not answer with the expected redirect
	ProtocolViolation,
	/// The identity provider rejected the credentials or the SRP exchange
	AuthenticationFailed,
	/// An authorization code, state, or user id was missing
	ParseError,
	/// A data call returned a non-2xx status or an unusable body
	FetchFailed,
	/// DNS, TLS, connection, or timeout failure
	NetworkError,
	/// Bad flags, missing credentials, invalid config or payload files
	InvalidInput,
	/// File I/O error
	IoError,
	/// Unknown/internal error
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::ProtocolViolation => write!(f, "PROTOCOL_VIOLATION"),
			ErrorCode::AuthenticationFailed => write!(f, "AUTHENTICATION_FAILED"),
			ErrorCode::ParseError => write!(f, "PARSE_ERROR"),
			ErrorCode::FetchFailed => write!(f, "FETCH_FAILED"),
			ErrorCode::NetworkError => write!(f, "NETWORK_ERROR"),
			ErrorCode::InvalidInput => write!(f, "INVALID_INPUT"),
			ErrorCode::IoError => write!(f, "IO_ERROR"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

/// Timing information for the command
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

/// File produced by a command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
	#[serde(rename = "type")]
	pub artifact_type: ArtifactType,

	pub path: PathBuf,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub size_bytes: Option<u64>,
}

impl Artifact {
	/// Describes a file that was just written, reading its size from disk.
	pub fn written(artifact_type: ArtifactType, path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let size_bytes = std::fs::metadata(&path).ok().map(|m| m.len());
		Self {
			artifact_type,
			path,
			size_bytes,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
	/// Merged session catalog (JSON array)
	Catalog,
}

/// Diagnostic messages (warnings, info, etc.)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
	pub level: DiagnosticLevel,

	pub message: String,

	/// Pipeline stage that produced it (`merge`, `bootstrap`)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
	Info,
	Warning,
	Error,
}

/// Builder for constructing command results
pub struct ResultBuilder<T: Serialize> {
	command: String,
	inputs: Option<CommandInputs>,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
	artifacts: Vec<Artifact>,
	diagnostics: Vec<Diagnostic>,
}

impl<T: Serialize> ResultBuilder<T> {
	/// Create a new result builder for the given command.
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			inputs: None,
			data: None,
			error: None,
			start_time: Instant::now(),
			artifacts: Vec::new(),
			diagnostics: Vec::new(),
		}
	}

	/// Times the result from `start` instead of from builder creation.
	pub fn started_at(mut self, start: Instant) -> Self {
		self.start_time = start;
		self
	}

	pub fn inputs(mut self, inputs: CommandInputs) -> Self {
		self.inputs = Some(inputs);
		self
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	/// Set an error that already carries details
	pub fn failure(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn artifact(mut self, artifact: Artifact) -> Self {
		self.artifacts.push(artifact);
		self
	}

	pub fn diagnostic_with_source(
		mut self,
		level: DiagnosticLevel,
		message: impl Into<String>,
		source: impl Into<String>,
	) -> Self {
		self.diagnostics.push(Diagnostic {
			level,
			message: message.into(),
			source: Some(source.into()),
		});
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();

		CommandResult {
			schema_version: Some(SCHEMA_VERSION),
			ok,
			command: self.command,
			inputs: self.inputs,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
			artifacts: self.artifacts,
			diagnostics: self.diagnostics,
		}
	}
}

/// Print a command result to stdout in the specified format
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Toon => {
			if let Ok(json_value) = serde_json::to_value(result) {
				println!("{}", toon::encode(&json_value, None));
			}
		}
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Ndjson => {
			if let Ok(json) = serde_json::to_string(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			print_result_text(result);
		}
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if result.ok {
		if let Some(ref data) = result.data {
			if let Ok(json) = serde_json::to_string_pretty(data) {
				let _ = writeln!(stdout, "{json}");
			}
		}
	} else if let Some(ref error) = result.error {
		let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
	}

	for diag in &result.diagnostics {
		let prefix = match diag.level {
			DiagnosticLevel::Info => "info",
			DiagnosticLevel::Warning => "warning",
			DiagnosticLevel::Error => "error",
		};
		match diag.source {
			Some(ref source) => {
				let _ = writeln!(stdout, "[{prefix}:{source}] {}", diag.message);
			}
			None => {
				let _ = writeln!(stdout, "[{prefix}] {}", diag.message);
			}
		}
	}

	for artifact in &result.artifacts {
		let _ = writeln!(stdout, "Saved {:?}: {}", artifact.artifact_type, artifact.path.display());
	}

	if let Some(ref timings) = result.timings {
		let _ = writeln!(stdout, "Completed in {}ms", timings.duration_ms);
	}
}

/// Print an error to stderr in human-readable format
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

/// Result data for `export`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
	pub sessions: usize,
	pub favorites: usize,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub unmatched_favorites: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	pub output: PathBuf,
}

/// Result data for `login`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
	/// Cookie names only; values never leave the process
	pub cookies: Vec<String>,
	pub cookie_count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
}

/// Result data for `merge`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeData {
	pub sessions: usize,
	pub favorites: usize,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub unmatched_favorites: Vec<String>,
	/// The catalog itself, when it was not written to a file
	#[serde(skip_serializing_if = "Option::is_none")]
	pub records: Option<MergedCatalog>,
}
