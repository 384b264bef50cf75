use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("cannot read {path}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("{path} is not a valid payload: {source}")]
	Payload {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Pipeline(#[from] reinvent::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		use reinvent::Error as E;

		let (code, details) = match self {
			CliError::InvalidInput(_) => (ErrorCode::InvalidInput, None),
			CliError::Read { path, .. } => (ErrorCode::IoError, Some(serde_json::json!({ "path": path }))),
			CliError::Payload { path, source } => (
				ErrorCode::InvalidInput,
				Some(serde_json::json!({ "path": path, "line": source.line(), "column": source.column() })),
			),
			CliError::Json(_) => (ErrorCode::InternalError, None),
			CliError::Pipeline(err) => match err {
				E::ProtocolViolation { step, .. } => (ErrorCode::ProtocolViolation, Some(serde_json::json!({ "step": step }))),
				E::Authentication(_) => (ErrorCode::AuthenticationFailed, None),
				E::Parse { what, .. } => (ErrorCode::ParseError, Some(serde_json::json!({ "missing": what }))),
				E::Fetch { url, .. } => (ErrorCode::FetchFailed, Some(serde_json::json!({ "url": url }))),
				E::Transport(source) => (
					ErrorCode::NetworkError,
					Some(serde_json::json!({ "timeout": source.is_timeout() })),
				),
				E::Config(_) => (ErrorCode::InvalidInput, None),
				E::Io(_) => (ErrorCode::IoError, None),
				E::Json(_) => (ErrorCode::InternalError, None),
			},
		};

		let message = match self {
			CliError::Read { path, source } => format!("cannot read {}: {source}", path.display()),
			other => other.to_string(),
		};

		CommandError { code, message, details }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pipeline_errors_map_to_stable_codes() {
		let cases = [
			(
				reinvent::Error::ProtocolViolation {
					step: "LOGIN",
					detail: "expected status 302".into(),
				},
				ErrorCode::ProtocolViolation,
			),
			(reinvent::Error::Authentication("NotAuthorizedException".into()), ErrorCode::AuthenticationFailed),
			(
				reinvent::Error::Parse {
					what: "state",
					context: "authorize redirect".into(),
				},
				ErrorCode::ParseError,
			),
			(
				reinvent::Error::Fetch {
					url: "https://hub.example.test/api?<redacted>".into(),
					detail: "status 500".into(),
				},
				ErrorCode::FetchFailed,
			),
			(reinvent::Error::Config("timeoutSecs".into()), ErrorCode::InvalidInput),
		];

		for (err, code) in cases {
			assert_eq!(CliError::from(err).to_command_error().code, code);
		}
	}

	#[test]
	fn protocol_violation_names_step() {
		let err = CliError::from(reinvent::Error::ProtocolViolation {
			step: "COOKIE_ISSUANCE",
			detail: "expected status 302, got 200".into(),
		});
		let cmd = err.to_command_error();
		assert_eq!(cmd.details.unwrap()["step"], "COOKIE_ISSUANCE");
		assert!(cmd.message.contains("COOKIE_ISSUANCE"));
	}

	#[test]
	fn read_error_includes_cause() {
		let err = CliError::Read {
			path: PathBuf::from("/nope/sessions.json"),
			source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
		};
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::IoError);
		assert!(cmd.message.contains("/nope/sessions.json"));
		assert!(cmd.message.contains("not found"));
	}
}
