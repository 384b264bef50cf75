// Error types for the retrieval pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while logging in or fetching portal data.
///
/// Every URL and secret embedded in a message has already been redacted by
/// the time the error is constructed.
#[derive(Debug, Error)]
pub enum Error {
	/// A handshake step expected a redirect and got something else
	///
	/// The login sequence is locked to the portal's current redirect chain.
	/// A different status or a missing `Location` header means the contract
	/// changed; retrying will not help.
	#[error("protocol violation during {step}: {detail}")]
	ProtocolViolation { step: &'static str, detail: String },

	/// The identity provider rejected the credentials or the SRP exchange
	///
	/// Surfaced separately from transport failures so an interactive caller
	/// can ask for new credentials.
	#[error("authentication failed: {0}")]
	Authentication(String),

	/// An expected value (authorization code, state, user id) was missing
	#[error("could not find {what} in {context}")]
	Parse { what: &'static str, context: String },

	/// A data call returned a non-2xx status or an unusable body
	#[error("fetch from {url} failed: {detail}")]
	Fetch { url: String, detail: String },

	/// Transport-level failure (DNS, TLS, connection reset, timeout)
	///
	/// The request URL is stripped on conversion since it may carry an
	/// authorization code in its query string.
	#[error("network error: {0}")]
	Transport(#[source] reqwest::Error),

	/// Invalid configuration value
	#[error("invalid configuration: {0}")]
	Config(String),

	/// I/O error
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::Transport(err.without_url())
	}
}

impl Error {
	pub(crate) fn protocol(step: &'static str, detail: impl Into<String>) -> Self {
		Error::ProtocolViolation {
			step,
			detail: detail.into(),
		}
	}

	pub(crate) fn parse(what: &'static str, context: impl Into<String>) -> Self {
		Error::Parse {
			what,
			context: context.into(),
		}
	}

	pub(crate) fn fetch(url: impl Into<String>, detail: impl Into<String>) -> Self {
		Error::Fetch {
			url: url.into(),
			detail: detail.into(),
		}
	}

	/// Returns true if new credentials could fix this error
	pub fn is_authentication(&self) -> bool {
		matches!(self, Error::Authentication(_))
	}

	/// Returns true if the portal's redirect contract was broken
	pub fn is_protocol_violation(&self) -> bool {
		matches!(self, Error::ProtocolViolation { .. })
	}

	pub fn is_parse(&self) -> bool {
		matches!(self, Error::Parse { .. })
	}

	pub fn is_fetch(&self) -> bool {
		matches!(self, Error::Fetch { .. })
	}

	/// Returns true if the request never produced a response
	pub fn is_transport(&self) -> bool {
		matches!(self, Error::Transport(_))
	}

	/// Returns true if the underlying transport timed out
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Transport(err) => err.is_timeout(),
			_ => false,
		}
	}
}
