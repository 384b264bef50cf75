//! Masking of secrets before they reach logs or error messages.
//!
//! URLs keep their scheme, host, and path so a log line still says which
//! endpoint was called; the query string (which carries authorization codes
//! and state values) is replaced with [`QUERY_MARKER`]. Anything that is not
//! an http(s) URL is treated as an opaque secret and replaced with [`MASK`].

use std::borrow::Cow;

/// Replacement for a redacted query string.
pub const QUERY_MARKER: &str = "<redacted>";

/// Replacement for a redacted opaque secret.
pub const MASK: &str = "***";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redactor {
	enabled: bool,
}

impl Default for Redactor {
	fn default() -> Self {
		Self { enabled: true }
	}
}

impl Redactor {
	pub fn new(enabled: bool) -> Self {
		Self { enabled }
	}

	/// A redactor that passes everything through. Only for local debugging.
	pub fn disabled() -> Self {
		Self { enabled: false }
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Redacts a value that may be a URL or an opaque secret.
	pub fn redact<'a>(&self, value: &'a str) -> Cow<'a, str> {
		if !self.enabled {
			return Cow::Borrowed(value);
		}
		if is_http_url(value) {
			return truncate_query(value);
		}
		Cow::Borrowed(MASK)
	}

	/// Redacts a value known to be a secret, even if it looks like a URL.
	pub fn secret<'a>(&self, value: &'a str) -> Cow<'a, str> {
		if self.enabled { Cow::Borrowed(MASK) } else { Cow::Borrowed(value) }
	}
}

fn is_http_url(value: &str) -> bool {
	let lower = |n: usize| value.get(..n).map(str::to_ascii_lowercase);
	lower(7).as_deref() == Some("http://") || lower(8).as_deref() == Some("https://")
}

fn truncate_query(url: &str) -> Cow<'_, str> {
	match url.find('?') {
		Some(idx) => Cow::Owned(format!("{}?{QUERY_MARKER}", &url[..idx])),
		None => Cow::Borrowed(url),
	}
}
