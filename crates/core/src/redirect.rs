//! Single-hop redirect checks for the login handshake.
//!
//! Each handshake call must answer `302 Found` with a `Location` header.
//! Cookies set by the intermediate responses are kept by the client's cookie
//! store, which later steps depend on.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, LOCATION, SET_COOKIE};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::redact::Redactor;

/// Outcome of one redirect hop.
#[derive(Debug, Clone)]
pub struct RedirectHop {
	/// Absolute target, when the response named one.
	pub location: Option<Url>,
	/// Raw `Set-Cookie` header values of this response.
	pub set_cookie: Vec<String>,
}

/// Follows redirects one hop at a time, resolving relative targets against `root`.
pub struct RedirectWalker<'a> {
	client: &'a reqwest::Client,
	root: &'a Url,
	redactor: Redactor,
}

impl<'a> RedirectWalker<'a> {
	pub fn new(client: &'a reqwest::Client, root: &'a Url, redactor: Redactor) -> Self {
		Self { client, root, redactor }
	}

	/// GETs `url` with `headers` and returns the absolute redirect target.
	///
	/// Anything other than a 302 carrying a `Location` header is a
	/// [`Error::ProtocolViolation`] naming `step`.
	pub async fn follow_redirect(&self, step: &'static str, url: &Url, headers: HeaderMap) -> Result<Url> {
		let hop = self.hop(step, url, headers).await?;
		hop.location
			.ok_or_else(|| Error::protocol(step, "redirect response has no Location header"))
	}

	/// GETs `url` and requires a 302, but tolerates a missing `Location`.
	pub async fn hop(&self, step: &'static str, url: &Url, headers: HeaderMap) -> Result<RedirectHop> {
		let response = self.client.get(url.clone()).headers(headers).send().await?;
		let status = response.status();
		debug!(target: "reinvent.redirect", step, status = status.as_u16(), "response received");

		if status != StatusCode::FOUND {
			return Err(Error::protocol(
				step,
				format!(
					"expected status 302 from {}, got {}",
					self.redactor.redact(url.as_str()),
					status.as_u16()
				),
			));
		}

		let location = match response.headers().get(LOCATION) {
			Some(value) => {
				let raw = value
					.to_str()
					.map_err(|_| Error::protocol(step, "Location header is not valid UTF-8"))?;
				let resolved = resolve_location(self.root, raw)
					.map_err(|detail| Error::protocol(step, detail))?;
				debug!(
					target: "reinvent.redirect",
					step,
					location = %self.redactor.redact(resolved.as_str()),
					"redirect location"
				);
				Some(resolved)
			}
			None => None,
		};

		let set_cookie = response
			.headers()
			.get_all(SET_COOKIE)
			.iter()
			.filter_map(|v| v.to_str().ok())
			.map(str::to_string)
			.collect();

		Ok(RedirectHop { location, set_cookie })
	}
}

/// Resolves a `Location` value against the portal root.
///
/// A value starting with `/` is a path on the root origin and must stay on
/// it, so scheme-relative forms such as `//host/path` are rejected. Anything
/// else must already be an absolute `http` or `https` URL.
pub fn resolve_location(root: &Url, location: &str) -> std::result::Result<Url, String> {
	let location = location.trim();
	if location.starts_with('/') {
		let resolved = root
			.join(location)
			.map_err(|e| format!("relative Location does not resolve against the portal root: {e}"))?;
		if resolved.origin() != root.origin() {
			return Err("relative Location leaves the portal origin".to_string());
		}
		return Ok(resolved);
	}
	let resolved =
		Url::parse(location).map_err(|e| format!("Location is neither a path nor an absolute URL: {e}"))?;
	match resolved.scheme() {
		"http" | "https" => Ok(resolved),
		other => Err(format!("Location uses unsupported scheme {other}")),
	}
}
