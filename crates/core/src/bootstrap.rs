//! The login handshake: username/password in, authenticated cookie jar out.
//!
//! ```text
//! INIT ──▶ LOGIN ──▶ AUTHORIZE ──▶ TOKEN_EXCHANGE ──▶ STORAGE_HANDOFF ──▶ COOKIE_ISSUANCE
//!  302       302     302 + code/state      SRP              POST               302 + Set-Cookie
//! ```
//!
//! The sequence is linear. The first failing step aborts the whole run and
//! nothing is resumed; a caller retries by building a new
//! [`SessionBootstrapper`], which starts from an empty cookie store.

use std::sync::Arc;

use reinvent_protocol::{CookieJar, StorageHandoff, UserId};
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use crate::fetch::DataFetcher;
use crate::http;
use crate::identity::{CredentialExchange, Credentials, TokenSet};
use crate::redact::Redactor;
use crate::redirect::RedirectWalker;

/// Handshake stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	Init,
	Login,
	Authorize,
	TokenExchange,
	StorageHandoff,
	CookieIssuance,
	UserResolution,
}

impl Step {
	pub fn name(self) -> &'static str {
		match self {
			Step::Init => "INIT",
			Step::Login => "LOGIN",
			Step::Authorize => "AUTHORIZE",
			Step::TokenExchange => "TOKEN_EXCHANGE",
			Step::StorageHandoff => "STORAGE_HANDOFF",
			Step::CookieIssuance => "COOKIE_ISSUANCE",
			Step::UserResolution => "USER_RESOLUTION",
		}
	}
}

impl std::fmt::Display for Step {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

/// Authorization code and state carried by the authorize redirect.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizeGrant {
	pub code: String,
	pub state: String,
}

impl std::fmt::Debug for AuthorizeGrant {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthorizeGrant").finish_non_exhaustive()
	}
}

/// Result of a full bootstrap including user resolution.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
	pub cookies: CookieJar,
	pub user_id: UserId,
}

/// Runs the handshake once. Consumed by the run so its cookie store can
/// never leak into another login.
pub struct SessionBootstrapper<'a> {
	config: &'a PortalConfig,
	client: reqwest::Client,
	root: Url,
	redactor: Redactor,
}

impl<'a> SessionBootstrapper<'a> {
	pub fn new(config: &'a PortalConfig) -> Result<Self> {
		config.validate()?;
		let client = http::handshake_client(config, Arc::new(Jar::default()))?;
		Ok(Self {
			config,
			client,
			root: config.root()?,
			redactor: config.redactor(),
		})
	}

	/// Logs in and returns the cookies issued by the final redirect.
	pub async fn bootstrap_session(self, credentials: &Credentials) -> Result<CookieJar> {
		let walker = RedirectWalker::new(&self.client, &self.root, self.redactor);
		let profile = &self.config.profile;

		let portal_url = self.config.portal_url()?;
		info!(target: "reinvent.bootstrap", step = %Step::Init, url = %portal_url, "calling attendee portal");
		let login_url = walker
			.follow_redirect(Step::Init.name(), &portal_url, profile.navigate.to_header_map()?)
			.await?;

		info!(target: "reinvent.bootstrap", step = %Step::Login, url = %self.redactor.redact(login_url.as_str()), "calling login URL");
		let authorize_url = walker
			.follow_redirect(Step::Login.name(), &login_url, profile.login.to_header_map()?)
			.await?;

		info!(target: "reinvent.bootstrap", step = %Step::Authorize, url = %self.redactor.redact(authorize_url.as_str()), "calling authorize URL");
		let callback = walker
			.follow_redirect(Step::Authorize.name(), &authorize_url, profile.authorize.to_header_map()?)
			.await?;
		let grant = parse_authorize_redirect(&callback, self.redactor)?;
		debug!(
			target: "reinvent.bootstrap",
			authorization_code = %self.redactor.redact(&grant.code),
			state = %self.redactor.redact(&grant.state),
			"authorization grant parsed"
		);

		info!(target: "reinvent.bootstrap", step = %Step::TokenExchange, "exchanging credentials");
		let tokens = CredentialExchange::new(&self.client, &self.config.identity, self.redactor)
			.exchange_credentials(credentials)
			.await?;

		self.storage_handoff(&grant, tokens).await?;

		let cookie_url = self.config.cookie_issuance_url(&grant.code, &grant.state)?;
		info!(target: "reinvent.bootstrap", step = %Step::CookieIssuance, url = %self.redactor.redact(cookie_url.as_str()), "requesting session cookies");
		let hop = walker
			.hop(Step::CookieIssuance.name(), &cookie_url, profile.same_site_navigate.to_header_map()?)
			.await?;

		let jar = CookieJar::from_set_cookie_headers(hop.set_cookie.iter().map(String::as_str));
		if jar.is_empty() {
			warn!(target: "reinvent.bootstrap", step = %Step::CookieIssuance, "cookie endpoint set no cookies");
		}
		info!(target: "reinvent.bootstrap", cookies = ?jar.names(), "session established");
		Ok(jar)
	}

	/// Logs in, then resolves the user id needed for the favorites endpoint.
	pub async fn bootstrap_with_user(self, credentials: &Credentials) -> Result<AuthenticatedSession> {
		let config = self.config;
		let cookies = self.bootstrap_session(credentials).await?;

		info!(target: "reinvent.bootstrap", step = %Step::UserResolution, "resolving user id");
		let user_id = DataFetcher::new(config, &cookies)?.resolve_user_id().await?;
		Ok(AuthenticatedSession { cookies, user_id })
	}

	async fn storage_handoff(&self, grant: &AuthorizeGrant, tokens: TokenSet) -> Result<()> {
		let url = self.config.storage_url()?;
		info!(target: "reinvent.bootstrap", step = %Step::StorageHandoff, url = %self.redactor.redact(url.as_str()), "linking tokens to portal session");

		let body = StorageHandoff {
			authorization_code: grant.code.clone(),
			id_token: tokens.id_token,
			access_token: tokens.access_token,
			refresh_token: tokens.refresh_token,
		};
		let headers: HeaderMap = self.config.profile.cross_site_cors.to_header_map()?;
		let response = self
			.client
			.post(url)
			.headers(headers)
			.body(serde_json::to_vec(&body)?)
			.send()
			.await?;

		// Status is informational only; the portal answers 200 or 204 depending on the day.
		info!(target: "reinvent.bootstrap", step = %Step::StorageHandoff, status = response.status().as_u16(), "storage handoff sent");
		Ok(())
	}
}

/// Extracts `authorization_code` and `state` from the authorize redirect.
///
/// The portal embeds them inside the `redirect_uri` value, sometimes
/// percent-encoded and sometimes raw, and uses `?` or `&` between them. Both
/// separators are accepted at every nesting level and values are
/// percent-decoded. The first non-empty occurrence of each key wins.
pub fn parse_authorize_redirect(location: &Url, redactor: Redactor) -> Result<AuthorizeGrant> {
	let mut params = Vec::new();
	if let Some(query) = location.query() {
		collect_params(query, &mut params, 0);
	}

	let find = |key: &str| {
		params
			.iter()
			.find(|(k, v)| k == key && !v.is_empty())
			.map(|(_, v)| v.clone())
	};
	let context = || format!("authorize redirect {}", redactor.redact(location.as_str()));

	let code = find("authorization_code").ok_or_else(|| Error::parse("authorization_code", context()))?;
	let state = find("state").ok_or_else(|| Error::parse("state", context()))?;
	Ok(AuthorizeGrant { code, state })
}

const MAX_NESTING: usize = 2;

fn collect_params(query: &str, out: &mut Vec<(String, String)>, depth: usize) {
	for segment in query.split(['&', '?']) {
		for (key, value) in url::form_urlencoded::parse(segment.as_bytes()) {
			if depth < MAX_NESTING && (value.contains('?') || value.contains('&')) {
				collect_params(&value, out, depth + 1);
			}
			out.push((key.into_owned(), value.into_owned()));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(location: &str) -> Result<AuthorizeGrant> {
		parse_authorize_redirect(&Url::parse(location).unwrap(), Redactor::default())
	}

	#[test]
	fn parses_raw_nested_redirect_uri() {
		let grant = parse("https://hub.example.test/cb?redirect_uri=https://hub.example.test/auth?authorization_code=X&state=Y").unwrap();
		assert_eq!((grant.code.as_str(), grant.state.as_str()), ("X", "Y"));
	}

	#[test]
	fn order_and_separator_do_not_matter() {
		for location in [
			"https://h/cb?redirect_uri=https://h/a&state=Y&authorization_code=X",
			"https://h/cb?redirect_uri=https://h/a?state=Y?authorization_code=X",
			"https://h/cb?authorization_code=X?state=Y",
			"https://h/cb?state=Y&redirect_uri=https://h/a?authorization_code=X",
		] {
			let grant = parse(location).unwrap();
			assert_eq!((grant.code.as_str(), grant.state.as_str()), ("X", "Y"), "{location}");
		}
	}

	#[test]
	fn parses_percent_encoded_redirect_uri() {
		let grant = parse(
			"https://h/cb?redirect_uri=https%3A%2F%2Fh%2Fauth%3Fauthorization_code%3Dab%252Bc%26state%3Ds-1",
		)
		.unwrap();
		assert_eq!(grant.code, "ab+c");
		assert_eq!(grant.state, "s-1");
	}

	#[test]
	fn missing_state_is_parse_error() {
		let err = parse("https://h/cb?redirect_uri=https://h/a?authorization_code=X").unwrap_err();
		assert!(err.is_parse());
		assert!(err.to_string().contains("state"));
		assert!(!err.to_string().contains("authorization_code=X"));
	}

	#[test]
	fn missing_code_is_parse_error() {
		let err = parse("https://h/cb").unwrap_err();
		assert!(matches!(err, Error::Parse { what: "authorization_code", .. }));
	}

	#[test]
	fn prefix_lookalike_keys_are_ignored() {
		let err = parse("https://h/cb?xauthorization_code=X&state=Y").unwrap_err();
		assert!(err.is_parse());
	}
}
