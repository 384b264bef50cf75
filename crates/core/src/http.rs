//! HTTP client construction shared by every stage.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;

use crate::config::PortalConfig;
use crate::error::{Error, Result};

/// Client for the login handshake: redirects are never followed and every
/// response's `Set-Cookie` lands in `jar`.
pub(crate) fn handshake_client(config: &PortalConfig, jar: Arc<Jar>) -> Result<reqwest::Client> {
	reqwest::Client::builder()
		.redirect(Policy::none())
		.cookie_provider(jar)
		.timeout(config.timeout())
		.build()
		.map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e.without_url())))
}

/// Client for calls that carry their own `Cookie` header (or none).
pub(crate) fn plain_client(config: &PortalConfig) -> Result<reqwest::Client> {
	reqwest::Client::builder()
		.redirect(Policy::none())
		.timeout(config.timeout())
		.build()
		.map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e.without_url())))
}
