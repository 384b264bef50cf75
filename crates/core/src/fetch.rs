//! Authenticated reads against the portal API.
//!
//! Every endpoint answers `{"data": ...}`. A non-2xx status, a body that is
//! not JSON, a missing `data` field, or a `data` value of the wrong shape all
//! abort with [`Error::Fetch`]; nothing partial is returned.

use reinvent_protocol::{CookieJar, FavoritesPayload, RawSession, UserId, UserInfo};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use crate::http;
use crate::redact::Redactor;

/// Reads sessions, favorites, and user info with a finished cookie jar.
///
/// The jar is only read: its `Cookie` header is rendered once at
/// construction, so concurrent fetches share nothing mutable.
pub struct DataFetcher<'a> {
	config: &'a PortalConfig,
	client: reqwest::Client,
	headers: HeaderMap,
	redactor: Redactor,
}

impl<'a> DataFetcher<'a> {
	pub fn new(config: &'a PortalConfig, cookies: &CookieJar) -> Result<Self> {
		let mut headers = config.profile.api.to_header_map()?;
		if let Some(cookie) = cookies.header_value() {
			let value = HeaderValue::from_str(&cookie)
				.map_err(|_| Error::Config("session cookies are not a valid header value".into()))?;
			headers.insert(COOKIE, value);
		}
		Ok(Self {
			config,
			client: http::plain_client(config)?,
			headers,
			redactor: config.redactor(),
		})
	}

	/// Full session catalog.
	pub async fn fetch_sessions(&self) -> Result<Vec<RawSession>> {
		let url = self.config.sessions_url()?;
		let sessions: Vec<RawSession> = self.get_data(&url).await?;
		info!(target: "reinvent.fetch", count = sessions.len(), "sessions fetched");
		Ok(sessions)
	}

	/// Sessions followed by `user`.
	pub async fn fetch_favorites(&self, user: &UserId) -> Result<FavoritesPayload> {
		let url = self.config.favorites_url(user)?;
		let favorites: FavoritesPayload = self.get_data(&url).await?;
		info!(
			target: "reinvent.fetch",
			count = favorites.followed_sessions.len(),
			"favorites fetched"
		);
		Ok(favorites)
	}

	/// Reads `data.userUid` from the user-info endpoint.
	pub async fn resolve_user_id(&self) -> Result<UserId> {
		let url = self.config.user_info_url()?;
		let data: Value = self.get_data(&url).await?;
		let info: UserInfo = serde_json::from_value(data).map_err(|e| {
			Error::parse(
				"data.userUid",
				format!("user info from {}: {e}", self.redactor.redact(url.as_str())),
			)
		})?;
		debug!(target: "reinvent.fetch", user_id = %self.redactor.secret(info.user_uid.as_str()), "user resolved");
		Ok(info.user_uid)
	}

	async fn get_data<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
		let shown = self.redactor.redact(url.as_str()).into_owned();
		debug!(target: "reinvent.fetch", url = %shown, "GET");

		let response = self.client.get(url.clone()).headers(self.headers.clone()).send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(Error::fetch(shown, format!("status {}", status.as_u16())));
		}

		let body = response.bytes().await?;
		let mut envelope: Value = serde_json::from_slice(&body)
			.map_err(|e| Error::fetch(shown.clone(), format!("body is not JSON: {e}")))?;
		let data = envelope
			.get_mut("data")
			.map(Value::take)
			.ok_or_else(|| Error::fetch(shown.clone(), "response has no data field"))?;
		serde_json::from_value(data).map_err(|e| Error::fetch(shown, format!("unexpected data shape: {e}")))
	}
}
