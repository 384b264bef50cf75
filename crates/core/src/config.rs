//! Portal endpoints, identity-provider parameters, and request profiles.
//!
//! Every field has a built-in default matching the live portal. A JSON file
//! only needs to name the fields it overrides:
//!
//! ```json
//! { "rootUrl": "https://hub.example.test", "identity": { "region": "eu-west-1" } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use reinvent_protocol::UserId;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::redact::Redactor;

pub const DEFAULT_ROOT_URL: &str = "https://hub.reinvent.awsevents.com";
pub const DEFAULT_STORAGE_URL: &str = "https://28ym3tywek.execute-api.us-east-1.amazonaws.com/storage";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_USER_POOL_ID: &str = "us-east-1_iu3YTdfT3";
pub const DEFAULT_CLIENT_ID: &str = "4mbpjh0cd78jbbu5kc5i9717v";

const CHROME_UA: &str =
	"Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";
const CHROME_SEC_CH_UA: &str = r#""Not/A)Brand";v="99", "Google Chrome";v="115", "Chromium";v="115""#;
const DOCUMENT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// Everything the pipeline needs to know about the deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalConfig {
	/// Origin that relative redirect targets are resolved against.
	pub root_url: String,
	pub portal_path: String,
	pub sessions_path: String,
	pub user_info_path: String,
	pub favorites_path: String,
	/// Query parameter that carries the user id on the favorites endpoint.
	pub favorites_user_param: String,
	/// Cookie-issuing endpoint; `code` and `state` are appended as query parameters.
	pub cookie_issuance_path: String,
	pub storage_url: String,
	pub identity: IdentityConfig,
	pub timeout_secs: u64,
	/// Mask URLs and secrets in diagnostics.
	pub redact_logs: bool,
	pub profile: RequestProfile,
}

impl Default for PortalConfig {
	fn default() -> Self {
		Self {
			root_url: DEFAULT_ROOT_URL.to_string(),
			portal_path: "/attendee-portal/".to_string(),
			sessions_path: "/attendee-portal-api/sessions/list/".to_string(),
			user_info_path: "/attendee-portal-api/user/".to_string(),
			favorites_path: "/attendee-portal-api/user/favorites/".to_string(),
			favorites_user_param: "userUid".to_string(),
			cookie_issuance_path: "/auth/login/cognito/".to_string(),
			storage_url: DEFAULT_STORAGE_URL.to_string(),
			identity: IdentityConfig::default(),
			timeout_secs: 30,
			redact_logs: true,
			profile: RequestProfile::default(),
		}
	}
}

impl PortalConfig {
	/// Reads a JSON overlay; fields absent from the file keep their defaults.
	pub fn from_file(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)?;
		let config: PortalConfig = serde_json::from_str(&content)
			.map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
		config.validate()?;
		Ok(config)
	}

	/// Config pointed at a different origin, e.g. a local mock portal.
	pub fn with_root(root_url: impl Into<String>) -> Self {
		Self {
			root_url: root_url.into(),
			..Default::default()
		}
	}

	pub fn validate(&self) -> Result<()> {
		let root = self.root()?;
		if !matches!(root.scheme(), "http" | "https") {
			return Err(Error::Config(format!("rootUrl must be http(s), got {}", root.scheme())));
		}
		parse_url("storageUrl", &self.storage_url)?;
		self.identity.endpoint()?;
		self.identity.pool_name()?;
		if self.timeout_secs == 0 {
			return Err(Error::Config("timeoutSecs must be greater than zero".into()));
		}
		if self.favorites_user_param.is_empty() {
			return Err(Error::Config("favoritesUserParam must not be empty".into()));
		}
		Ok(())
	}

	pub fn redactor(&self) -> Redactor {
		Redactor::new(self.redact_logs)
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	pub fn root(&self) -> Result<Url> {
		parse_url("rootUrl", &self.root_url)
	}

	pub fn portal_url(&self) -> Result<Url> {
		self.endpoint("portalPath", &self.portal_path)
	}

	pub fn sessions_url(&self) -> Result<Url> {
		self.endpoint("sessionsPath", &self.sessions_path)
	}

	pub fn user_info_url(&self) -> Result<Url> {
		self.endpoint("userInfoPath", &self.user_info_path)
	}

	pub fn favorites_url(&self, user: &UserId) -> Result<Url> {
		let mut url = self.endpoint("favoritesPath", &self.favorites_path)?;
		url.query_pairs_mut().append_pair(&self.favorites_user_param, user.as_str());
		Ok(url)
	}

	pub fn cookie_issuance_url(&self, code: &str, state: &str) -> Result<Url> {
		let mut url = self.endpoint("cookieIssuancePath", &self.cookie_issuance_path)?;
		url.query_pairs_mut().append_pair("code", code).append_pair("state", state);
		Ok(url)
	}

	pub fn storage_url(&self) -> Result<Url> {
		parse_url("storageUrl", &self.storage_url)
	}

	fn endpoint(&self, field: &str, path: &str) -> Result<Url> {
		self.root()?
			.join(path)
			.map_err(|e| Error::Config(format!("{field} {path:?} does not resolve against rootUrl: {e}")))
	}
}

/// Cognito user-pool parameters. Fixed per deployment, never user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityConfig {
	pub region: String,
	pub user_pool_id: String,
	pub client_id: String,
	/// Overrides the regional `cognito-idp` endpoint.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub endpoint: Option<String>,
}

impl Default for IdentityConfig {
	fn default() -> Self {
		Self {
			region: DEFAULT_REGION.to_string(),
			user_pool_id: DEFAULT_USER_POOL_ID.to_string(),
			client_id: DEFAULT_CLIENT_ID.to_string(),
			endpoint: None,
		}
	}
}

impl IdentityConfig {
	pub fn endpoint(&self) -> Result<Url> {
		match &self.endpoint {
			Some(endpoint) => parse_url("identity.endpoint", endpoint),
			None => parse_url("identity.region", &format!("https://cognito-idp.{}.amazonaws.com/", self.region)),
		}
	}

	/// Pool name used in SRP hashing: the part of the pool id after `_`.
	pub fn pool_name(&self) -> Result<&str> {
		match self.user_pool_id.split_once('_') {
			Some((_, name)) if !name.is_empty() => Ok(name),
			_ => Err(Error::Config(format!(
				"userPoolId {:?} is not of the form <region>_<name>",
				self.user_pool_id
			))),
		}
	}
}

/// Header sets sent at each handshake call site.
///
/// The portal runs bot detection on its entry and cookie endpoints, so those
/// calls carry headers copied from a desktop Chrome. When the heuristics
/// change, this is the only place to update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestProfile {
	/// Top-level document navigation to the portal entry point.
	pub navigate: HeaderSet,
	pub login: HeaderSet,
	pub authorize: HeaderSet,
	/// Cross-site XHR to the storage endpoint.
	pub cross_site_cors: HeaderSet,
	/// Navigation to the cookie-issuing endpoint.
	pub same_site_navigate: HeaderSet,
	/// Authenticated JSON API calls.
	pub api: HeaderSet,
}

impl Default for RequestProfile {
	fn default() -> Self {
		let browser = |extra: &[(&str, &str)]| {
			let mut set = HeaderSet::from_pairs(&[
				("accept-language", "en-US,en;q=0.9"),
				("cache-control", "no-cache"),
				("pragma", "no-cache"),
				("sec-ch-ua", CHROME_SEC_CH_UA),
				("sec-ch-ua-mobile", "?0"),
				("sec-ch-ua-platform", "\"macOS\""),
			]);
			for (name, value) in extra {
				set.insert(*name, *value);
			}
			set
		};

		Self {
			navigate: browser(&[
				("accept-encoding", "deflate, gzip"),
				("authority", "hub.reinvent.awsevents.com"),
				("accept", DOCUMENT_ACCEPT),
				("sec-fetch-dest", "document"),
				("sec-fetch-mode", "navigate"),
				("sec-fetch-site", "none"),
				("sec-fetch-user", "?1"),
				("upgrade-insecure-requests", "1"),
				("user-agent", CHROME_UA),
			]),
			login: HeaderSet::default(),
			authorize: HeaderSet::default(),
			cross_site_cors: browser(&[
				("accept", "application/json, text/plain, */*"),
				("content-type", "application/json"),
				("sec-fetch-dest", "empty"),
				("sec-fetch-mode", "cors"),
				("sec-fetch-site", "cross-site"),
			]),
			same_site_navigate: browser(&[
				("accept", DOCUMENT_ACCEPT),
				("sec-fetch-dest", "document"),
				("sec-fetch-mode", "navigate"),
				("sec-fetch-site", "same-site"),
				("upgrade-insecure-requests", "1"),
			]),
			api: HeaderSet::from_pairs(&[("accept", "application/json, text/plain, */*")]),
		}
	}
}

/// Header name to value map, lower-case names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet(BTreeMap<String, String>);

impl HeaderSet {
	pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
		let mut set = Self::default();
		for (name, value) in pairs {
			set.insert(*name, *value);
		}
		set
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.insert(name.into().to_ascii_lowercase(), value.into());
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Converts to a [`HeaderMap`], rejecting names or values HTTP cannot carry.
	pub fn to_header_map(&self) -> Result<HeaderMap> {
		let mut map = HeaderMap::with_capacity(self.0.len());
		for (name, value) in &self.0 {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| Error::Config(format!("invalid header name {name:?}: {e}")))?;
			let header_value = HeaderValue::from_str(value)
				.map_err(|e| Error::Config(format!("invalid value for header {name:?}: {e}")))?;
			map.insert(header_name, header_value);
		}
		Ok(map)
	}
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
	Url::parse(value).map_err(|e| Error::Config(format!("{field} {value:?} is not a valid URL: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_validate() {
		PortalConfig::default().validate().unwrap();
	}

	#[test]
	fn overlay_keeps_unlisted_defaults() {
		let config: PortalConfig = serde_json::from_str(
			r#"{ "rootUrl": "http://127.0.0.1:8080", "identity": { "region": "eu-west-1" }, "timeoutSecs": 5 }"#,
		)
		.unwrap();

		assert_eq!(config.root_url, "http://127.0.0.1:8080");
		assert_eq!(config.timeout_secs, 5);
		assert_eq!(config.identity.region, "eu-west-1");
		assert_eq!(config.identity.client_id, DEFAULT_CLIENT_ID);
		assert_eq!(config.sessions_path, "/attendee-portal-api/sessions/list/");
		assert_eq!(config.profile, RequestProfile::default());
	}

	#[test]
	fn from_file_reads_overlay() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, r#"{ "redactLogs": false }"#).unwrap();

		let config = PortalConfig::from_file(&path).unwrap();
		assert!(!config.redact_logs);
		assert_eq!(config.root_url, DEFAULT_ROOT_URL);
	}

	#[test]
	fn from_file_rejects_zero_timeout() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, r#"{ "timeoutSecs": 0 }"#).unwrap();

		let err = PortalConfig::from_file(&path).unwrap_err();
		assert!(matches!(err, Error::Config(_)));
	}

	#[test]
	fn endpoint_urls_resolve_against_root() {
		let config = PortalConfig::with_root("http://127.0.0.1:9000");
		assert_eq!(
			config.sessions_url().unwrap().as_str(),
			"http://127.0.0.1:9000/attendee-portal-api/sessions/list/"
		);
		assert_eq!(
			config.favorites_url(&UserId("u 1".into())).unwrap().as_str(),
			"http://127.0.0.1:9000/attendee-portal-api/user/favorites/?userUid=u+1"
		);
		assert_eq!(
			config.cookie_issuance_url("abc", "xyz").unwrap().as_str(),
			"http://127.0.0.1:9000/auth/login/cognito/?code=abc&state=xyz"
		);
	}

	#[test]
	fn identity_endpoint_is_regional_unless_overridden() {
		let mut identity = IdentityConfig::default();
		assert_eq!(identity.endpoint().unwrap().as_str(), "https://cognito-idp.us-east-1.amazonaws.com/");
		assert_eq!(identity.pool_name().unwrap(), "iu3YTdfT3");

		identity.endpoint = Some("http://127.0.0.1:1/idp".into());
		assert_eq!(identity.endpoint().unwrap().as_str(), "http://127.0.0.1:1/idp");

		identity.user_pool_id = "nounderscore".into();
		assert!(identity.pool_name().is_err());
	}

	#[test]
	fn browser_profile_converts_to_headers() {
		let profile = RequestProfile::default();
		let nav = profile.navigate.to_header_map().unwrap();
		assert_eq!(nav.get("sec-fetch-mode").unwrap(), "navigate");
		assert!(nav.get("user-agent").unwrap().to_str().unwrap().contains("Chrome/115"));
		assert!(profile.login.is_empty());
		assert_eq!(profile.cross_site_cors.get("Content-Type"), Some("application/json"));
	}

	#[test]
	fn invalid_header_is_config_error() {
		let set = HeaderSet::from_pairs(&[("bad header", "x")]);
		assert!(matches!(set.to_header_map(), Err(Error::Config(_))));
	}
}
