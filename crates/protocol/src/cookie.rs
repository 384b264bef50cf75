//! Cookie value types captured from `Set-Cookie` response headers.
//!
//! The login handshake ends with a redirect whose `Set-Cookie` headers form
//! the authenticated jar. [`CookieJar`] keeps those cookies in arrival order
//! and renders them back into a single `Cookie` request header.

use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
	#[serde(rename = "None")]
	None,
	#[default]
	#[serde(rename = "Lax")]
	Lax,
	#[serde(rename = "Strict")]
	Strict,
}

impl SameSite {
	fn parse(value: &str) -> Self {
		match value.to_ascii_lowercase().as_str() {
			"strict" => SameSite::Strict,
			"none" => SameSite::None,
			_ => SameSite::Lax,
		}
	}
}

/// A cookie as announced by a `Set-Cookie` header.
///
/// `Debug` output masks the value.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,
	pub value: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	/// Raw `Expires` attribute, kept as sent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_age: Option<i64>,
	#[serde(default)]
	pub http_only: bool,
	#[serde(default)]
	pub secure: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

impl Cookie {
	/// Creates a cookie with only a name and value.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: None,
			path: None,
			expires: None,
			max_age: None,
			http_only: false,
			secure: false,
			same_site: None,
		}
	}

	/// Parses one `Set-Cookie` header value.
	///
	/// Returns [`None`] when the leading `name=value` pair is missing or the
	/// name is empty. The value is kept as sent, quotes included, so it is
	/// replayed byte for byte. Unknown attributes are ignored.
	pub fn parse_set_cookie(header: &str) -> Option<Self> {
		let mut parts = header.split(';');
		let (name, value) = parts.next()?.split_once('=')?;
		let name = name.trim();
		if name.is_empty() {
			return None;
		}

		let mut cookie = Cookie::new(name, value.trim());
		for attr in parts {
			let (key, val) = match attr.split_once('=') {
				Some((k, v)) => (k.trim(), Some(v.trim())),
				None => (attr.trim(), None),
			};
			match (key.to_ascii_lowercase().as_str(), val) {
				("domain", Some(v)) => cookie.domain = Some(v.to_string()),
				("path", Some(v)) => cookie.path = Some(v.to_string()),
				("expires", Some(v)) => cookie.expires = Some(v.to_string()),
				("max-age", Some(v)) => cookie.max_age = v.parse().ok(),
				("samesite", Some(v)) => cookie.same_site = Some(SameSite::parse(v)),
				("httponly", _) => cookie.http_only = true,
				("secure", _) => cookie.secure = true,
				_ => {}
			}
		}
		Some(cookie)
	}

	/// Whether the server asked for this cookie to be dropped immediately.
	pub fn is_removal(&self) -> bool {
		self.max_age.is_some_and(|age| age <= 0)
	}
}

impl std::fmt::Debug for Cookie {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Cookie")
			.field("name", &self.name)
			.field("value", &"***")
			.field("domain", &self.domain)
			.field("path", &self.path)
			.field("http_only", &self.http_only)
			.field("secure", &self.secure)
			.finish_non_exhaustive()
	}
}

/// Ordered set of cookies, unique by `(name, domain, path)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CookieJar {
	cookies: Vec<Cookie>,
}

impl CookieJar {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a jar from raw `Set-Cookie` header values, skipping malformed ones.
	pub fn from_set_cookie_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
		let mut jar = Self::new();
		for header in headers {
			if let Some(cookie) = Cookie::parse_set_cookie(header) {
				jar.insert(cookie);
			}
		}
		jar
	}

	/// Inserts a cookie, replacing one with the same name, domain, and path.
	///
	/// A removal cookie (`Max-Age <= 0`) deletes the match instead.
	pub fn insert(&mut self, cookie: Cookie) {
		let existing = self
			.cookies
			.iter()
			.position(|c| c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path);
		match (existing, cookie.is_removal()) {
			(Some(idx), true) => {
				self.cookies.remove(idx);
			}
			(Some(idx), false) => self.cookies[idx] = cookie,
			(None, true) => {}
			(None, false) => self.cookies.push(cookie),
		}
	}

	pub fn get(&self, name: &str) -> Option<&Cookie> {
		self.cookies.iter().find(|c| c.name == name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
		self.cookies.iter()
	}

	pub fn names(&self) -> Vec<&str> {
		self.cookies.iter().map(|c| c.name.as_str()).collect()
	}

	pub fn len(&self) -> usize {
		self.cookies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cookies.is_empty()
	}

	/// Renders the jar as a `Cookie` request header value (`a=1; b=2`).
	pub fn header_value(&self) -> Option<String> {
		if self.cookies.is_empty() {
			return None;
		}
		Some(
			self.cookies
				.iter()
				.map(|c| format!("{}={}", c.name, c.value))
				.collect::<Vec<_>>()
				.join("; "),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_attributes_case_insensitively() {
		let cookie = Cookie::parse_set_cookie(
			"sessionid=abc123; Domain=.awsevents.com; Path=/; HttpOnly; secure; SameSite=None; Max-Age=3600",
		)
		.unwrap();

		assert_eq!(cookie.name, "sessionid");
		assert_eq!(cookie.value, "abc123");
		assert_eq!(cookie.domain.as_deref(), Some(".awsevents.com"));
		assert_eq!(cookie.path.as_deref(), Some("/"));
		assert_eq!(cookie.max_age, Some(3600));
		assert!(cookie.http_only);
		assert!(cookie.secure);
		assert_eq!(cookie.same_site, Some(SameSite::None));
	}

	#[test]
	fn value_may_contain_equals_sign() {
		let cookie = Cookie::parse_set_cookie("token=a=b==; Path=/").unwrap();
		assert_eq!(cookie.value, "a=b==");
	}

	#[test]
	fn quoted_value_is_replayed_as_sent() {
		let jar = CookieJar::from_set_cookie_headers([r#"pref="a b"; Path=/"#, "id=  x1  ; Secure"]);
		assert_eq!(jar.get("pref").unwrap().value, r#""a b""#);
		assert_eq!(jar.get("id").unwrap().value, "x1");
		assert_eq!(jar.header_value().as_deref(), Some(r#"pref="a b"; id=x1"#));
	}

	#[test]
	fn rejects_header_without_pair() {
		assert!(Cookie::parse_set_cookie("HttpOnly").is_none());
		assert!(Cookie::parse_set_cookie("=value").is_none());
	}

	#[test]
	fn jar_replaces_and_removes_by_identity() {
		let jar = CookieJar::from_set_cookie_headers([
			"a=1; Path=/",
			"b=2; Path=/",
			"a=3; Path=/",
			"b=; Path=/; Max-Age=0",
			"garbage",
		]);

		assert_eq!(jar.names(), vec!["a"]);
		assert_eq!(jar.get("a").unwrap().value, "3");
		assert_eq!(jar.header_value().as_deref(), Some("a=3"));
	}

	#[test]
	fn empty_jar_has_no_header() {
		assert!(CookieJar::new().header_value().is_none());
	}

	#[test]
	fn debug_masks_value() {
		let jar = CookieJar::from_set_cookie_headers(["portal_session=sess-abc; Path=/"]);
		let debug = format!("{jar:?}");
		assert!(debug.contains("portal_session"));
		assert!(!debug.contains("sess-abc"));
	}
}
