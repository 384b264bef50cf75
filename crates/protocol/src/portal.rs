//! Portal API payloads.
//!
//! Every portal endpoint answers with a `{"data": ...}` envelope. Session
//! objects carry many more fields than the pipeline reads, so a
//! [`RawSession`] keeps the object exactly as sent and only reads the few
//! fields the merge needs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One entry of the sessions list, as the portal sends it.
///
/// Serializing gives back the same keys and values, including `null`s, and
/// never adds keys the portal left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSession {
	fields: Map<String, Value>,
}

impl RawSession {
	/// Minimal session used by fixtures and offline merges.
	pub fn new(third_party_id: impl Into<String>, schedule_uid: impl Into<String>, title: impl Into<String>) -> Self {
		Self::default()
			.with("thirdPartyID", third_party_id.into())
			.with("scheduleUid", schedule_uid.into())
			.with("title", title.into())
	}

	/// Sets `key`, replacing any previous value.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(key.into(), value.into());
		self
	}

	pub fn with_tags(self, tags: impl IntoIterator<Item = Tag>) -> Self {
		let tags = tags
			.into_iter()
			.filter_map(|tag| serde_json::to_value(tag).ok())
			.collect::<Vec<_>>();
		self.with("tags", tags)
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.fields.remove(key)
	}

	pub fn fields(&self) -> &Map<String, Value> {
		&self.fields
	}

	/// `thirdPartyID`, or `""` when absent or not a string.
	pub fn third_party_id(&self) -> &str {
		self.text("thirdPartyID").unwrap_or_default()
	}

	pub fn schedule_uid(&self) -> Option<&str> {
		self.text("scheduleUid")
	}

	/// `title`, or `""` when absent or not a string.
	pub fn title(&self) -> &str {
		self.text("title").unwrap_or_default()
	}

	/// Well-formed entries of `tags`, in portal order. Entries that are not
	/// tag objects are skipped.
	pub fn tags(&self) -> Vec<Tag> {
		match self.fields.get("tags") {
			Some(Value::Array(items)) => items
				.iter()
				.filter_map(|item| Tag::deserialize(item).ok())
				.collect(),
			_ => Vec::new(),
		}
	}

	fn text(&self, key: &str) -> Option<&str> {
		self.fields.get(key).and_then(Value::as_str)
	}
}

/// A `(category, value)` tag pair such as `("Venue", "Mandalay Bay")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
	#[serde(default)]
	pub parent_tag_name: String,
	#[serde(default)]
	pub tag_name: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Tag {
	pub fn new(parent_tag_name: impl Into<String>, tag_name: impl Into<String>) -> Self {
		Self {
			parent_tag_name: parent_tag_name.into(),
			tag_name: tag_name.into(),
			extra: Map::new(),
		}
	}
}

/// `data` of the favorites endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesPayload {
	pub followed_sessions: Vec<FollowedSession>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl FavoritesPayload {
	pub fn from_schedule_uids<I, S>(uids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			followed_sessions: uids
				.into_iter()
				.map(|uid| FollowedSession {
					schedule_uid: uid.into(),
					extra: Map::new(),
				})
				.collect(),
			extra: Map::new(),
		}
	}
}

/// One followed-session entry; only `scheduleUid` is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedSession {
	pub schedule_uid: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// `data` of the user-info endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
	pub user_uid: UserId,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Opaque user identifier. The portal has sent it both as a JSON string and
/// as a number, so both deserialize into the same text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for UserId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for UserId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Text(String),
			Number(serde_json::Number),
		}

		match Repr::deserialize(deserializer)? {
			Repr::Text(s) if !s.is_empty() => Ok(UserId(s)),
			Repr::Text(_) => Err(serde::de::Error::custom("userUid is empty")),
			Repr::Number(n) => Ok(UserId(n.to_string())),
		}
	}
}

/// Body of the backend storage handoff POST.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageHandoff {
	pub authorization_code: String,
	pub id_token: String,
	pub access_token: String,
	pub refresh_token: String,
}

impl std::fmt::Debug for StorageHandoff {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StorageHandoff").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn raw_session_keeps_unknown_fields() {
		let raw = json!({
			"thirdPartyID": "DOP301-R",
			"scheduleUid": "sch-1",
			"title": "Chaos at scale",
			"startDateTime": 1701100800,
			"endDateTime": "",
			"tags": [{ "parentTagName": "Venue", "tagName": "Wynn", "tagId": 9 }],
			"sessionUid": "ses-1",
			"capacity": 120
		});

		let session: RawSession = serde_json::from_value(raw.clone()).unwrap();
		assert_eq!(session.third_party_id(), "DOP301-R");
		assert_eq!(session.schedule_uid(), Some("sch-1"));
		assert_eq!(session.get("sessionUid"), Some(&json!("ses-1")));
		assert_eq!(session.tags()[0].extra["tagId"], 9);

		assert_eq!(serde_json::to_value(&session).unwrap(), raw);
	}

	#[test]
	fn raw_session_round_trips_nulls_without_adding_keys() {
		let raw = json!({
			"thirdPartyID": "DOP301",
			"scheduleUid": "u1",
			"title": "T",
			"description": null,
			"trackName": null,
			"startDateTime": null
		});

		let session: RawSession = serde_json::from_value(raw.clone()).unwrap();

		assert!(session.tags().is_empty());
		assert_eq!(serde_json::to_value(&session).unwrap(), raw);
	}

	#[test]
	fn raw_session_accessors_tolerate_odd_shapes() {
		let session: RawSession = serde_json::from_value(json!({
			"thirdPartyID": 301,
			"scheduleUid": null,
			"tags": [{ "parentTagName": "Day", "tagName": "Monday" }, "loose", 4]
		}))
		.unwrap();

		assert_eq!(session.third_party_id(), "");
		assert_eq!(session.schedule_uid(), None);
		assert_eq!(session.title(), "");
		assert_eq!(session.tags(), vec![Tag::new("Day", "Monday")]);
		assert!(serde_json::from_value::<RawSession>(json!(["not", "an", "object"])).is_err());
	}

	#[test]
	fn user_id_accepts_string_or_number() {
		let text: UserInfo = serde_json::from_value(json!({ "userUid": "u-42" })).unwrap();
		let number: UserInfo = serde_json::from_value(json!({ "userUid": 42 })).unwrap();

		assert_eq!(text.user_uid.as_str(), "u-42");
		assert_eq!(number.user_uid.as_str(), "42");
		assert!(serde_json::from_value::<UserInfo>(json!({ "userUid": "" })).is_err());
		assert!(serde_json::from_value::<UserInfo>(json!({ "name": "x" })).is_err());
	}

	#[test]
	fn storage_handoff_debug_hides_tokens() {
		let handoff = StorageHandoff {
			authorization_code: "code-secret".into(),
			id_token: "id-secret".into(),
			access_token: "access-secret".into(),
			refresh_token: "refresh-secret".into(),
		};
		let debug = format!("{handoff:?}");
		assert!(!debug.contains("secret"));

		let body = serde_json::to_value(&handoff).unwrap();
		assert_eq!(body["authorization_code"], "code-secret");
		assert_eq!(body["refresh_token"], "refresh-secret");
	}
}
