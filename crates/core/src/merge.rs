//! Joins the session catalog with the user's favorites.

use std::collections::HashMap;

use reinvent_protocol::{FavoritesPayload, RawSession};
use serde::Serialize;
use tracing::{debug, warn};

/// Fields added to every merged record. Raw fields with the same names are
/// dropped so the output never carries duplicate keys.
const DERIVED_FIELDS: [&str; 4] = ["isFavorite", "sessionLevel", "venue", "day"];

/// Character offset of the level digit inside `thirdPartyID` (e.g. `DOP`**`3`**`01`).
const LEVEL_OFFSET: usize = 3;

/// One catalog entry annotated for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	#[serde(flatten)]
	pub session: RawSession,
	pub is_favorite: bool,
	pub session_level: u32,
	pub venue: String,
	pub day: String,
}

impl SessionRecord {
	fn annotate(session: &RawSession) -> Self {
		let mut session = session.clone();
		for field in DERIVED_FIELDS {
			session.remove(field);
		}
		Self {
			session_level: session_level(session.third_party_id()),
			venue: tag_value(&session, "Venue"),
			day: tag_value(&session, "Day"),
			is_favorite: false,
			session,
		}
	}
}

/// Merged records, sorted by title. Serializes as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedCatalog(pub Vec<SessionRecord>);

impl MergedCatalog {
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> {
		self.0.iter()
	}

	pub fn favorite_count(&self) -> usize {
		self.0.iter().filter(|r| r.is_favorite).count()
	}
}

impl IntoIterator for MergedCatalog {
	type Item = SessionRecord;
	type IntoIter = std::vec::IntoIter<SessionRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Merge result plus the favorites that matched no catalog session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
	pub catalog: MergedCatalog,
	pub unmatched_favorites: Vec<String>,
}

/// Flags every session followed in `favorites` and sorts by title.
///
/// Inputs are only borrowed, so merging the same payloads twice gives the
/// same catalog. The sort is stable: equal titles keep catalog order.
pub fn merge(sessions: &[RawSession], favorites: &FavoritesPayload) -> MergeOutcome {
	let mut records: Vec<SessionRecord> = sessions.iter().map(SessionRecord::annotate).collect();

	let mut by_uid: HashMap<&str, Vec<usize>> = HashMap::with_capacity(sessions.len());
	for (index, session) in sessions.iter().enumerate() {
		if let Some(uid) = session.schedule_uid() {
			by_uid.entry(uid).or_default().push(index);
		}
	}

	let mut unmatched_favorites = Vec::new();
	for followed in &favorites.followed_sessions {
		match by_uid.get(followed.schedule_uid.as_str()) {
			Some(indices) => {
				for &index in indices {
					records[index].is_favorite = true;
				}
			}
			None => unmatched_favorites.push(followed.schedule_uid.clone()),
		}
	}

	if !unmatched_favorites.is_empty() {
		warn!(
			target: "reinvent.merge",
			count = unmatched_favorites.len(),
			schedule_uids = ?unmatched_favorites,
			"favorites reference sessions missing from the catalog"
		);
	}

	records.sort_by(|a, b| a.session.title().cmp(b.session.title()));

	let catalog = MergedCatalog(records);
	debug!(
		target: "reinvent.merge",
		sessions = catalog.len(),
		favorites = catalog.favorite_count(),
		"catalog merged"
	);
	MergeOutcome {
		catalog,
		unmatched_favorites,
	}
}

/// Level digit of a session id such as `DOP301`; 0 when absent.
pub fn session_level(third_party_id: &str) -> u32 {
	third_party_id
		.chars()
		.nth(LEVEL_OFFSET)
		.and_then(|c| c.to_digit(10))
		.unwrap_or(0)
}

fn tag_value(session: &RawSession, parent: &str) -> String {
	session
		.tags()
		.into_iter()
		.rev()
		.find(|tag| tag.parent_tag_name == parent)
		.map(|tag| tag.tag_name)
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use reinvent_protocol::Tag;
	use serde_json::json;

	use super::*;

	fn titles(outcome: &MergeOutcome) -> Vec<&str> {
		outcome.catalog.iter().map(|r| r.session.title()).collect()
	}

	#[test]
	fn flags_followed_sessions_and_defaults_the_rest() {
		let sessions = vec![
			RawSession::new("DOP301", "u1", "Observability"),
			RawSession::new("SEC202", "u2", "Identity"),
			RawSession::new("NET101", "u3", "Networking"),
		];
		let favorites = FavoritesPayload::from_schedule_uids(["u2", "u3"]);

		let outcome = merge(&sessions, &favorites);

		assert_eq!(outcome.catalog.len(), 3);
		let flags: Vec<(&str, bool)> = outcome
			.catalog
			.iter()
			.map(|r| (r.session.schedule_uid().unwrap(), r.is_favorite))
			.collect();
		assert_eq!(flags, vec![("u2", true), ("u3", true), ("u1", false)]);
		assert!(outcome.unmatched_favorites.is_empty());
	}

	#[test]
	fn unmatched_favorites_are_reported() {
		let sessions = vec![RawSession::new("DOP301", "u1", "Observability")];
		let favorites = FavoritesPayload::from_schedule_uids(["gone", "u1"]);

		let outcome = merge(&sessions, &favorites);

		assert_eq!(outcome.unmatched_favorites, vec!["gone".to_string()]);
		assert!(outcome.catalog.0[0].is_favorite);
	}

	#[test]
	fn sort_is_stable_for_equal_titles() {
		let sessions = vec![
			RawSession::new("X001", "b", "B"),
			RawSession::new("X002", "a1", "A"),
			RawSession::new("X003", "a2", "A"),
		];

		let outcome = merge(&sessions, &FavoritesPayload::default());

		assert_eq!(titles(&outcome), vec!["A", "A", "B"]);
		let uids: Vec<_> = outcome
			.catalog
			.iter()
			.map(|r| r.session.schedule_uid().unwrap())
			.collect();
		assert_eq!(uids, vec!["a1", "a2", "b"]);
	}

	#[test]
	fn merging_twice_gives_identical_output() {
		let sessions = vec![RawSession::new("X001", "b", "B"), RawSession::new("X002", "a", "A")];
		let favorites = FavoritesPayload::from_schedule_uids(["a"]);

		let first = merge(&sessions, &favorites);
		let second = merge(&sessions, &favorites);

		assert_eq!(first, second);
		assert_eq!(sessions[0].title(), "B");
	}

	#[test]
	fn session_without_schedule_uid_is_never_favorite() {
		let mut session = RawSession::new("X001", "", "Keynote");
		session.remove("scheduleUid");

		let outcome = merge(&[session], &FavoritesPayload::from_schedule_uids([""]));

		assert!(!outcome.catalog.0[0].is_favorite);
		assert_eq!(outcome.unmatched_favorites, vec![String::new()]);
	}

	#[test]
	fn session_level_reads_fourth_character() {
		assert_eq!(session_level("DOP301"), 3);
		assert_eq!(session_level("AIM2"), 2);
		assert_eq!(session_level("KEY"), 0);
		assert_eq!(session_level(""), 0);
		assert_eq!(session_level("KEYNOTE"), 0);
	}

	#[test]
	fn venue_and_day_come_from_tags() {
		let session = RawSession::new("DOP301", "u1", "Observability").with_tags([
			Tag::new("Venue", "Venetian"),
			Tag::new("Day", "Tuesday"),
			Tag::new("Venue", "Mandalay Bay"),
		]);

		let record = &merge(&[session], &FavoritesPayload::default()).catalog.0[0];

		assert_eq!(record.venue, "Mandalay Bay");
		assert_eq!(record.day, "Tuesday");
	}

	#[test]
	fn serializes_raw_fields_with_annotations() {
		let session: RawSession = serde_json::from_value(json!({
			"thirdPartyID": "DOP301",
			"scheduleUid": "u1",
			"title": "Observability",
			"room": "Level 2",
			"abstract": null,
			"tags": [{ "parentTagName": "Day", "tagName": "Monday" }],
			"isFavorite": true
		}))
		.unwrap();

		let outcome = merge(&[session], &FavoritesPayload::default());
		let value = serde_json::to_value(&outcome.catalog).unwrap();

		let record = &value[0];
		assert_eq!(record["room"], "Level 2");
		assert_eq!(record["thirdPartyID"], "DOP301");
		assert_eq!(record["isFavorite"], false);
		assert_eq!(record["sessionLevel"], 3);
		assert_eq!(record["day"], "Monday");
		assert_eq!(record["venue"], "");
		assert!(record["abstract"].is_null());
		assert_eq!(record.as_object().unwrap().len(), 10);
	}
}
