//! End-to-end run: log in, fetch, merge.

use std::path::Path;

use reinvent_protocol::{CookieJar, FavoritesPayload, UserId};
use tracing::info;

use crate::bootstrap::SessionBootstrapper;
use crate::config::PortalConfig;
use crate::error::Result;
use crate::fetch::DataFetcher;
use crate::identity::Credentials;
use crate::merge::{MergeOutcome, merge};

/// Knobs for a single [`run`].
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
	/// Resolve the user and fetch their favorites. When off, every record is
	/// flagged `isFavorite: false` and the user-info call is skipped.
	pub include_favorites: bool,
}

impl Default for RunOptions {
	fn default() -> Self {
		Self { include_favorites: true }
	}
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
	pub merged: MergeOutcome,
	pub cookies: CookieJar,
	pub user_id: Option<UserId>,
}

/// Runs the whole pipeline from a clean cookie store.
///
/// Any failing stage aborts the run; no partial catalog is returned.
pub async fn run(config: &PortalConfig, credentials: &Credentials, options: RunOptions) -> Result<RunOutput> {
	let bootstrapper = SessionBootstrapper::new(config)?;

	let (cookies, user_id) = if options.include_favorites {
		let session = bootstrapper.bootstrap_with_user(credentials).await?;
		(session.cookies, Some(session.user_id))
	} else {
		(bootstrapper.bootstrap_session(credentials).await?, None)
	};

	let fetcher = DataFetcher::new(config, &cookies)?;
	let (sessions, favorites) = match &user_id {
		Some(user) => tokio::try_join!(fetcher.fetch_sessions(), fetcher.fetch_favorites(user))?,
		None => (fetcher.fetch_sessions().await?, FavoritesPayload::default()),
	};

	let merged = merge(&sessions, &favorites);
	info!(
		target: "reinvent.pipeline",
		sessions = merged.catalog.len(),
		favorites = merged.catalog.favorite_count(),
		unmatched = merged.unmatched_favorites.len(),
		"run complete"
	);
	Ok(RunOutput {
		merged,
		cookies,
		user_id,
	})
}

/// Writes `value` as a pretty-printed JSON document, creating parent
/// directories as needed.
pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)?;
	}
	let mut content = serde_json::to_string_pretty(value)?;
	content.push('\n');
	std::fs::write(path, content)?;
	Ok(())
}
