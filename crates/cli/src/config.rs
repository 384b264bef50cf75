//! Locating and loading the portal configuration overlay.

use std::path::{Path, PathBuf};

use reinvent::PortalConfig;
use tracing::debug;

use crate::error::{CliError, Result};

/// `$XDG_CONFIG_HOME/reinvent/config.json`, falling back to `~/.config`.
pub fn default_config_path() -> Option<PathBuf> {
	std::env::var_os("XDG_CONFIG_HOME")
		.filter(|v| !v.is_empty())
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
		.map(|dir| dir.join("reinvent").join("config.json"))
}

/// Loads the overlay named by `--config`, or the default file when present.
///
/// An explicit path must exist. A missing default file means built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<PortalConfig> {
	if let Some(path) = explicit {
		if !path.is_file() {
			return Err(CliError::InvalidInput(format!("config file {} does not exist", path.display())));
		}
		debug!(target: "reinvent.cli", path = %path.display(), "loading config");
		return Ok(PortalConfig::from_file(path)?);
	}

	match default_config_path() {
		Some(path) if path.is_file() => {
			debug!(target: "reinvent.cli", path = %path.display(), "loading default config");
			Ok(PortalConfig::from_file(&path)?)
		}
		_ => Ok(PortalConfig::default()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_overlay_is_applied() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("portal.json");
		std::fs::write(&path, r#"{"rootUrl": "http://127.0.0.1:9", "timeoutSecs": 3}"#).unwrap();

		let config = load_config(Some(&path)).unwrap();

		assert_eq!(config.root_url, "http://127.0.0.1:9");
		assert_eq!(config.timeout_secs, 3);
		assert_eq!(config.sessions_path, PortalConfig::default().sessions_path);
	}

	#[test]
	fn missing_explicit_file_is_invalid_input() {
		let dir = tempfile::tempdir().unwrap();
		let err = load_config(Some(&dir.path().join("absent.json"))).unwrap_err();
		assert!(matches!(err, CliError::InvalidInput(_)));
	}

	#[test]
	fn malformed_overlay_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("portal.json");
		std::fs::write(&path, "{ not json").unwrap();

		let err = load_config(Some(&path)).unwrap_err();
		assert_eq!(err.to_command_error().code, crate::output::ErrorCode::InvalidInput);
	}
}
