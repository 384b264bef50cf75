//! Offline merge of captured portal payloads.

use std::path::Path;

use reinvent_protocol::{FavoritesPayload, RawSession};
use reinvent::{merge, write_json};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cli::MergeArgs;
use crate::error::{CliError, Result};
use crate::output::{
	Artifact, ArtifactType, CommandInputs, DiagnosticLevel, MergeData, OutputFormat, ResultBuilder, print_result,
};

pub fn execute(args: MergeArgs, format: OutputFormat) -> Result<()> {
	let started = std::time::Instant::now();
	let sessions: Vec<RawSession> = read_payload(&args.sessions)?;
	let favorites: FavoritesPayload = match &args.favorites {
		Some(path) => read_payload(path)?,
		None => FavoritesPayload::default(),
	};

	let outcome = merge(&sessions, &favorites);

	let mut builder = ResultBuilder::new("merge").started_at(started).inputs(CommandInputs {
		sessions_path: Some(args.sessions.clone()),
		favorites_path: args.favorites.clone(),
		output_path: args.output.clone(),
		..Default::default()
	});

	let records = match &args.output {
		Some(path) => {
			write_json(path, &outcome.catalog)?;
			builder = builder.artifact(Artifact::written(ArtifactType::Catalog, path));
			None
		}
		None => Some(outcome.catalog.clone()),
	};

	if !outcome.unmatched_favorites.is_empty() {
		builder = builder.diagnostic_with_source(
			DiagnosticLevel::Warning,
			format!(
				"{} favorite(s) reference sessions missing from the catalog",
				outcome.unmatched_favorites.len()
			),
			"merge",
		);
	}

	let data = MergeData {
		sessions: outcome.catalog.len(),
		favorites: outcome.catalog.favorite_count(),
		unmatched_favorites: outcome.unmatched_favorites,
		records,
	};
	print_result(&builder.data(data).build(), format);
	Ok(())
}

/// Reads a payload saved either bare or inside the portal's `{"data": ...}` envelope.
fn read_payload<T: DeserializeOwned>(path: &Path) -> Result<T> {
	let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	let payload_error = |source| CliError::Payload {
		path: path.to_path_buf(),
		source,
	};

	let value: Value = serde_json::from_str(&content).map_err(payload_error)?;
	let value = match value {
		Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
		other => other,
	};
	serde_json::from_value(value).map_err(payload_error)
}
