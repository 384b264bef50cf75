use reinvent::{PortalConfig, RunOptions, write_json};
use tracing::info;

use crate::cli::ExportArgs;
use crate::error::Result;
use crate::output::{
	Artifact, ArtifactType, CommandInputs, DiagnosticLevel, ExportData, OutputFormat, ResultBuilder, print_result,
};

pub async fn execute(config: &PortalConfig, args: ExportArgs, format: OutputFormat) -> Result<()> {
	let started = std::time::Instant::now();
	let credentials = super::credentials(&args.credentials)?;
	let options = RunOptions {
		include_favorites: !args.no_favorites,
	};

	info!(target: "reinvent.cli", output = %args.output.display(), favorites = options.include_favorites, "exporting catalog");
	let run = reinvent::run(config, &credentials, options).await?;
	write_json(&args.output, &run.merged.catalog)?;

	let data = ExportData {
		sessions: run.merged.catalog.len(),
		favorites: run.merged.catalog.favorite_count(),
		unmatched_favorites: run.merged.unmatched_favorites.clone(),
		user_id: run.user_id.map(|u| u.to_string()),
		output: args.output.clone(),
	};

	let mut builder = ResultBuilder::new("export")
		.started_at(started)
		.inputs(CommandInputs {
			root_url: Some(config.root_url.clone()),
			output_path: Some(args.output.clone()),
			include_favorites: Some(options.include_favorites),
			..Default::default()
		})
		.artifact(Artifact::written(ArtifactType::Catalog, &args.output));

	if !data.unmatched_favorites.is_empty() {
		builder = builder.diagnostic_with_source(
			DiagnosticLevel::Warning,
			format!(
				"{} favorite(s) reference sessions missing from the catalog",
				data.unmatched_favorites.len()
			),
			"merge",
		);
	}

	print_result(&builder.data(data).build(), format);
	Ok(())
}
