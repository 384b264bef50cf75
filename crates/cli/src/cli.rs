use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Cargo-like help colours.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "reinvent")]
#[command(about = "Export the attendee portal session catalog annotated with your favorites")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: toon (default), json, ndjson, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "toon")]
	pub format: OutputFormat,

	/// Portal configuration overlay (JSON); defaults to $XDG_CONFIG_HOME/reinvent/config.json
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Log in, fetch sessions and favorites, and write the merged catalog
	Export(ExportArgs),

	/// Run the login handshake only and report the issued session
	Login(LoginArgs),

	/// Merge previously captured sessions and favorites payloads offline
	Merge(MergeArgs),
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Export(_) => "export",
			Commands::Login(_) => "login",
			Commands::Merge(_) => "merge",
		}
	}
}

/// Portal account. Never read from the config file.
#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
	/// Portal username (email)
	#[arg(long, env = "REINVENT_USERNAME", value_name = "EMAIL")]
	pub username: Option<String>,

	/// Portal password
	#[arg(long, env = "REINVENT_PASSWORD", hide_env_values = true, value_name = "PASSWORD")]
	pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
	#[command(flatten)]
	pub credentials: CredentialArgs,

	/// Where to write the merged catalog
	#[arg(short, long, value_name = "FILE", default_value = "sessions.json")]
	pub output: PathBuf,

	/// Skip user resolution and favorites; every record is marked not favorite
	#[arg(long)]
	pub no_favorites: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
	#[command(flatten)]
	pub credentials: CredentialArgs,

	/// Stop after cookie issuance instead of resolving the user id
	#[arg(long)]
	pub no_user: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
	/// Sessions payload: a JSON array or the `{"data": [...]}` envelope
	#[arg(long, value_name = "FILE")]
	pub sessions: PathBuf,

	/// Favorites payload: `{"followedSessions": [...]}` or its envelope
	#[arg(long, value_name = "FILE")]
	pub favorites: Option<PathBuf>,

	/// Write the merged catalog here instead of embedding it in the result
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,
}
