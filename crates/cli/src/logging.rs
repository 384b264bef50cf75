//! Diagnostic logging to stderr.
//!
//! Stdout carries the result envelope only, so every log line goes to stderr.
//! `RUST_LOG` overrides the verbosity flag entirely.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter directives for a `-v` count.
pub fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error",
		// handshake steps and fetch counts, HTTP stack stays quiet
		1 => "warn,reinvent=info,reinvent_cli=info",
		_ => "debug,hyper_util=info,rustls=info",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_ansi(std::io::stderr().is_terminal())
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
