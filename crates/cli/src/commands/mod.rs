mod export;
mod login;
mod merge;

use reinvent::Credentials;

use crate::cli::{Cli, Commands, CredentialArgs};
use crate::config::load_config;
use crate::error::{CliError, Result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	match cli.command {
		Commands::Export(args) => {
			let config = load_config(cli.config.as_deref())?;
			export::execute(&config, args, format).await
		}
		Commands::Login(args) => {
			let config = load_config(cli.config.as_deref())?;
			login::execute(&config, args, format).await
		}
		Commands::Merge(args) => merge::execute(args, format),
	}
}

/// Credentials from flags or environment; neither may be blank.
fn credentials(args: &CredentialArgs) -> Result<Credentials> {
	let username = args
		.username
		.as_deref()
		.filter(|u| !u.trim().is_empty())
		.ok_or_else(|| CliError::InvalidInput("missing username (--username or REINVENT_USERNAME)".into()))?;
	let password = args
		.password
		.as_deref()
		.filter(|p| !p.is_empty())
		.ok_or_else(|| CliError::InvalidInput("missing password (--password or REINVENT_PASSWORD)".into()))?;
	Ok(Credentials::new(username.trim(), password))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(username: Option<&str>, password: Option<&str>) -> CredentialArgs {
		CredentialArgs {
			username: username.map(str::to_string),
			password: password.map(str::to_string),
		}
	}

	#[test]
	fn credentials_require_both_values() {
		assert!(matches!(credentials(&args(None, Some("pw"))), Err(CliError::InvalidInput(_))));
		assert!(matches!(credentials(&args(Some("  "), Some("pw"))), Err(CliError::InvalidInput(_))));
		assert!(matches!(credentials(&args(Some("a@b.test"), Some(""))), Err(CliError::InvalidInput(_))));

		let creds = credentials(&args(Some(" a@b.test "), Some("pw"))).unwrap();
		assert_eq!(creds.username(), "a@b.test");
	}

	#[test]
	fn missing_password_message_does_not_echo_username() {
		let err = credentials(&args(Some("a@b.test"), None)).unwrap_err();
		assert!(!err.to_string().contains("a@b.test"));
	}
}
