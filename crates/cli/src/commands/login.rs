use reinvent::{PortalConfig, SessionBootstrapper};

use crate::cli::LoginArgs;
use crate::error::Result;
use crate::output::{CommandInputs, DiagnosticLevel, LoginData, OutputFormat, ResultBuilder, print_result};

pub async fn execute(config: &PortalConfig, args: LoginArgs, format: OutputFormat) -> Result<()> {
	let started = std::time::Instant::now();
	let credentials = super::credentials(&args.credentials)?;
	let bootstrapper = SessionBootstrapper::new(config)?;

	let (cookies, user_id) = if args.no_user {
		(bootstrapper.bootstrap_session(&credentials).await?, None)
	} else {
		let session = bootstrapper.bootstrap_with_user(&credentials).await?;
		(session.cookies, Some(session.user_id.to_string()))
	};

	let data = LoginData {
		cookies: cookies.names().into_iter().map(str::to_string).collect(),
		cookie_count: cookies.len(),
		user_id,
	};

	let mut builder = ResultBuilder::new("login").started_at(started).inputs(CommandInputs {
		root_url: Some(config.root_url.clone()),
		..Default::default()
	});
	if cookies.is_empty() {
		builder = builder.diagnostic_with_source(
			DiagnosticLevel::Warning,
			"cookie endpoint issued no cookies; data calls will likely be rejected",
			"bootstrap",
		);
	}

	print_result(&builder.data(data).build(), format);
	Ok(())
}
