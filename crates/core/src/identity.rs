//! Credential exchange against the Cognito user pool.
//!
//! Runs the two-round-trip SRP flow and returns the token triple. The
//! password never leaves this module in any form other than the SRP claim.

use std::collections::BTreeMap;

use reinvent_protocol::{
	AMZ_JSON_CONTENT_TYPE, AuthenticationResult, IdentityOperation, InitiateAuthRequest, InitiateAuthResponse,
	PASSWORD_VERIFIER, RespondToAuthChallengeRequest, RespondToAuthChallengeResponse, ServiceErrorBody,
};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::IdentityConfig;
use crate::error::{Error, Result};
use crate::redact::Redactor;
use crate::srp::{self, SrpClient, VerifierChallenge};

/// Username and password, held only for the duration of a login.
#[derive(Clone)]
pub struct Credentials {
	username: String,
	password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}

	pub fn username(&self) -> &str {
		&self.username
	}
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &"***")
			.field("password", &"***")
			.finish()
	}
}

/// Short-lived tokens issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
	pub access_token: String,
	pub refresh_token: String,
	pub id_token: String,
}

impl std::fmt::Debug for TokenSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TokenSet").finish_non_exhaustive()
	}
}

impl TryFrom<AuthenticationResult> for TokenSet {
	type Error = Error;

	fn try_from(result: AuthenticationResult) -> Result<Self> {
		let refresh_token = result
			.refresh_token
			.ok_or_else(|| Error::Authentication("identity provider issued no refresh token".into()))?;
		Ok(TokenSet {
			access_token: result.access_token,
			refresh_token,
			id_token: result.id_token,
		})
	}
}

/// Talks to one user pool over its JSON API.
pub struct CredentialExchange<'a> {
	client: &'a reqwest::Client,
	config: &'a IdentityConfig,
	redactor: Redactor,
}

impl<'a> CredentialExchange<'a> {
	pub fn new(client: &'a reqwest::Client, config: &'a IdentityConfig, redactor: Redactor) -> Self {
		Self { client, config, redactor }
	}

	/// Proves knowledge of the password and returns access, refresh, and ID tokens.
	///
	/// Every failure (rejected credentials, unreachable pool, malformed or
	/// degenerate challenge, unexpected extra challenge) is an
	/// [`Error::Authentication`]. No tokens are returned on failure.
	pub async fn exchange_credentials(&self, credentials: &Credentials) -> Result<TokenSet> {
		info!(target: "reinvent.identity", "requesting identity provider tokens");
		let pool_name = self.config.pool_name()?;
		let srp_client = SrpClient::new();

		let init: InitiateAuthResponse = self
			.call(
				IdentityOperation::InitiateAuth,
				&InitiateAuthRequest::user_srp(&self.config.client_id, &credentials.username, srp_client.public_hex()),
			)
			.await?;

		match init.challenge_name.as_deref() {
			Some(PASSWORD_VERIFIER) => {}
			Some(other) => {
				return Err(Error::Authentication(format!("unsupported challenge {other}")));
			}
			None => {
				return Err(Error::Authentication("identity provider issued no SRP challenge".into()));
			}
		}

		let challenge = verifier_challenge(&init.challenge_parameters)?;
		debug!(
			target: "reinvent.identity",
			user_id_for_srp = %self.redactor.secret(&challenge.user_id_for_srp),
			"password verifier challenge received"
		);

		let ts = srp::timestamp(chrono::Utc::now());
		let claim = srp_client.password_claim(pool_name, &credentials.password, &challenge, &ts)?;

		let mut responses = BTreeMap::new();
		responses.insert("USERNAME".to_string(), claim.user_id_for_srp);
		responses.insert("PASSWORD_CLAIM_SECRET_BLOCK".to_string(), claim.secret_block);
		responses.insert("TIMESTAMP".to_string(), claim.timestamp);
		responses.insert("PASSWORD_CLAIM_SIGNATURE".to_string(), claim.signature);

		let answer: RespondToAuthChallengeResponse = self
			.call(
				IdentityOperation::RespondToAuthChallenge,
				&RespondToAuthChallengeRequest {
					challenge_name: PASSWORD_VERIFIER.to_string(),
					client_id: self.config.client_id.clone(),
					challenge_responses: responses,
					session: init.session,
				},
			)
			.await?;

		if let Some(next) = answer.challenge_name {
			return Err(Error::Authentication(format!("additional challenge {next} is not supported")));
		}
		let tokens = TokenSet::try_from(
			answer
				.authentication_result
				.ok_or_else(|| Error::Authentication("identity provider returned no tokens".into()))?,
		)?;

		debug!(
			target: "reinvent.identity",
			access_token = %self.redactor.redact(&tokens.access_token),
			refresh_token = %self.redactor.redact(&tokens.refresh_token),
			id_token = %self.redactor.redact(&tokens.id_token),
			"tokens issued"
		);
		Ok(tokens)
	}

	async fn call<Req: Serialize, Resp: DeserializeOwned>(&self, op: IdentityOperation, body: &Req) -> Result<Resp> {
		let endpoint = self.config.endpoint()?;
		let response = self
			.client
			.post(endpoint)
			.header(CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
			.header("x-amz-target", op.target())
			.body(serde_json::to_vec(body)?)
			.send()
			.await
			.map_err(|e| Error::Authentication(format!("identity provider unreachable: {}", e.without_url())))?;

		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| Error::Authentication(format!("identity provider response unreadable: {}", e.without_url())))?;

		if !status.is_success() {
			let detail = match serde_json::from_str::<ServiceErrorBody>(&text) {
				Ok(body) => service_error_detail(&body),
				Err(_) => format!("status {}", status.as_u16()),
			};
			return Err(Error::Authentication(detail));
		}

		serde_json::from_str(&text)
			.map_err(|e| Error::Authentication(format!("malformed {op:?} response: {e}")))
	}
}

fn service_error_detail(body: &ServiceErrorBody) -> String {
	match &body.message {
		Some(message) => format!("{}: {message}", body.short_kind()),
		None => body.short_kind().to_string(),
	}
}

fn verifier_challenge(params: &BTreeMap<String, String>) -> Result<VerifierChallenge> {
	let field = |name: &str| {
		params
			.get(name)
			.filter(|v| !v.is_empty())
			.cloned()
			.ok_or_else(|| Error::Authentication(format!("challenge is missing {name}")))
	};
	Ok(VerifierChallenge {
		salt: field("SALT")?,
		srp_b: field("SRP_B")?,
		secret_block: field("SECRET_BLOCK")?,
		user_id_for_srp: field("USER_ID_FOR_SRP")?,
	})
}
