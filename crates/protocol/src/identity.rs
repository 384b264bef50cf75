//! Cognito identity provider JSON API types.
//!
//! The user-pool API is a single endpoint per region. The operation is
//! selected with the `X-Amz-Target` header and bodies use
//! `application/x-amz-json-1.1` with PascalCase keys:
//!
//! 1. Client sends [`InitiateAuthRequest`] (`USER_SRP_AUTH`, `SRP_A`)
//! 2. Server answers [`InitiateAuthResponse`] with a `PASSWORD_VERIFIER` challenge
//! 3. Client sends [`RespondToAuthChallengeRequest`] carrying the password claim
//! 4. Server answers [`RespondToAuthChallengeResponse`] with an [`AuthenticationResult`]
//!
//! Failures come back as a non-2xx status with a [`ServiceErrorBody`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Content type required by the user-pool API.
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// `AuthFlow` value for the secure remote password flow.
pub const USER_SRP_AUTH: &str = "USER_SRP_AUTH";

/// Challenge name answered with a password claim.
pub const PASSWORD_VERIFIER: &str = "PASSWORD_VERIFIER";

/// User-pool API operations used by the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOperation {
	InitiateAuth,
	RespondToAuthChallenge,
}

impl IdentityOperation {
	/// Value for the `X-Amz-Target` header.
	pub fn target(self) -> &'static str {
		match self {
			IdentityOperation::InitiateAuth => "AWSCognitoIdentityProviderService.InitiateAuth",
			IdentityOperation::RespondToAuthChallenge => "AWSCognitoIdentityProviderService.RespondToAuthChallenge",
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateAuthRequest {
	pub auth_flow: String,
	pub client_id: String,
	pub auth_parameters: BTreeMap<String, String>,
}

impl InitiateAuthRequest {
	/// Starts the SRP flow for `username` with the client public value `srp_a` (hex).
	pub fn user_srp(client_id: impl Into<String>, username: impl Into<String>, srp_a: impl Into<String>) -> Self {
		let mut auth_parameters = BTreeMap::new();
		auth_parameters.insert("USERNAME".to_string(), username.into());
		auth_parameters.insert("SRP_A".to_string(), srp_a.into());
		Self {
			auth_flow: USER_SRP_AUTH.to_string(),
			client_id: client_id.into(),
			auth_parameters,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateAuthResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub challenge_name: Option<String>,
	#[serde(default)]
	pub challenge_parameters: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RespondToAuthChallengeRequest {
	pub challenge_name: String,
	pub client_id: String,
	pub challenge_responses: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RespondToAuthChallengeResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub challenge_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication_result: Option<AuthenticationResult>,
}

/// Tokens issued once the challenge is answered.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
	pub access_token: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	pub id_token: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
}

impl std::fmt::Debug for AuthenticationResult {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthenticationResult")
			.field("expires_in", &self.expires_in)
			.field("token_type", &self.token_type)
			.finish_non_exhaustive()
	}
}

/// Error body returned with a 4xx/5xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
	#[serde(rename = "__type", default)]
	pub kind: String,
	#[serde(default, alias = "Message")]
	pub message: Option<String>,
}

impl ServiceErrorBody {
	/// Error type without the optional `namespace#` prefix.
	pub fn short_kind(&self) -> &str {
		self.kind.rsplit('#').next().unwrap_or(&self.kind)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn initiate_auth_serializes_pascal_case() {
		let req = InitiateAuthRequest::user_srp("client-1", "alice", "abcd");
		let json = serde_json::to_value(&req).unwrap();
		assert_eq!(
			json,
			json!({
				"AuthFlow": "USER_SRP_AUTH",
				"ClientId": "client-1",
				"AuthParameters": { "SRP_A": "abcd", "USERNAME": "alice" }
			})
		);
	}

	#[test]
	fn challenge_response_parses_parameters() {
		let resp: InitiateAuthResponse = serde_json::from_value(json!({
			"ChallengeName": "PASSWORD_VERIFIER",
			"ChallengeParameters": { "SALT": "ab", "SRP_B": "cd", "SECRET_BLOCK": "ZQ==", "USER_ID_FOR_SRP": "u" }
		}))
		.unwrap();
		assert_eq!(resp.challenge_name.as_deref(), Some(PASSWORD_VERIFIER));
		assert_eq!(resp.challenge_parameters["SRP_B"], "cd");
		assert!(resp.authentication_result.is_none());
	}

	#[test]
	fn service_error_strips_namespace() {
		let err: ServiceErrorBody = serde_json::from_value(json!({
			"__type": "com.amazonaws.cognito#NotAuthorizedException",
			"message": "Incorrect username or password."
		}))
		.unwrap();
		assert_eq!(err.short_kind(), "NotAuthorizedException");
	}

	#[test]
	fn authentication_result_debug_hides_tokens() {
		let result = AuthenticationResult {
			access_token: "secret-a".into(),
			refresh_token: Some("secret-r".into()),
			id_token: "secret-i".into(),
			expires_in: Some(3600),
			token_type: Some("Bearer".into()),
		};
		assert!(!format!("{result:?}").contains("secret"));
	}
}
