//! Client side of the Cognito flavour of SRP-6a.
//!
//! Cognito uses the 3072-bit group from RFC 3526 with `g = 2` and SHA-256.
//! Big integers are hashed in their "padded" big-endian form: a leading zero
//! byte is added whenever the top bit is set, so the value never reads as
//! negative on the server side.
//!
//! The client never sends the password. It proves knowledge of it by signing
//! the server's secret block with a key derived from the shared premaster
//! secret `S = (B - k g^x)^(a + u x) mod N`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const N_HEX: &str = concat!(
	"FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74",
	"020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437",
	"4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
	"EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05",
	"98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB",
	"9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
	"E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718",
	"3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D04507A33",
	"A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
	"ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864",
	"D87602733EC86A64521F2B18177B200CBBE117577A615D6C770988C0BAD946E2",
	"08E24FA074E5AB3143DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF",
);

const DERIVED_KEY_INFO: &[u8] = b"Caldera Derived Key";
const PRIVATE_VALUE_BYTES: usize = 128;

/// Parameters of a `PASSWORD_VERIFIER` challenge.
#[derive(Clone)]
pub struct VerifierChallenge {
	/// Hex salt.
	pub salt: String,
	/// Hex server public value.
	pub srp_b: String,
	/// Base64 opaque block to sign and echo back.
	pub secret_block: String,
	/// Internal user id to hash and sign with; not the login alias.
	pub user_id_for_srp: String,
}

impl std::fmt::Debug for VerifierChallenge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VerifierChallenge")
			.field("user_id_for_srp", &self.user_id_for_srp)
			.finish_non_exhaustive()
	}
}

/// Signed answer to a [`VerifierChallenge`].
#[derive(Clone)]
pub struct PasswordClaim {
	pub signature: String,
	pub secret_block: String,
	pub timestamp: String,
	pub user_id_for_srp: String,
}

impl std::fmt::Debug for PasswordClaim {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PasswordClaim")
			.field("timestamp", &self.timestamp)
			.finish_non_exhaustive()
	}
}

/// One SRP session. A fresh private value is drawn per login.
pub struct SrpClient {
	n: BigUint,
	g: BigUint,
	k: BigUint,
	a: BigUint,
	big_a: BigUint,
}

impl SrpClient {
	pub fn new() -> Self {
		let mut rng = rand::thread_rng();
		loop {
			let mut bytes = [0u8; PRIVATE_VALUE_BYTES];
			rng.fill_bytes(&mut bytes);
			if let Some(client) = Self::with_private_value(BigUint::from_bytes_be(&bytes)) {
				return client;
			}
		}
	}

	/// Builds a client around a chosen private value.
	///
	/// Returns [`None`] when the value yields `A mod N == 0`.
	pub fn with_private_value(a: BigUint) -> Option<Self> {
		let n = modulus();
		let g = BigUint::from(2u32);
		let k = hash_to_int(&[&pad(&n), &pad(&g)]);
		let big_a = g.modpow(&a, &n);
		if (&big_a % &n).bits() == 0 {
			return None;
		}
		Some(Self { n, g, k, a, big_a })
	}

	/// Client public value `A` as lower-case hex, the form Cognito expects in `SRP_A`.
	pub fn public_hex(&self) -> String {
		self.big_a.to_str_radix(16)
	}

	/// Answers a password-verifier challenge.
	///
	/// `pool_name` is the user-pool id without its region prefix. Fails if the
	/// server value is degenerate (`B mod N == 0` or `u == 0`) or the challenge
	/// fields are not valid hex/base64.
	pub fn password_claim(
		&self,
		pool_name: &str,
		password: &str,
		challenge: &VerifierChallenge,
		timestamp: &str,
	) -> Result<PasswordClaim> {
		let big_b = parse_hex("SRP_B", &challenge.srp_b)?;
		let salt = parse_hex("SALT", &challenge.salt)?;
		let key = self.authentication_key(pool_name, &challenge.user_id_for_srp, password, &big_b, &salt)?;

		let secret_block = STANDARD
			.decode(challenge.secret_block.as_bytes())
			.map_err(|e| Error::Authentication(format!("SECRET_BLOCK is not valid base64: {e}")))?;

		let mut mac = HmacSha256::new_from_slice(&key)
			.map_err(|e| Error::Authentication(format!("derived key rejected: {e}")))?;
		mac.update(pool_name.as_bytes());
		mac.update(challenge.user_id_for_srp.as_bytes());
		mac.update(&secret_block);
		mac.update(timestamp.as_bytes());
		let signature = STANDARD.encode(mac.finalize().into_bytes());

		Ok(PasswordClaim {
			signature,
			secret_block: challenge.secret_block.clone(),
			timestamp: timestamp.to_string(),
			user_id_for_srp: challenge.user_id_for_srp.clone(),
		})
	}

	fn authentication_key(
		&self,
		pool_name: &str,
		user_id: &str,
		password: &str,
		big_b: &BigUint,
		salt: &BigUint,
	) -> Result<[u8; 16]> {
		if (big_b % &self.n).bits() == 0 {
			return Err(Error::Authentication("server sent SRP_B = 0 mod N".into()));
		}
		let u = hash_to_int(&[&pad(&self.big_a), &pad(big_b)]);
		if u.bits() == 0 {
			return Err(Error::Authentication("scrambling parameter u is zero".into()));
		}
		let x = private_key(pool_name, user_id, password, salt);
		let s = self.premaster_secret(&u, &x, big_b);
		derive_key(&s, &u)
	}

	fn premaster_secret(&self, u: &BigUint, x: &BigUint, big_b: &BigUint) -> BigUint {
		let kgx = (&self.k * self.g.modpow(x, &self.n)) % &self.n;
		let base = ((big_b % &self.n) + &self.n - kgx) % &self.n;
		let exponent = &self.a + u * x;
		base.modpow(&exponent, &self.n)
	}
}

impl Default for SrpClient {
	fn default() -> Self {
		Self::new()
	}
}

/// Timestamp format signed into the claim, e.g. `Tue Nov 7 09:05:03 UTC 2023`.
pub fn timestamp(now: DateTime<Utc>) -> String {
	now.format("%a %b %-d %H:%M:%S UTC %Y").to_string()
}

fn modulus() -> BigUint {
	BigUint::parse_bytes(N_HEX.as_bytes(), 16).unwrap_or_default()
}

fn parse_hex(field: &str, value: &str) -> Result<BigUint> {
	BigUint::parse_bytes(value.trim().as_bytes(), 16)
		.ok_or_else(|| Error::Authentication(format!("{field} is not valid hex")))
}

/// Big-endian bytes with a leading zero when the top bit is set.
fn pad(value: &BigUint) -> Vec<u8> {
	let bytes = value.to_bytes_be();
	if bytes.first().is_some_and(|b| b & 0x80 != 0) {
		let mut padded = Vec::with_capacity(bytes.len() + 1);
		padded.push(0);
		padded.extend_from_slice(&bytes);
		padded
	} else {
		bytes
	}
}

fn hash_to_int(parts: &[&[u8]]) -> BigUint {
	let mut hasher = Sha256::new();
	for part in parts {
		hasher.update(part);
	}
	BigUint::from_bytes_be(&hasher.finalize())
}

/// `x = H(pad(salt) | H(poolName | userId | ":" | password))`
fn private_key(pool_name: &str, user_id: &str, password: &str, salt: &BigUint) -> BigUint {
	let mut inner = Sha256::new();
	inner.update(pool_name.as_bytes());
	inner.update(user_id.as_bytes());
	inner.update(b":");
	inner.update(password.as_bytes());
	let identity_hash = inner.finalize();
	hash_to_int(&[&pad(salt), &identity_hash])
}

fn derive_key(premaster: &BigUint, u: &BigUint) -> Result<[u8; 16]> {
	let salt = pad(u);
	let hk = Hkdf::<Sha256>::new(Some(salt.as_slice()), &pad(premaster));
	let mut okm = [0u8; 16];
	hk.expand(DERIVED_KEY_INFO, &mut okm)
		.map_err(|e| Error::Authentication(format!("key derivation failed: {e}")))?;
	Ok(okm)
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	const POOL: &str = "iu3YTdfT3";
	const USER: &str = "4f0c1e2a-user";
	const PASSWORD: &str = "correct horse battery staple";

	/// Server half of SRP-6a, enough to check that both sides agree.
	struct Verifier {
		n: BigUint,
		k: BigUint,
		v: BigUint,
		b: BigUint,
		big_b: BigUint,
	}

	impl Verifier {
		fn new(salt: &BigUint, b: BigUint) -> Self {
			let n = modulus();
			let g = BigUint::from(2u32);
			let k = hash_to_int(&[&pad(&n), &pad(&g)]);
			let x = private_key(POOL, USER, PASSWORD, salt);
			let v = g.modpow(&x, &n);
			let big_b = ((&k * &v) + g.modpow(&b, &n)) % &n;
			Self { n, k, v, b, big_b }
		}

		fn premaster(&self, big_a: &BigUint) -> BigUint {
			let u = hash_to_int(&[&pad(big_a), &pad(&self.big_b)]);
			((big_a * self.v.modpow(&u, &self.n)) % &self.n).modpow(&self.b, &self.n)
		}
	}

	fn client() -> SrpClient {
		SrpClient::with_private_value(BigUint::parse_bytes(b"1f2e3d4c5b6a79880123456789abcdef", 16).unwrap()).unwrap()
	}

	#[test]
	fn client_and_server_agree_on_premaster_secret() {
		let salt = BigUint::parse_bytes(b"a1b2c3d4e5f60718", 16).unwrap();
		let server = Verifier::new(&salt, BigUint::parse_bytes(b"deadbeefcafebabe0011223344556677", 16).unwrap());
		let client = client();

		let u = hash_to_int(&[&pad(&client.big_a), &pad(&server.big_b)]);
		let x = private_key(POOL, USER, PASSWORD, &salt);

		assert_eq!(client.k, server.k);
		assert_eq!(client.premaster_secret(&u, &x, &server.big_b), server.premaster(&client.big_a));
	}

	#[test]
	fn signature_verifies_with_server_derived_key() {
		let salt = BigUint::parse_bytes(b"0badc0ffee", 16).unwrap();
		let server = Verifier::new(&salt, BigUint::parse_bytes(b"99aa88bb77cc66dd", 16).unwrap());
		let client = client();
		let secret_block = STANDARD.encode(b"opaque-server-block");
		let challenge = VerifierChallenge {
			salt: salt.to_str_radix(16),
			srp_b: server.big_b.to_str_radix(16),
			secret_block: secret_block.clone(),
			user_id_for_srp: USER.to_string(),
		};
		let ts = "Tue Nov 7 09:05:03 UTC 2023";

		let claim = client.password_claim(POOL, PASSWORD, &challenge, ts).unwrap();

		let u = hash_to_int(&[&pad(&client.big_a), &pad(&server.big_b)]);
		let key = derive_key(&server.premaster(&client.big_a), &u).unwrap();
		let mut mac = HmacSha256::new_from_slice(&key).unwrap();
		mac.update(POOL.as_bytes());
		mac.update(USER.as_bytes());
		mac.update(b"opaque-server-block");
		mac.update(ts.as_bytes());
		assert_eq!(claim.signature, STANDARD.encode(mac.finalize().into_bytes()));
		assert_eq!(claim.secret_block, secret_block);
		assert_eq!(claim.user_id_for_srp, USER);
	}

	#[test]
	fn wrong_password_gives_different_signature() {
		let salt = BigUint::parse_bytes(b"0badc0ffee", 16).unwrap();
		let server = Verifier::new(&salt, BigUint::parse_bytes(b"1234", 16).unwrap());
		let challenge = VerifierChallenge {
			salt: salt.to_str_radix(16),
			srp_b: server.big_b.to_str_radix(16),
			secret_block: STANDARD.encode(b"block"),
			user_id_for_srp: USER.to_string(),
		};
		let client = client();
		let ts = "Wed Nov 8 10:00:00 UTC 2023";

		let good = client.password_claim(POOL, PASSWORD, &challenge, ts).unwrap();
		let bad = client.password_claim(POOL, "hunter2", &challenge, ts).unwrap();
		assert_ne!(good.signature, bad.signature);
	}

	#[test]
	fn degenerate_server_value_is_rejected() {
		let challenge = VerifierChallenge {
			salt: "ab".into(),
			srp_b: N_HEX.to_string(),
			secret_block: STANDARD.encode(b"block"),
			user_id_for_srp: USER.into(),
		};
		let err = client().password_claim(POOL, PASSWORD, &challenge, "ts").unwrap_err();
		assert!(err.is_authentication());
	}

	#[test]
	fn malformed_challenge_fields_are_authentication_errors() {
		let challenge = VerifierChallenge {
			salt: "not-hex".into(),
			srp_b: "1234".into(),
			secret_block: "!!".into(),
			user_id_for_srp: USER.into(),
		};
		assert!(client().password_claim(POOL, PASSWORD, &challenge, "ts").unwrap_err().is_authentication());
	}

	#[test]
	fn pad_adds_zero_only_for_high_bit() {
		assert_eq!(pad(&BigUint::from(0x7fu32)), vec![0x7f]);
		assert_eq!(pad(&BigUint::from(0x80u32)), vec![0x00, 0x80]);
		assert_eq!(pad(&BigUint::from(0x0abcu32)), vec![0x0a, 0xbc]);
	}

	#[test]
	fn group_parameters_are_well_formed() {
		assert_eq!(modulus().bits(), 3072);
		assert_eq!(client().public_hex(), client().big_a.to_str_radix(16));
		assert!(SrpClient::with_private_value(BigUint::from(0u32)).is_some());
	}

	#[test]
	fn timestamp_drops_day_padding() {
		let ts = Utc.with_ymd_and_hms(2023, 11, 7, 9, 5, 3).unwrap();
		assert_eq!(timestamp(ts), "Tue Nov 7 09:05:03 UTC 2023");
		let ts = Utc.with_ymd_and_hms(2023, 11, 27, 23, 0, 0).unwrap();
		assert_eq!(timestamp(ts), "Mon Nov 27 23:00:00 UTC 2023");
	}
}
