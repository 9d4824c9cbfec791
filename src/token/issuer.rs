//! JWT issuance and verification for access and refresh tokens.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	config::TokenConfig,
	error::{ConfigError, CryptoError},
	token::{ClaimsSubject, TokenClaims, TokenKind, TokenPair},
};

/// Supported JWS algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
	/// HMAC using SHA-256.
	#[serde(rename = "HS256")]
	Hs256,
	/// HMAC using SHA-384.
	#[serde(rename = "HS384")]
	Hs384,
	/// HMAC using SHA-512.
	#[serde(rename = "HS512")]
	Hs512,
	/// RSASSA-PKCS1-v1_5 using SHA-256.
	#[serde(rename = "RS256")]
	Rs256,
	/// RSASSA-PKCS1-v1_5 using SHA-384.
	#[serde(rename = "RS384")]
	Rs384,
	/// RSASSA-PKCS1-v1_5 using SHA-512.
	#[serde(rename = "RS512")]
	Rs512,
	/// RSASSA-PSS using SHA-256.
	#[serde(rename = "PS256")]
	Ps256,
	/// RSASSA-PSS using SHA-384.
	#[serde(rename = "PS384")]
	Ps384,
	/// RSASSA-PSS using SHA-512.
	#[serde(rename = "PS512")]
	Ps512,
	/// ECDSA using P-256 and SHA-256.
	#[serde(rename = "ES256")]
	Es256,
	/// ECDSA using P-384 and SHA-384.
	#[serde(rename = "ES384")]
	Es384,
}
impl SigningAlgorithm {
	/// Returns the JOSE label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Hs256 => "HS256",
			Self::Hs384 => "HS384",
			Self::Hs512 => "HS512",
			Self::Rs256 => "RS256",
			Self::Rs384 => "RS384",
			Self::Rs512 => "RS512",
			Self::Ps256 => "PS256",
			Self::Ps384 => "PS384",
			Self::Ps512 => "PS512",
			Self::Es256 => "ES256",
			Self::Es384 => "ES384",
		}
	}

	fn family(self) -> KeyFamily {
		match self {
			Self::Hs256 | Self::Hs384 | Self::Hs512 => KeyFamily::Hmac,
			Self::Rs256 | Self::Rs384 | Self::Rs512 | Self::Ps256 | Self::Ps384 | Self::Ps512 =>
				KeyFamily::Rsa,
			Self::Es256 | Self::Es384 => KeyFamily::Ec,
		}
	}
}
impl From<SigningAlgorithm> for Algorithm {
	fn from(value: SigningAlgorithm) -> Self {
		match value {
			SigningAlgorithm::Hs256 => Algorithm::HS256,
			SigningAlgorithm::Hs384 => Algorithm::HS384,
			SigningAlgorithm::Hs512 => Algorithm::HS512,
			SigningAlgorithm::Rs256 => Algorithm::RS256,
			SigningAlgorithm::Rs384 => Algorithm::RS384,
			SigningAlgorithm::Rs512 => Algorithm::RS512,
			SigningAlgorithm::Ps256 => Algorithm::PS256,
			SigningAlgorithm::Ps384 => Algorithm::PS384,
			SigningAlgorithm::Ps512 => Algorithm::PS512,
			SigningAlgorithm::Es256 => Algorithm::ES256,
			SigningAlgorithm::Es384 => Algorithm::ES384,
		}
	}
}
impl Display for SigningAlgorithm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
	Hmac,
	Rsa,
	Ec,
}

/// Key material handed to [`TokenIssuer::new`].
#[derive(Clone, Debug)]
pub enum SigningKey {
	/// Shared secret for the HS* family.
	Secret(Secret),
	/// PEM-encoded RSA key pair for the RS*/PS* families.
	RsaPem {
		/// Private key, PKCS#1 or PKCS#8.
		private: Secret,
		/// Public key.
		public: String,
	},
	/// PEM-encoded EC key pair for the ES* family.
	EcPem {
		/// Private key, PKCS#8.
		private: Secret,
		/// Public key.
		public: String,
	},
}
impl SigningKey {
	/// Convenience constructor for shared secrets.
	pub fn secret(value: impl Into<Secret>) -> Self {
		Self::Secret(value.into())
	}

	fn family(&self) -> KeyFamily {
		match self {
			Self::Secret(_) => KeyFamily::Hmac,
			Self::RsaPem { .. } => KeyFamily::Rsa,
			Self::EcPem { .. } => KeyFamily::Ec,
		}
	}

	fn into_keys(self) -> Result<(EncodingKey, DecodingKey), ConfigError> {
		let keys = match self {
			Self::Secret(secret) => {
				if secret.is_empty() {
					return Err(ConfigError::EmptySecret { field: "token signing" });
				}

				let bytes = secret.expose().as_bytes();

				(EncodingKey::from_secret(bytes), DecodingKey::from_secret(bytes))
			},
			Self::RsaPem { private, public } => (
				EncodingKey::from_rsa_pem(private.expose().as_bytes()).map_err(key_error)?,
				DecodingKey::from_rsa_pem(public.as_bytes()).map_err(key_error)?,
			),
			Self::EcPem { private, public } => (
				EncodingKey::from_ec_pem(private.expose().as_bytes()).map_err(key_error)?,
				DecodingKey::from_ec_pem(public.as_bytes()).map_err(key_error)?,
			),
		};

		Ok(keys)
	}
}

/// Mints and verifies access/refresh JWTs.
///
/// Verification fails closed: every rejection (bad signature, wrong algorithm, expiry, missing
/// claims, malformed input) surfaces as `None` so callers cannot branch on the reason.
#[derive(Clone)]
pub struct TokenIssuer {
	algorithm: SigningAlgorithm,
	encoding: EncodingKey,
	decoding: DecodingKey,
	access_lifetime: Duration,
	refresh_lifetime: Duration,
	leeway: Duration,
}
impl TokenIssuer {
	/// Builds an issuer; the key family must match the configured algorithm.
	pub fn new(config: &TokenConfig, key: SigningKey) -> Result<Self, ConfigError> {
		let algorithm = config.algorithm;

		if key.family() != algorithm.family() {
			return Err(ConfigError::KeyAlgorithmMismatch { algorithm: algorithm.as_str() });
		}

		let (encoding, decoding) = key.into_keys()?;

		Ok(Self {
			algorithm,
			encoding,
			decoding,
			access_lifetime: config.access_lifetime(),
			refresh_lifetime: config.refresh_lifetime(),
			leeway: Duration::seconds(i64::try_from(config.leeway_secs).unwrap_or(i64::MAX)),
		})
	}

	/// Configured algorithm.
	pub fn algorithm(&self) -> SigningAlgorithm {
		self.algorithm
	}

	/// Lifetime of tokens of `kind`.
	pub fn lifetime(&self, kind: TokenKind) -> Duration {
		match kind {
			TokenKind::Access => self.access_lifetime,
			TokenKind::Refresh => self.refresh_lifetime,
		}
	}

	/// Mints an access token for `subject`.
	pub fn create_access_token(&self, subject: &ClaimsSubject) -> Result<Secret, CryptoError> {
		self.create_token_at(subject, TokenKind::Access, OffsetDateTime::now_utc())
	}

	/// Mints a refresh token for `subject`.
	pub fn create_refresh_token(&self, subject: &ClaimsSubject) -> Result<Secret, CryptoError> {
		self.create_token_at(subject, TokenKind::Refresh, OffsetDateTime::now_utc())
	}

	/// Mints an access + refresh pair sharing one issue instant.
	pub fn create_tokens(&self, subject: &ClaimsSubject) -> Result<TokenPair, CryptoError> {
		let now = OffsetDateTime::now_utc();

		Ok(TokenPair {
			access: self.create_token_at(subject, TokenKind::Access, now)?,
			refresh: self.create_token_at(subject, TokenKind::Refresh, now)?,
		})
	}

	/// Mints a token with an explicit issue instant.
	pub fn create_token_at(
		&self,
		subject: &ClaimsSubject,
		kind: TokenKind,
		issued_at: OffsetDateTime,
	) -> Result<Secret, CryptoError> {
		let claims = TokenClaims::new(subject, kind, issued_at, self.lifetime(kind));
		let token =
			jsonwebtoken::encode(&Header::new(self.algorithm.into()), &claims, &self.encoding)
				.map_err(|source| CryptoError::Sign { source })?;

		Ok(Secret::new(token))
	}

	/// Verifies `token` with the configured leeway.
	pub fn decode_token(&self, token: &str) -> Option<TokenClaims> {
		self.decode_token_with_leeway(token, self.leeway)
	}

	/// Verifies `token` with an explicit clock-skew tolerance.
	pub fn decode_token_with_leeway(&self, token: &str, leeway: Duration) -> Option<TokenClaims> {
		let mut validation = Validation::new(self.algorithm.into());

		validation.leeway = u64::try_from(leeway.whole_seconds()).unwrap_or(0);
		validation.validate_exp = true;
		validation.set_required_spec_claims(&["exp", "sub"]);

		match jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation) {
			Ok(data) => Some(data.claims),
			Err(_e) => {
				#[cfg(feature = "tracing")]
				tracing::debug!(error = %_e, "Token verification failed.");

				None
			},
		}
	}
}
impl Debug for TokenIssuer {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("TokenIssuer")
			.field("algorithm", &self.algorithm)
			.field("access_lifetime", &self.access_lifetime)
			.field("refresh_lifetime", &self.refresh_lifetime)
			.field("leeway", &self.leeway)
			.finish_non_exhaustive()
	}
}

fn key_error(source: jsonwebtoken::errors::Error) -> ConfigError {
	ConfigError::SigningKey { source }
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use super::*;
	use crate::auth::{PermissionSet, UserId};

	fn subject(name: &str) -> ClaimsSubject {
		ClaimsSubject {
			id: UserId::new(format!("{name}-id")).expect("User fixture should be valid."),
			username: name.into(),
			permissions: PermissionSet::new(["users:read"]).expect("Permissions should be valid."),
		}
	}

	fn issuer(algorithm: SigningAlgorithm) -> TokenIssuer {
		let config = TokenConfig { algorithm, ..TokenConfig::default() };

		TokenIssuer::new(&config, SigningKey::secret("test-signing-secret"))
			.expect("Issuer fixture should build.")
	}

	#[test]
	fn pair_round_trips_with_kinds() {
		let issuer = issuer(SigningAlgorithm::Hs256);
		let pair = issuer.create_tokens(&subject("alice")).expect("Signing should succeed.");
		let access = issuer.decode_token(pair.access.expose()).expect("Access token should verify.");
		let refresh =
			issuer.decode_token(pair.refresh.expose()).expect("Refresh token should verify.");

		assert_eq!(access.kind, TokenKind::Access);
		assert_eq!(refresh.kind, TokenKind::Refresh);
		assert_eq!(access.username, "alice");
		assert_eq!(access.exp - access.iat, 15 * 60);
		assert_eq!(refresh.exp - refresh.iat, 24 * 60 * 60);
		assert!(access.permissions.contains("users:read"));
	}

	#[test]
	fn expired_tokens_fail_closed_unless_leeway_covers_them() {
		let issuer = issuer(SigningAlgorithm::Hs256);
		let issued = OffsetDateTime::now_utc() - Duration::minutes(16);
		let token = issuer
			.create_token_at(&subject("alice"), TokenKind::Access, issued)
			.expect("Signing should succeed.");

		assert!(issuer.decode_token(token.expose()).is_none());
		assert!(issuer.decode_token_with_leeway(token.expose(), Duration::minutes(5)).is_some());
	}

	#[test]
	fn foreign_algorithms_and_tampering_are_rejected() {
		let hs256 = issuer(SigningAlgorithm::Hs256);
		let hs512 = issuer(SigningAlgorithm::Hs512);
		let alice = hs256.create_access_token(&subject("alice")).expect("Signing should succeed.");
		let bob = hs256.create_access_token(&subject("bob")).expect("Signing should succeed.");

		assert!(hs512.decode_token(alice.expose()).is_none());

		let alice_parts = alice.expose().split('.').collect::<Vec<_>>();
		let bob_parts = bob.expose().split('.').collect::<Vec<_>>();
		let spliced = format!("{}.{}.{}", alice_parts[0], bob_parts[1], alice_parts[2]);

		assert!(hs256.decode_token(&spliced).is_none());

		let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
		let unsigned = format!("{none_header}.{}.", alice_parts[1]);

		assert!(hs256.decode_token(&unsigned).is_none());
		assert!(hs256.decode_token("not-a-jwt").is_none());
	}

	#[test]
	fn keys_must_match_the_algorithm_family() {
		let config = TokenConfig { algorithm: SigningAlgorithm::Rs256, ..TokenConfig::default() };
		let err = TokenIssuer::new(&config, SigningKey::secret("secret"))
			.expect_err("HMAC keys must not back RSA algorithms.");

		assert!(matches!(err, ConfigError::KeyAlgorithmMismatch { algorithm: "RS256" }));

		let err = TokenIssuer::new(&TokenConfig::default(), SigningKey::secret(""))
			.expect_err("Empty secrets must be rejected.");

		assert!(matches!(err, ConfigError::EmptySecret { .. }));

		let config = TokenConfig { algorithm: SigningAlgorithm::Es256, ..TokenConfig::default() };
		let err = TokenIssuer::new(
			&config,
			SigningKey::EcPem { private: Secret::new("garbage"), public: "garbage".into() },
		)
		.expect_err("Malformed PEM must be rejected.");

		assert!(matches!(err, ConfigError::SigningKey { .. }));
	}
}
