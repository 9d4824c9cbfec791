//! Signed, optionally expiring opaque payloads.
//!
//! A token has three URL-safe base64 segments joined by dots:
//!
//! ```text
//! <payload json>.<issued-at seconds, big-endian u64>.<HMAC-SHA256 over the first two segments>
//! ```
//!
//! Decoding reports *why* a token was rejected via [`SignatureError`]; callers that must not
//! leak that detail collapse it themselves.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, CryptoError},
};

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

/// Reasons a signed token was rejected, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
pub enum SignatureError {
	/// No token was supplied.
	#[error("No token specified.")]
	NoTokenSpecified,
	/// Signature mismatch or structurally malformed token.
	#[error("Bad signature.")]
	BadSignature,
	/// Signature is valid but the lifetime has elapsed.
	#[error("Signature expired.")]
	SignatureExpired,
}

/// HMAC-SHA256 codec for arbitrary serde payloads.
///
/// A zero lifetime means tokens never expire.
#[derive(Clone)]
pub struct SignedToken {
	mac: HmacSha256,
	lifetime: Duration,
}
impl SignedToken {
	/// Creates a codec keyed by `secret` with the provided lifetime.
	pub fn new(secret: impl AsRef<[u8]>, lifetime: Duration) -> Result<Self, ConfigError> {
		Self::with_salt(secret, "", lifetime)
	}

	/// Creates a codec whose signatures are bound to `salt`, so tokens minted for one purpose
	/// never verify for another under the same secret.
	pub fn with_salt(
		secret: impl AsRef<[u8]>,
		salt: &str,
		lifetime: Duration,
	) -> Result<Self, ConfigError> {
		let secret = secret.as_ref();

		if secret.is_empty() {
			return Err(ConfigError::EmptySecret { field: "signed token" });
		}

		let mut mac = HmacSha256::new_from_slice(secret)
			.map_err(|_| ConfigError::EmptySecret { field: "signed token" })?;

		mac.update(salt.as_bytes());
		mac.update(&[0]);

		Ok(Self { mac, lifetime: if lifetime.is_negative() { Duration::ZERO } else { lifetime } })
	}

	/// Configured lifetime; zero means tokens never expire.
	pub fn lifetime(&self) -> Duration {
		self.lifetime
	}

	/// Serializes and signs `payload`, stamping the current instant.
	pub fn encode<T>(&self, payload: &T) -> Result<String, CryptoError>
	where
		T: ?Sized + Serialize,
	{
		self.encode_at(payload, OffsetDateTime::now_utc())
	}

	/// Serializes and signs `payload` with an explicit issued-at instant.
	pub fn encode_at<T>(&self, payload: &T, issued_at: OffsetDateTime) -> Result<String, CryptoError>
	where
		T: ?Sized + Serialize,
	{
		let json = serde_json::to_vec(payload).map_err(CryptoError::serialize)?;
		let timestamp = u64::try_from(issued_at.unix_timestamp()).unwrap_or_default();
		let mut token = URL_SAFE_NO_PAD.encode(json);

		token.push(SEPARATOR);
		token.push_str(&URL_SAFE_NO_PAD.encode(timestamp.to_be_bytes()));

		let signature = self.sign(token.as_bytes());

		token.push(SEPARATOR);
		token.push_str(&URL_SAFE_NO_PAD.encode(signature));

		Ok(token)
	}

	/// Verifies and decodes a token against the current instant.
	pub fn decode<'a, T>(&self, token: impl Into<Option<&'a str>>) -> Result<T, SignatureError>
	where
		T: DeserializeOwned,
	{
		self.decode_at(token, OffsetDateTime::now_utc())
	}

	/// Verifies and decodes a token as a JSON object.
	pub fn decode_value<'a>(
		&self,
		token: impl Into<Option<&'a str>>,
	) -> Result<serde_json::Map<String, serde_json::Value>, SignatureError> {
		self.decode(token)
	}

	/// Verifies and decodes a token, treating `now` as the current instant.
	pub fn decode_at<'a, T>(
		&self,
		token: impl Into<Option<&'a str>>,
		now: OffsetDateTime,
	) -> Result<T, SignatureError>
	where
		T: DeserializeOwned,
	{
		let token = match token.into() {
			Some(token) if !token.is_empty() => token,
			_ => return Err(SignatureError::NoTokenSpecified),
		};
		let (signed, signature) =
			token.rsplit_once(SEPARATOR).ok_or(SignatureError::BadSignature)?;
		let signature =
			URL_SAFE_NO_PAD.decode(signature).map_err(|_| SignatureError::BadSignature)?;
		let mut mac = self.mac.clone();

		mac.update(signed.as_bytes());
		mac.verify_slice(&signature).map_err(|_| SignatureError::BadSignature)?;

		let (payload, timestamp) =
			signed.split_once(SEPARATOR).ok_or(SignatureError::BadSignature)?;
		let issued_at = decode_timestamp(timestamp)?;

		if !self.lifetime.is_zero() && now - issued_at > self.lifetime {
			return Err(SignatureError::SignatureExpired);
		}

		let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| SignatureError::BadSignature)?;

		serde_json::from_slice(&json).map_err(|_| SignatureError::BadSignature)
	}

	fn sign(&self, bytes: &[u8]) -> Vec<u8> {
		let mut mac = self.mac.clone();

		mac.update(bytes);

		mac.finalize().into_bytes().to_vec()
	}
}
impl Debug for SignedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedToken")
			.field("secret", &"<redacted>")
			.field("lifetime", &self.lifetime)
			.finish()
	}
}

fn decode_timestamp(segment: &str) -> Result<OffsetDateTime, SignatureError> {
	let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| SignatureError::BadSignature)?;
	let bytes = <[u8; 8]>::try_from(bytes.as_slice()).map_err(|_| SignatureError::BadSignature)?;
	let seconds = i64::try_from(u64::from_be_bytes(bytes)).map_err(|_| SignatureError::BadSignature)?;

	OffsetDateTime::from_unix_timestamp(seconds).map_err(|_| SignatureError::BadSignature)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const SECRET: &str = "MY_SECRET_KEY";

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Session {
		session_id: i64,
		ratio: f64,
		admin: bool,
		tags: Vec<String>,
		note: Option<String>,
		nested: BTreeMap<String, u32>,
	}

	fn session() -> Session {
		Session {
			session_id: 999,
			ratio: 0.25,
			admin: false,
			tags: vec!["a".into(), "b".into()],
			note: None,
			nested: BTreeMap::from([("x".into(), 1), ("y".into(), 2)]),
		}
	}

	#[test]
	fn typed_payloads_round_trip() {
		let codec = SignedToken::new(SECRET, Duration::seconds(1))
			.expect("Codec fixture should build.");
		let token = codec.encode(&session()).expect("Encoding should succeed.");
		let decoded: Session = codec.decode(token.as_str()).expect("Fresh token should decode.");

		assert_eq!(decoded, session());
		assert!(!token.contains(['+', '/', '=']), "Token must be URL safe.");
	}

	#[test]
	fn map_payloads_round_trip() {
		let codec = SignedToken::new(SECRET, Duration::ZERO).expect("Codec fixture should build.");
		let payload = serde_json::json!({ "session_id": 1, "name": "alice" });
		let token = codec.encode(&payload).expect("Encoding should succeed.");
		let map = codec.decode_value(token.as_str()).expect("Map payload should decode.");

		assert_eq!(map.get("session_id"), Some(&serde_json::json!(1)));
		assert_eq!(map.get("name"), Some(&serde_json::json!("alice")));
	}

	#[test]
	fn empty_or_absent_tokens_are_unspecified() {
		let codec = SignedToken::new(SECRET, Duration::seconds(1))
			.expect("Codec fixture should build.");

		assert_eq!(codec.decode_value(None::<&str>), Err(SignatureError::NoTokenSpecified));
		assert_eq!(codec.decode_value(""), Err(SignatureError::NoTokenSpecified));
	}

	#[test]
	fn malformed_and_tampered_tokens_are_bad_signatures() {
		let codec = SignedToken::new(SECRET, Duration::hours(1))
			.expect("Codec fixture should build.");
		let token = codec.encode(&session()).expect("Encoding should succeed.");
		let mut tampered = token.clone();
		let last = tampered.pop().expect("Token should not be empty.");

		tampered.push(if last == 'A' { 'B' } else { 'A' });

		assert_eq!(codec.decode_value("malformedtoken"), Err(SignatureError::BadSignature));
		assert_eq!(codec.decode_value("tampered_token"), Err(SignatureError::BadSignature));
		assert_eq!(codec.decode_value("a.b.c"), Err(SignatureError::BadSignature));
		assert_eq!(codec.decode_value(tampered.as_str()), Err(SignatureError::BadSignature));
	}

	#[test]
	fn wrong_secret_or_salt_is_a_bad_signature() {
		let codec = SignedToken::new(SECRET, Duration::hours(1))
			.expect("Codec fixture should build.");
		let other = SignedToken::new("OTHER_SECRET", Duration::hours(1))
			.expect("Second codec should build.");
		let salted = SignedToken::with_salt(SECRET, "email-confirmation", Duration::hours(1))
			.expect("Salted codec should build.");
		let token = codec.encode(&session()).expect("Encoding should succeed.");

		assert_eq!(other.decode_value(token.as_str()), Err(SignatureError::BadSignature));
		assert_eq!(salted.decode_value(token.as_str()), Err(SignatureError::BadSignature));
	}

	#[test]
	fn expiry_is_enforced_after_the_lifetime() {
		let codec = SignedToken::new(SECRET, Duration::seconds(1))
			.expect("Codec fixture should build.");
		let issued = macros::datetime!(2025-01-01 00:00:00 UTC);
		let token = codec.encode_at(&session(), issued).expect("Encoding should succeed.");

		assert!(codec.decode_at::<Session>(token.as_str(), issued).is_ok());
		assert!(
			codec.decode_at::<Session>(token.as_str(), issued + Duration::seconds(1)).is_ok()
		);
		assert_eq!(
			codec.decode_at::<Session>(token.as_str(), issued + Duration::seconds(2)),
			Err(SignatureError::SignatureExpired)
		);
	}

	#[test]
	fn zero_lifetime_never_expires() {
		let codec = SignedToken::new(SECRET, Duration::ZERO).expect("Codec fixture should build.");
		let issued = macros::datetime!(2000-01-01 00:00:00 UTC);
		let token = codec.encode_at(&session(), issued).expect("Encoding should succeed.");
		let decoded = codec
			.decode_at::<Session>(token.as_str(), issued + Duration::days(3650))
			.expect("Tokens without a lifetime must never expire.");

		assert_eq!(decoded.session_id, 999);
	}

	#[test]
	fn bad_signature_wins_over_expiry() {
		let codec = SignedToken::new(SECRET, Duration::seconds(1))
			.expect("Codec fixture should build.");
		let other = SignedToken::new("OTHER_SECRET", Duration::seconds(1))
			.expect("Second codec should build.");
		let issued = macros::datetime!(2025-01-01 00:00:00 UTC);
		let token = codec.encode_at(&session(), issued).expect("Encoding should succeed.");

		assert_eq!(
			other.decode_at::<Session>(token.as_str(), issued + Duration::hours(1)),
			Err(SignatureError::BadSignature)
		);
	}

	#[test]
	fn empty_secrets_are_rejected() {
		assert!(matches!(
			SignedToken::new("", Duration::ZERO),
			Err(ConfigError::EmptySecret { .. })
		));
	}
}
