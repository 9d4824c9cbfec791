//! Random one-shot tokens for password reset and email confirmation.
//!
//! Only the digest is ever persisted; the raw value leaves the process once, inside an email.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::Secret};

/// SHA-256 digest of a raw recovery token, URL-safe base64 encoded.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenHash(String);
impl TokenHash {
	/// Digest as stored.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenHash {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenHash({})", self.0)
	}
}
impl Display for TokenHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Freshly generated token: the raw value for delivery plus its digest for storage.
#[derive(Clone, Debug)]
pub struct RecoveryToken {
	/// Raw value sent to the user.
	pub raw: Secret,
	/// Digest persisted by stores.
	pub hash: TokenHash,
}
impl RecoveryToken {
	/// Generates an alphanumeric token of `len` characters.
	pub fn generate(len: usize) -> Self {
		let raw = rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect::<String>();
		let hash = hash_token(&raw);

		Self { raw: Secret::new(raw), hash }
	}
}

/// Hashes a raw token the same way [`RecoveryToken::generate`] does.
pub fn hash_token(raw: &str) -> TokenHash {
	let mut hasher = Sha256::new();

	hasher.update(raw.as_bytes());

	TokenHash(URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generated_tokens_are_alphanumeric_and_hashed() {
		let token = RecoveryToken::generate(64);

		assert_eq!(token.raw.expose().len(), 64);
		assert!(token.raw.expose().chars().all(|c| c.is_ascii_alphanumeric()));
		assert_eq!(token.hash, hash_token(token.raw.expose()));
		assert_ne!(token.hash.as_str(), token.raw.expose());
	}

	#[test]
	fn tokens_do_not_repeat() {
		let a = RecoveryToken::generate(32);
		let b = RecoveryToken::generate(32);

		assert_ne!(a.raw, b.raw);
		assert_ne!(a.hash, b.hash);
	}
}
