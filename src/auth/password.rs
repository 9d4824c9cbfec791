//! Password hashing via bcrypt.
//!
//! Hashing is deliberately expensive, so the async helpers move it onto tokio's blocking pool
//! where independent requests hash in parallel without holding any shared lock.

// self
use crate::{
	auth::Secret,
	error::{ConfigError, CryptoError},
};

/// bcrypt-backed password hasher with a fixed cost factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasswordHasher {
	cost: u32,
}
impl PasswordHasher {
	/// Lowest cost bcrypt accepts.
	pub const MIN_COST: u32 = 4;
	/// Highest cost bcrypt accepts.
	pub const MAX_COST: u32 = 31;

	/// Creates a hasher; `cost` must lie in `MIN_COST..=MAX_COST`.
	pub fn new(cost: u32) -> Result<Self, ConfigError> {
		if !(Self::MIN_COST..=Self::MAX_COST).contains(&cost) {
			return Err(ConfigError::HashCost { cost });
		}

		Ok(Self { cost })
	}

	/// Configured cost factor.
	pub fn cost(&self) -> u32 {
		self.cost
	}

	/// Hashes a password synchronously.
	pub fn hash_blocking(&self, password: &Secret) -> Result<String, CryptoError> {
		bcrypt::hash(password.expose(), self.cost).map_err(|source| CryptoError::Hash { source })
	}

	/// Verifies a password synchronously; malformed hashes count as a mismatch.
	pub fn verify_blocking(password: &Secret, hash: &str) -> bool {
		bcrypt::verify(password.expose(), hash).unwrap_or(false)
	}

	/// Hashes a password on the blocking pool.
	pub async fn hash(&self, password: &Secret) -> Result<String, CryptoError> {
		let hasher = *self;
		let password = password.clone();

		tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
			.await
			.map_err(CryptoError::join)?
	}

	/// Verifies a password on the blocking pool.
	pub async fn verify(&self, password: &Secret, hash: &str) -> Result<bool, CryptoError> {
		let password = password.clone();
		let hash = hash.to_owned();

		tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &hash))
			.await
			.map_err(CryptoError::join)
	}
}
