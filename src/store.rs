//! Storage contracts the core calls into, plus in-memory implementations for tests and demos.
//!
//! "Not found" is always an empty or `false` result. [`StoreError`] is reserved for backend
//! failures and uniqueness violations detected at write time.

pub mod memory;

pub use memory::{MemoryCache, MemoryUserRepository};

// self
use crate::{
	_prelude::*,
	auth::{AccountPatch, NewAccount, SocialIdentity, UserAccount, UserId},
	token::TokenHash,
};

/// Boxed future returned by every storage contract.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable account storage.
pub trait UserRepository
where
	Self: Send + Sync,
{
	/// Fetches an account by identifier.
	fn get<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserAccount>>;

	/// Fetches an account by email address.
	fn get_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<UserAccount>>;

	/// Fetches an account by exact username.
	fn get_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<UserAccount>>;

	/// Fetches an account whose email or username equals `login`.
	fn get_by_login<'a>(&'a self, login: &'a str) -> StoreFuture<'a, Option<UserAccount>>;

	/// Fetches the account linked to a social identity.
	fn get_by_social<'a>(
		&'a self,
		identity: &'a SocialIdentity,
	) -> StoreFuture<'a, Option<UserAccount>>;

	/// Persists a new account and returns its identifier.
	///
	/// Implementations report email/username collisions as [`StoreError::Duplicate`].
	fn create(&self, account: NewAccount) -> StoreFuture<'_, UserId>;

	/// Applies a partial update; returns `false` if the account does not exist.
	fn update<'a>(&'a self, id: &'a UserId, patch: AccountPatch) -> StoreFuture<'a, bool>;

	/// Deletes an account; returns `false` if it did not exist.
	fn delete<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, bool>;

	/// Records a pending confirmation for `email`, replacing any earlier one.
	fn request_email_confirmation<'a>(
		&'a self,
		email: &'a str,
		token_hash: TokenHash,
	) -> StoreFuture<'a, ()>;

	/// Marks the matching account confirmed and deletes the pending record in one transaction.
	///
	/// Returns `false` when no pending confirmation matches the hash.
	fn confirm_email<'a>(&'a self, token_hash: &'a TokenHash) -> StoreFuture<'a, bool>;
}

/// Key-value cache with TTLs and atomic counters.
pub trait KeyValueCache
where
	Self: Send + Sync,
{
	/// Reads a live value.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes a value, optionally expiring after `ttl`.
	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Option<Duration>)
	-> StoreFuture<'a, ()>;

	/// Writes a value only if the key is absent; returns whether the write happened.
	fn setnx<'a>(
		&'a self,
		key: &'a str,
		value: String,
		ttl: Option<Duration>,
	) -> StoreFuture<'a, bool>;

	/// Atomically increments an integer value, keeping its TTL.
	///
	/// Returns `None` if the key is absent or expired.
	fn incr<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<i64>>;

	/// Removes a key; returns whether it existed.
	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;
}

/// Error type produced by [`UserRepository`] and [`KeyValueCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures (e.g., serde/bincode) surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A unique column already holds the value.
	#[error("Duplicate value for {field}.")]
	Duplicate {
		/// Column name (`email` or `username`).
		field: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_can_be_serialized() {
		let payload = serde_json::to_string(&StoreError::Duplicate { field: "email".into() })
			.expect("StoreError should serialize to JSON.");

		assert_eq!(payload, r#"{"Duplicate":{"field":"email"}}"#);
	}
}
