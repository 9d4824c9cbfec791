//! Fixed-window attempt counters backed by a [`KeyValueCache`].
//!
//! A window opens with the first attempt (`setnx` with TTL = window) and closes when the cache
//! expires the key. Counters are never decremented or cleared by successful actions. Once the
//! budget is spent further attempts are denied without touching the counter, so a client that
//! keeps hammering does not extend its own window.

mod metrics;

pub use metrics::ThrottleMetrics;

// self
use crate::{
	_prelude::*,
	config::ThrottlePolicy,
	obs,
	store::{KeyValueCache, StoreError},
};

/// Throttled actions; each owns a disjoint key space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThrottleAction {
	/// Brute-force guard keyed by client address + login identifier.
	LoginAttempt,
	/// Forgot-password guard keyed by account.
	PasswordReset,
	/// Confirmation re-send guard keyed by account.
	EmailConfirmation,
}
impl ThrottleAction {
	/// Returns a stable label suitable for keys, spans, and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::LoginAttempt => "login_attempt",
			Self::PasswordReset => "password_reset",
			Self::EmailConfirmation => "email_confirmation",
		}
	}
}
impl Display for ThrottleAction {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Self::LoginAttempt => "login attempt",
			Self::PasswordReset => "password reset",
			Self::EmailConfirmation => "email confirmation",
		})
	}
}

/// Cache key for one (action, identity) counter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
	action: ThrottleAction,
	key: String,
}
impl ThrottleKey {
	/// Builds a key for an arbitrary identity.
	pub fn new(action: ThrottleAction, identity: impl Display) -> Self {
		Self { action, key: format!("throttle:{}:{identity}", action.as_str()) }
	}

	/// Login guard for a client address + login identifier pair.
	pub fn login(client_addr: &str, login: &str) -> Self {
		Self::new(ThrottleAction::LoginAttempt, format_args!("{client_addr}:{login}"))
	}

	/// Password reset guard for an account.
	pub fn password_reset(id: impl Display) -> Self {
		Self::new(ThrottleAction::PasswordReset, id)
	}

	/// Email confirmation guard for an account.
	pub fn email_confirmation(id: impl Display) -> Self {
		Self::new(ThrottleAction::EmailConfirmation, id)
	}

	/// Action this key belongs to.
	pub fn action(&self) -> ThrottleAction {
		self.action
	}

	/// Cache key string.
	pub fn as_str(&self) -> &str {
		&self.key
	}
}
impl Display for ThrottleKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.key)
	}
}

/// Attempt limiter shared by every flow.
#[derive(Clone)]
pub struct RateLimiter {
	cache: Arc<dyn KeyValueCache>,
	metrics: Arc<ThrottleMetrics>,
}
impl RateLimiter {
	/// Creates a limiter over the provided cache.
	pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
		Self { cache, metrics: Arc::new(ThrottleMetrics::default()) }
	}

	/// In-process decision counters.
	pub fn metrics(&self) -> &ThrottleMetrics {
		&self.metrics
	}

	/// Consumes one attempt from `key`'s budget; returns whether the attempt is allowed.
	pub async fn check_and_increment(
		&self,
		key: &ThrottleKey,
		max_attempts: u32,
		window: Duration,
	) -> Result<bool> {
		let allowed = self.consume(key, i64::from(max_attempts), window).await?;

		self.metrics.record(allowed);
		obs::record_throttle_decision(key.action(), allowed);

		Ok(allowed)
	}

	/// [`check_and_increment`](Self::check_and_increment) with a configured policy.
	pub async fn check(&self, key: &ThrottleKey, policy: &ThrottlePolicy) -> Result<bool> {
		self.check_and_increment(key, policy.max_attempts, policy.window()).await
	}

	/// Reports whether the next attempt would be allowed, without consuming budget.
	pub async fn peek(&self, key: &ThrottleKey, max_attempts: u32) -> Result<bool> {
		match self.cache.get(key.as_str()).await? {
			None => Ok(true),
			Some(raw) => Ok(parse_count(key, &raw)? < i64::from(max_attempts)),
		}
	}

	async fn consume(&self, key: &ThrottleKey, max: i64, window: Duration) -> Result<bool> {
		let cache_key = key.as_str();

		// The window may close between any two calls; one retry covers a key expiring mid-check.
		for _ in 0..2 {
			if self.cache.setnx(cache_key, "1".into(), Some(window)).await? {
				return Ok(max >= 1);
			}

			let Some(raw) = self.cache.get(cache_key).await? else {
				continue;
			};

			if parse_count(key, &raw)? >= max {
				return Ok(false);
			}

			match self.cache.incr(cache_key).await? {
				Some(count) => return Ok(count <= max),
				None => continue,
			}
		}

		Ok(false)
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter").field("metrics", &self.metrics).finish_non_exhaustive()
	}
}

fn parse_count(key: &ThrottleKey, raw: &str) -> Result<i64> {
	raw.parse::<i64>().map_err(|e| {
		Error::from(StoreError::Serialization {
			message: format!("throttle counter `{key}` is not an integer: {e}"),
		})
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryCache;

	fn limiter() -> RateLimiter {
		RateLimiter::new(Arc::new(MemoryCache::default()))
	}

	async fn attempt(limiter: &RateLimiter, key: &ThrottleKey, max: u32) -> bool {
		limiter
			.check_and_increment(key, max, Duration::minutes(5))
			.await
			.expect("Throttle check should reach the cache.")
	}

	#[test]
	fn key_spaces_are_disjoint() {
		let login = ThrottleKey::login("10.0.0.1", "alice");
		let reset = ThrottleKey::password_reset("alice");
		let confirm = ThrottleKey::email_confirmation("alice");

		assert_eq!(login.as_str(), "throttle:login_attempt:10.0.0.1:alice");
		assert_ne!(reset.as_str(), confirm.as_str());
		assert_eq!(reset.action(), ThrottleAction::PasswordReset);
		assert_eq!(ThrottleAction::LoginAttempt.to_string(), "login attempt");
	}

	#[tokio::test]
	async fn budget_is_enforced_without_extending_the_counter() {
		let limiter = limiter();
		let key = ThrottleKey::login("10.0.0.1", "alice");

		for _ in 0..3 {
			assert!(attempt(&limiter, &key, 3).await);
		}

		assert!(!attempt(&limiter, &key, 3).await);
		assert!(!attempt(&limiter, &key, 3).await);

		let stored = limiter.cache.get(key.as_str()).await.expect("Cache read should succeed.");

		assert_eq!(stored.as_deref(), Some("3"));
		assert_eq!(limiter.metrics().allowed(), 3);
		assert_eq!(limiter.metrics().denied(), 2);
	}

	#[tokio::test]
	async fn peek_does_not_consume() {
		let limiter = limiter();
		let key = ThrottleKey::password_reset("user-1");

		assert!(limiter.peek(&key, 1).await.expect("Peek should reach the cache."));
		assert!(limiter.peek(&key, 1).await.expect("Peek should reach the cache."));
		assert!(attempt(&limiter, &key, 1).await);
		assert!(!limiter.peek(&key, 1).await.expect("Peek should reach the cache."));
		assert_eq!(limiter.metrics().checks(), 1);
	}

	#[tokio::test]
	async fn separate_identities_have_separate_budgets() {
		let limiter = limiter();
		let alice = ThrottleKey::login("10.0.0.1", "alice");
		let bob = ThrottleKey::login("10.0.0.1", "bob");

		assert!(attempt(&limiter, &alice, 1).await);
		assert!(!attempt(&limiter, &alice, 1).await);
		assert!(attempt(&limiter, &bob, 1).await);
	}
}
