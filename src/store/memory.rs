//! Thread-safe in-memory [`UserRepository`] and [`KeyValueCache`] implementations for local
//! development and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccountPatch, NewAccount, SocialIdentity, UserAccount, UserId},
	store::{KeyValueCache, StoreError, StoreFuture, UserRepository},
	token::TokenHash,
};

#[derive(Debug, Default)]
struct UserTable {
	accounts: HashMap<UserId, UserAccount>,
	// token hash -> email
	confirmations: HashMap<TokenHash, String>,
}
impl UserTable {
	fn find(&self, predicate: impl Fn(&UserAccount) -> bool) -> Option<UserAccount> {
		self.accounts.values().find(|account| predicate(account)).cloned()
	}

	fn email_taken(&self, email: &str, except: Option<&UserId>) -> bool {
		self.accounts
			.values()
			.any(|a| Some(&a.id) != except && a.email.eq_ignore_ascii_case(email))
	}

	fn username_taken(&self, username: &str, except: Option<&UserId>) -> bool {
		self.accounts.values().any(|a| Some(&a.id) != except && a.username == username)
	}
}

type UserMap = Arc<RwLock<UserTable>>;

/// In-process account store; emails compare case-insensitively, usernames exactly.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserRepository(UserMap);
impl MemoryUserRepository {
	/// Number of stored accounts.
	pub fn len(&self) -> usize {
		self.0.read().accounts.len()
	}

	/// Returns true if no account is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().accounts.is_empty()
	}

	/// Returns true if a confirmation is pending under `token_hash`.
	pub fn has_pending_confirmation(&self, token_hash: &TokenHash) -> bool {
		self.0.read().confirmations.contains_key(token_hash)
	}

	fn create_now(map: UserMap, account: NewAccount) -> Result<UserId, StoreError> {
		let mut guard = map.write();

		if guard.email_taken(&account.email, None) {
			return Err(StoreError::Duplicate { field: "email".into() });
		}
		if guard.username_taken(&account.username, None) {
			return Err(StoreError::Duplicate { field: "username".into() });
		}

		let id = UserId::generate();

		guard.accounts.insert(id.clone(), account.into_account(id.clone()));

		Ok(id)
	}

	fn update_now(map: UserMap, id: UserId, patch: AccountPatch) -> Result<bool, StoreError> {
		let mut guard = map.write();

		if let Some(username) = &patch.username
			&& guard.username_taken(username, Some(&id))
		{
			return Err(StoreError::Duplicate { field: "username".into() });
		}

		match guard.accounts.get_mut(&id) {
			Some(account) => {
				account.apply(&patch);

				Ok(true)
			},
			None => Ok(false),
		}
	}

	fn request_confirmation_now(map: UserMap, email: String, token_hash: TokenHash) {
		let mut guard = map.write();

		guard.confirmations.retain(|_, pending| !pending.eq_ignore_ascii_case(&email));
		guard.confirmations.insert(token_hash, email);
	}

	fn confirm_now(map: UserMap, token_hash: TokenHash) -> bool {
		let mut guard = map.write();
		let Some(email) = guard.confirmations.remove(&token_hash) else {
			return false;
		};

		match guard.accounts.values_mut().find(|a| a.email.eq_ignore_ascii_case(&email)) {
			Some(account) => {
				account.confirmed = true;

				true
			},
			None => false,
		}
	}
}
impl UserRepository for MemoryUserRepository {
	fn get<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserAccount>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().accounts.get(id).cloned()) })
	}

	fn get_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<UserAccount>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().find(|a| a.email.eq_ignore_ascii_case(email))) })
	}

	fn get_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<UserAccount>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().find(|a| a.username == username)) })
	}

	fn get_by_login<'a>(&'a self, login: &'a str) -> StoreFuture<'a, Option<UserAccount>> {
		let map = self.0.clone();

		Box::pin(async move {
			Ok(map.read().find(|a| a.username == login || a.email.eq_ignore_ascii_case(login)))
		})
	}

	fn get_by_social<'a>(
		&'a self,
		identity: &'a SocialIdentity,
	) -> StoreFuture<'a, Option<UserAccount>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().find(|a| a.social.as_ref() == Some(identity))) })
	}

	fn create(&self, account: NewAccount) -> StoreFuture<'_, UserId> {
		let map = self.0.clone();

		Box::pin(async move { Self::create_now(map, account) })
	}

	fn update<'a>(&'a self, id: &'a UserId, patch: AccountPatch) -> StoreFuture<'a, bool> {
		let map = self.0.clone();
		let id = id.to_owned();

		Box::pin(async move { Self::update_now(map, id, patch) })
	}

	fn delete<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().accounts.remove(id).is_some()) })
	}

	fn request_email_confirmation<'a>(
		&'a self,
		email: &'a str,
		token_hash: TokenHash,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let email = email.to_owned();

		Box::pin(async move {
			Self::request_confirmation_now(map, email, token_hash);

			Ok(())
		})
	}

	fn confirm_email<'a>(&'a self, token_hash: &'a TokenHash) -> StoreFuture<'a, bool> {
		let map = self.0.clone();
		let token_hash = token_hash.to_owned();

		Box::pin(async move { Ok(Self::confirm_now(map, token_hash)) })
	}
}

#[derive(Clone, Debug)]
struct CacheEntry {
	value: String,
	expires_at: Option<OffsetDateTime>,
}
impl CacheEntry {
	fn new(value: String, ttl: Option<Duration>, now: OffsetDateTime) -> Self {
		Self { value, expires_at: ttl.and_then(|ttl| now.checked_add(ttl)) }
	}

	fn is_live(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|at| at > now)
	}
}

type CacheMap = Arc<Mutex<HashMap<String, CacheEntry>>>;

/// In-process TTL cache; expired entries are dropped on access and swept on every write.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	/// Number of live entries.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.lock().values().filter(|entry| entry.is_live(now)).count()
	}

	/// Returns true if no live entry exists.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn live_entry<'m>(
		map: &'m mut HashMap<String, CacheEntry>,
		key: &str,
		now: OffsetDateTime,
	) -> Option<&'m mut CacheEntry> {
		if map.get(key).is_some_and(|entry| !entry.is_live(now)) {
			map.remove(key);
		}

		map.get_mut(key)
	}

	fn sweep(map: &mut HashMap<String, CacheEntry>, now: OffsetDateTime) {
		map.retain(|_, entry| entry.is_live(now));
	}

	fn setnx_now(map: CacheMap, key: &str, value: String, ttl: Option<Duration>) -> bool {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.lock();

		Self::sweep(&mut guard, now);

		if Self::live_entry(&mut guard, key, now).is_some() {
			return false;
		}

		guard.insert(key.to_owned(), CacheEntry::new(value, ttl, now));

		true
	}

	fn incr_now(map: CacheMap, key: &str) -> Result<Option<i64>, StoreError> {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.lock();
		let Some(entry) = Self::live_entry(&mut guard, key, now) else {
			return Ok(None);
		};
		let current = entry.value.parse::<i64>().map_err(|e| StoreError::Serialization {
			message: format!("value at `{key}` is not an integer: {e}"),
		})?;
		let next = current.saturating_add(1);

		entry.value = next.to_string();

		Ok(Some(next))
	}
}
impl KeyValueCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let mut guard = map.lock();

			Ok(Self::live_entry(&mut guard, key, now).map(|entry| entry.value.clone()))
		})
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: String,
		ttl: Option<Duration>,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let mut guard = map.lock();

			Self::sweep(&mut guard, now);
			guard.insert(key.to_owned(), CacheEntry::new(value, ttl, now));

			Ok(())
		})
	}

	fn setnx<'a>(
		&'a self,
		key: &'a str,
		value: String,
		ttl: Option<Duration>,
	) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::setnx_now(map, key, value, ttl)) })
	}

	fn incr<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<i64>> {
		let map = self.0.clone();

		Box::pin(async move { Self::incr_now(map, key) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let mut guard = map.lock();
			let existed = Self::live_entry(&mut guard, key, now).is_some();

			guard.remove(key);

			Ok(existed)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn writes_sweep_expired_entries() {
		let cache = MemoryCache::default();
		let past = OffsetDateTime::now_utc() - Duration::minutes(1);

		cache.0.lock().insert(
			"throttle:login_attempt:stale".into(),
			CacheEntry { value: "3".into(), expires_at: Some(past) },
		);
		cache
			.set("fresh", "1".into(), Some(Duration::minutes(5)))
			.await
			.expect("set should succeed.");

		assert_eq!(cache.0.lock().len(), 1);

		cache.0.lock().insert(
			"password_reset:stale".into(),
			CacheEntry { value: "user-1".into(), expires_at: Some(past) },
		);

		assert!(cache.setnx("other", "1".into(), None).await.expect("setnx should succeed."));
		assert_eq!(cache.0.lock().len(), 2);
		assert!(!cache.0.lock().contains_key("password_reset:stale"));
	}

	#[test]
	fn oversized_ttl_never_expires() {
		let entry = CacheEntry::new("1".into(), Some(Duration::MAX), OffsetDateTime::now_utc());

		assert!(entry.expires_at.is_none());
		assert!(entry.is_live(OffsetDateTime::now_utc()));
	}
}
