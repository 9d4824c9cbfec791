// std
use std::time::Duration as StdDuration;
// crates.io
use time::Duration;
// self
use identity_gate::{
	auth::{AccountPatch, NewAccount, ProviderId, SocialIdentity, SubjectId, UserId},
	store::{KeyValueCache, MemoryCache, MemoryUserRepository, StoreError, UserRepository},
	token::hash_token,
};

fn local(email: &str, username: &str) -> NewAccount {
	NewAccount::local(email, username, "$2b$04$fixturehash")
}

#[tokio::test]
async fn create_and_lookup_by_every_key() {
	let repo = MemoryUserRepository::default();
	let identity = SocialIdentity::new(
		ProviderId::new("google").expect("Provider fixture should be valid."),
		SubjectId::new("sub-9").expect("Subject fixture should be valid."),
	);
	let alice =
		repo.create(local("Alice@Example.com", "alice")).await.expect("Create should succeed.");
	let bob = repo
		.create(NewAccount::social("bob@example.com", "bobby", identity.clone()))
		.await
		.expect("Create should succeed.");

	assert_ne!(alice, bob);

	let by_id = repo.get(&alice).await.expect("Read should succeed.").expect("Alice exists.");

	assert_eq!(by_id.username, "alice");
	assert!(by_id.active);
	assert!(!by_id.confirmed);

	let by_email = repo.get_by_email("alice@example.com").await.expect("Read should succeed.");

	assert_eq!(by_email.map(|a| a.id), Some(alice.clone()));

	let by_login = repo.get_by_login("bobby").await.expect("Read should succeed.");

	assert_eq!(by_login.map(|a| a.id), Some(bob.clone()));

	let by_social = repo.get_by_social(&identity).await.expect("Read should succeed.");

	assert_eq!(by_social.map(|a| a.id), Some(bob));
	assert!(repo.get_by_username("Alice").await.expect("Read should succeed.").is_none());
}

#[tokio::test]
async fn uniqueness_is_enforced_at_write_time() {
	let repo = MemoryUserRepository::default();
	let alice = repo.create(local("a@b.com", "alice")).await.expect("Create should succeed.");

	repo.create(local("c@d.com", "carol")).await.expect("Create should succeed.");

	let err = repo.create(local("A@B.com", "other")).await.expect_err("Email must be unique.");

	assert_eq!(err, StoreError::Duplicate { field: "email".into() });

	let err = repo
		.update(&alice, AccountPatch::default().username("carol"))
		.await
		.expect_err("Username must be unique.");

	assert_eq!(err, StoreError::Duplicate { field: "username".into() });
}

#[tokio::test]
async fn missing_records_are_empty_results() {
	let repo = MemoryUserRepository::default();
	let ghost = UserId::new("ghost").expect("User fixture should be valid.");

	assert!(repo.get(&ghost).await.expect("Read should succeed.").is_none());
	assert!(
		!repo
			.update(&ghost, AccountPatch::default().active(false))
			.await
			.expect("Update should succeed.")
	);
	assert!(!repo.delete(&ghost).await.expect("Delete should succeed."));
	assert!(!repo.confirm_email(&hash_token("nope")).await.expect("Confirm should succeed."));
}

#[tokio::test]
async fn confirmation_marks_the_account_and_consumes_the_record() {
	let repo = MemoryUserRepository::default();
	let id = repo.create(local("a@b.com", "alice")).await.expect("Create should succeed.");
	let stale = hash_token("stale");
	let fresh = hash_token("fresh");

	repo.request_email_confirmation("a@b.com", stale.clone()).await.expect("Upsert succeeds.");
	repo.request_email_confirmation("a@b.com", fresh.clone()).await.expect("Upsert succeeds.");

	assert!(!repo.has_pending_confirmation(&stale));
	assert!(repo.confirm_email(&fresh).await.expect("Confirm should succeed."));
	assert!(!repo.has_pending_confirmation(&fresh));
	assert!(!repo.confirm_email(&fresh).await.expect("Confirm should succeed."));

	let account = repo.get(&id).await.expect("Read should succeed.").expect("Account exists.");

	assert!(account.confirmed);
	assert!(repo.delete(&id).await.expect("Delete should succeed."));
	assert!(repo.is_empty());
}

#[tokio::test]
async fn cache_primitives_respect_ttl() {
	let cache = MemoryCache::default();
	let ttl = Some(Duration::seconds(1));

	assert!(cache.setnx("k", "1".into(), ttl).await.expect("setnx should succeed."));
	assert!(!cache.setnx("k", "9".into(), ttl).await.expect("setnx should succeed."));
	assert_eq!(cache.incr("k").await.expect("incr should succeed."), Some(2));
	assert_eq!(cache.get("k").await.expect("get should succeed.").as_deref(), Some("2"));
	assert_eq!(cache.incr("missing").await.expect("incr should succeed."), None);

	cache.set("text", "abc".into(), None).await.expect("set should succeed.");

	assert!(matches!(cache.incr("text").await, Err(StoreError::Serialization { .. })));

	tokio::time::sleep(StdDuration::from_millis(1_100)).await;

	assert!(cache.get("k").await.expect("get should succeed.").is_none());
	assert_eq!(cache.incr("k").await.expect("incr should succeed."), None);
	assert!(cache.delete("text").await.expect("delete should succeed."));
	assert!(!cache.delete("text").await.expect("delete should succeed."));
	assert!(cache.is_empty());
}
