mod common;

// self
use common::*;
use identity_gate::{
	Error, ErrorKind,
	auth::{AccountPatch, ProviderId, SocialIdentity, SubjectId},
	error::ConflictReason,
	store::UserRepository,
};

fn identity(subject: &str) -> (ProviderId, SubjectId) {
	(
		ProviderId::new("github").expect("Provider fixture should be valid."),
		SubjectId::new(subject).expect("Subject fixture should be valid."),
	)
}

#[tokio::test]
async fn first_sight_creates_an_account_and_later_sign_ins_reuse_it() {
	let harness = build_test_service();
	let (provider, subject) = identity("gh-1");
	let first = harness
		.service
		.resolve_social(provider.clone(), subject.clone(), "octo.cat@b.com")
		.await
		.expect("First resolution should create the account.");
	let id = harness.subject_of(&first);
	let account = harness
		.users
		.get_by_social(&SocialIdentity::new(provider.clone(), subject.clone()))
		.await
		.expect("Repository read should succeed.")
		.expect("Linked account should exist.");

	assert_eq!(account.id, id);
	assert_eq!(account.username, "octocat");
	assert!(account.password_hash.is_none());
	assert!(account.last_login.is_some());

	let again = harness
		.service
		.resolve_social(provider, subject, "ignored@b.com")
		.await
		.expect("Second resolution should sign in.");

	assert_eq!(harness.subject_of(&again), id);
	assert_eq!(harness.users.len(), 1);
}

#[tokio::test]
async fn derived_usernames_get_a_numeric_postfix_until_free() {
	let harness = build_test_service();

	register(&harness, "x@b.com", "octo").await;

	let (provider, subject) = identity("gh-2");
	let tokens = harness
		.service
		.resolve_social(provider, subject, "octo@c.com")
		.await
		.expect("Resolution should succeed.");
	let claims = harness
		.service
		.issuer
		.decode_token(tokens.access.expose())
		.expect("Access token should decode.");

	assert_eq!(claims.username, "octo1");
}

#[tokio::test]
async fn email_owned_by_another_account_is_a_conflict() {
	let harness = build_test_service();

	register(&harness, "a@b.com", "alice").await;

	let (provider, subject) = identity("gh-3");
	let err = harness
		.service
		.resolve_social(provider, subject, "a@b.com")
		.await
		.expect_err("Foreign emails must be rejected.");

	assert!(matches!(err, Error::Conflict(ConflictReason::EmailTaken)));
}

#[tokio::test]
async fn inactive_linked_accounts_are_refused() {
	let harness = build_test_service();
	let (provider, subject) = identity("gh-4");
	let tokens = harness
		.service
		.resolve_social(provider.clone(), subject.clone(), "ban@b.com")
		.await
		.expect("Resolution should succeed.");

	harness
		.users
		.update(&harness.subject_of(&tokens), AccountPatch::default().active(false))
		.await
		.expect("Deactivation should succeed.");

	let err = harness
		.service
		.resolve_social(provider, subject, "ban@b.com")
		.await
		.expect_err("Inactive accounts must be refused.");

	assert_eq!(err.kind(), ErrorKind::Forbidden);
}
