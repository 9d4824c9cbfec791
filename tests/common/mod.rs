//! Shared fixtures for integration tests: an [`AuthService`] wired to in-memory stores and a
//! dispatcher that records every email instead of sending it.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use parking_lot::Mutex;
// self
use identity_gate::{
	AuthService,
	auth::{Secret, UserId},
	config::AuthConfig,
	ext::{DispatchError, DispatchFuture, EmailDispatcher, EmailKind},
	flows::Registration,
	store::{MemoryCache, MemoryUserRepository},
	token::{SigningKey, TokenPair},
};

pub const SIGNING_SECRET: &str = "integration-signing-secret";
pub const CLIENT_ADDR: &str = "203.0.113.7";
pub const PASSWORD: &str = "secret1";

/// Email captured by [`RecordingEmailDispatcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
	pub kind: EmailKind,
	pub email: String,
	pub token: String,
}

/// Dispatcher that records deliveries and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingEmailDispatcher {
	sent: Mutex<Vec<SentEmail>>,
	fail: Mutex<bool>,
}
impl RecordingEmailDispatcher {
	pub fn sent(&self) -> Vec<SentEmail> {
		self.sent.lock().clone()
	}

	pub fn sent_of(&self, kind: EmailKind) -> Vec<SentEmail> {
		self.sent().into_iter().filter(|mail| mail.kind == kind).collect()
	}

	pub fn last_token(&self, kind: EmailKind) -> Option<String> {
		self.sent_of(kind).pop().map(|mail| mail.token)
	}

	pub fn fail_deliveries(&self, fail: bool) {
		*self.fail.lock() = fail;
	}

	fn record(&self, kind: EmailKind, email: &str, raw_token: &Secret) -> Result<(), DispatchError> {
		if *self.fail.lock() {
			return Err(DispatchError::new("mailbox unavailable"));
		}

		self.sent.lock().push(SentEmail {
			kind,
			email: email.to_owned(),
			token: raw_token.expose().to_owned(),
		});

		Ok(())
	}
}
impl EmailDispatcher for RecordingEmailDispatcher {
	fn send_confirmation_email<'a>(
		&'a self,
		email: &'a str,
		raw_token: &'a Secret,
	) -> DispatchFuture<'a> {
		Box::pin(async move { self.record(EmailKind::Confirmation, email, raw_token) })
	}

	fn send_forgot_password_email<'a>(
		&'a self,
		email: &'a str,
		raw_token: &'a Secret,
	) -> DispatchFuture<'a> {
		Box::pin(async move { self.record(EmailKind::ForgotPassword, email, raw_token) })
	}
}

/// Service plus handles to its in-memory collaborators.
pub struct TestHarness {
	pub service: AuthService,
	pub users: Arc<MemoryUserRepository>,
	pub cache: Arc<MemoryCache>,
	pub mailer: Arc<RecordingEmailDispatcher>,
}
impl TestHarness {
	/// Waits until every background email task has finished.
	pub async fn settle(&self) {
		self.service.tasks.wait_idle().await;
	}

	/// Decodes an access token minted by the harness and returns its subject.
	pub fn subject_of(&self, tokens: &TokenPair) -> UserId {
		self.service
			.issuer
			.decode_token(tokens.access.expose())
			.expect("Harness-issued access token should decode.")
			.sub
	}
}

/// Default configuration with the cheapest bcrypt cost.
pub fn test_config() -> AuthConfig {
	AuthConfig::default().with_password_hash_cost(4)
}

pub fn build_test_service() -> TestHarness {
	build_test_service_with(test_config())
}

pub fn build_test_service_with(config: AuthConfig) -> TestHarness {
	let users = Arc::new(MemoryUserRepository::default());
	let cache = Arc::new(MemoryCache::default());
	let mailer = Arc::new(RecordingEmailDispatcher::default());
	let service = AuthService::new(
		config,
		SigningKey::secret(SIGNING_SECRET),
		users.clone(),
		cache.clone(),
		mailer.clone(),
	)
	.expect("Test service configuration should be valid.");

	TestHarness { service, users, cache, mailer }
}

/// Registers `username` with `email` and [`PASSWORD`], returning the new id and tokens.
pub async fn register(harness: &TestHarness, email: &str, username: &str) -> (UserId, TokenPair) {
	let tokens = harness
		.service
		.register(Registration::new(email, username, PASSWORD))
		.await
		.expect("Registration fixture should succeed.");

	(harness.subject_of(&tokens), tokens)
}
