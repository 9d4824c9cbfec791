//! High-level auth flows powered by the [`AuthService`] facade.

pub mod account;
pub mod recovery;
pub mod social;

pub use account::*;
pub use recovery::*;
pub use social::*;

// self
use crate::{
	_prelude::*,
	auth::{PasswordHasher, Secret, UserAccount, UserId},
	config::AuthConfig,
	error::{ConfigError, ConflictReason},
	ext::{EmailDispatcher, EmailKind},
	obs::{self, AuthFlow, FlowOutcome, FlowSpan},
	store::{KeyValueCache, StoreError, UserRepository},
	tasks::BackgroundTasks,
	throttle::{RateLimiter, ThrottleMetrics},
	token::{ClaimsSubject, RecoveryToken, SigningKey, TokenIssuer, TokenPair},
};

/// Coordinates the account and password state machines over injected collaborators.
///
/// The service owns the token issuer, the shared limiter, the repository/cache/email handles,
/// and the background task registry so individual flows only express their own transitions.
/// Cloning is cheap; every clone shares the same collaborators and task registry.
#[derive(Clone)]
pub struct AuthService {
	/// Configuration built once at start-up.
	pub config: Arc<AuthConfig>,
	/// Access/refresh token issuer.
	pub issuer: Arc<TokenIssuer>,
	/// Attempt limiter shared by every flow.
	pub limiter: RateLimiter,
	/// Account storage.
	pub users: Arc<dyn UserRepository>,
	/// Cache holding throttle counters and reset-token mappings.
	pub cache: Arc<dyn KeyValueCache>,
	/// Outbound email.
	pub email: Arc<dyn EmailDispatcher>,
	/// Registry for background email dispatch.
	pub tasks: BackgroundTasks,
	hasher: PasswordHasher,
}
impl AuthService {
	/// Validates `config`, builds the issuer from `key`, and wires the collaborators.
	pub fn new(
		config: AuthConfig,
		key: SigningKey,
		users: Arc<dyn UserRepository>,
		cache: Arc<dyn KeyValueCache>,
		email: Arc<dyn EmailDispatcher>,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		let issuer = TokenIssuer::new(&config.tokens, key)?;
		let hasher = PasswordHasher::new(config.password_hash_cost)?;

		Ok(Self {
			config: Arc::new(config),
			issuer: Arc::new(issuer),
			limiter: RateLimiter::new(cache.clone()),
			users,
			cache,
			email,
			tasks: BackgroundTasks::new(),
			hasher,
		})
	}

	/// In-process throttle decision counters.
	pub fn throttle_metrics(&self) -> &ThrottleMetrics {
		self.limiter.metrics()
	}

	/// Cancels outstanding background work and waits for it to unwind.
	pub async fn shutdown(&self) {
		self.tasks.shutdown().await;
	}

	pub(crate) fn hasher(&self) -> PasswordHasher {
		self.hasher
	}

	pub(crate) async fn require_account(&self, id: &UserId) -> Result<UserAccount> {
		self.users.get(id).await?.ok_or_else(|| Error::not_found("account"))
	}

	pub(crate) fn mint(&self, account: &UserAccount) -> Result<TokenPair> {
		Ok(self.issuer.create_tokens(&ClaimsSubject::from(account))?)
	}

	/// Issues a confirmation token for `email` and mails it, entirely off the result path.
	pub(crate) fn spawn_confirmation(&self, email: String) {
		let users = self.users.clone();
		let dispatcher = self.email.clone();
		let token_length = self.config.recovery.token_length;

		self.tasks.spawn(async move {
			const KIND: EmailKind = EmailKind::Confirmation;

			let token = RecoveryToken::generate(token_length);

			if let Err(e) = users.request_email_confirmation(&email, token.hash).await {
				obs::log_dispatch_failure(KIND, &e);

				return;
			}
			if let Err(e) = dispatcher.dispatch(KIND, &email, &token.raw).await {
				obs::log_dispatch_failure(KIND, &e);
			}
		});
	}

	/// Mails an already-stored token in the background.
	pub(crate) fn spawn_email(&self, kind: EmailKind, email: String, raw_token: Secret) {
		let dispatcher = self.email.clone();

		self.tasks.spawn(async move {
			if let Err(e) = dispatcher.dispatch(kind, &email, &raw_token).await {
				obs::log_dispatch_failure(kind, &e);
			}
		});
	}
}
impl Debug for AuthService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthService")
			.field("config", &self.config)
			.field("issuer", &self.issuer)
			.field("limiter", &self.limiter)
			.field("tasks", &self.tasks)
			.finish_non_exhaustive()
	}
}

/// Runs `fut` inside a flow span and records its attempt/outcome.
pub(crate) async fn observe<T, Fut>(flow: AuthFlow, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(flow, stage);

	obs::record_flow_outcome(flow, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	obs::record_flow_outcome(
		flow,
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
	);

	result
}

/// Maps write-time uniqueness violations onto conflict reasons.
pub(crate) fn store_conflict(e: StoreError) -> Error {
	match &e {
		StoreError::Duplicate { field } if field == "email" => ConflictReason::EmailTaken.into(),
		StoreError::Duplicate { field } if field == "username" =>
			ConflictReason::UsernameTaken.into(),
		_ => e.into(),
	}
}
