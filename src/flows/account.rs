//! Account lifecycle: registration, sign-in, refresh, email confirmation, and username changes.
//!
//! Accounts move `unregistered -> pending confirmation -> confirmed`, and orthogonally between
//! active and inactive. Every state-changing flow consults the limiter before touching storage.

// self
use crate::{
	_prelude::*,
	auth::{AccountPatch, NewAccount, Secret, UserAccount, UserId, ValidationError, check_email},
	error::ConflictReason,
	flows::{AuthService, observe, store_conflict},
	obs::{self, AuthFlow},
	throttle::{ThrottleAction, ThrottleKey},
	token::{ClaimsSubject, TokenPair, hash_token},
};

/// Local sign-up input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registration {
	/// Email address.
	pub email: String,
	/// Requested username.
	pub username: String,
	/// Password.
	pub password: Secret,
	/// Password repeated.
	pub password_confirmation: Secret,
}
impl Registration {
	/// Builds the input with a matching confirmation.
	pub fn new(
		email: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<Secret>,
	) -> Self {
		let password = password.into();

		Self {
			email: email.into(),
			username: username.into(),
			password_confirmation: password.clone(),
			password,
		}
	}
}

/// Email confirmation state reported to the account owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfirmationStatus {
	/// Current email address.
	pub email: String,
	/// Whether it has been confirmed.
	pub confirmed: bool,
}

impl AuthService {
	/// Creates a local account and signs it in.
	///
	/// The confirmation email is issued in the background; its failure never fails registration.
	pub async fn register(&self, input: Registration) -> Result<TokenPair> {
		observe(AuthFlow::Register, "register", async move {
			let email = check_email(&input.email)?;
			let username = self.config.username_policy.check(&input.username)?;

			self.config.password_policy.check_pair(&input.password, &input.password_confirmation)?;

			if self.users.get_by_email(&email).await?.is_some() {
				return Err(ConflictReason::EmailTaken.into());
			}
			if self.users.get_by_username(&username).await?.is_some() {
				return Err(ConflictReason::UsernameTaken.into());
			}

			let hash = self.hasher().hash(&input.password).await?;
			let id = self
				.users
				.create(NewAccount::local(email.clone(), username, hash))
				.await
				.map_err(store_conflict)?;
			let account = self.require_account(&id).await?;

			self.spawn_confirmation(email);

			self.mint(&account)
		})
		.await
	}

	/// Signs in with an email or username.
	///
	/// The login budget is consumed per (client address, login) before the account is even
	/// looked up, so a correct password does not bypass an exhausted window.
	pub async fn login(
		&self,
		client_addr: &str,
		login: &str,
		password: &Secret,
	) -> Result<TokenPair> {
		observe(AuthFlow::Login, "login", async move {
			let login = login.trim();

			if login.is_empty() || password.is_empty() {
				return Err(ValidationError::MissingCredentials.into());
			}

			let key = ThrottleKey::login(client_addr, login);

			if !self.limiter.check(&key, &self.config.throttle.login).await? {
				return Err(Error::RateLimited { action: ThrottleAction::LoginAttempt });
			}

			let account =
				self.users.get_by_login(login).await?.ok_or_else(|| Error::not_found("account"))?;

			if !account.active {
				return Err(Error::forbidden("account is inactive"));
			}

			let Some(hash) = account.password_hash.as_deref() else {
				return Err(Error::unauthorized("invalid credentials"));
			};

			if !self.hasher().verify(password, hash).await? {
				return Err(Error::unauthorized("invalid credentials"));
			}

			self.users
				.update(&account.id, AccountPatch::default().last_login(OffsetDateTime::now_utc()))
				.await?;

			self.mint(&account)
		})
		.await
	}

	/// Mints a fresh access token from a refresh token.
	///
	/// The account is re-read so permission or username changes and deactivation take effect
	/// immediately. The refresh token itself is not re-issued.
	pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<Secret> {
		observe(AuthFlow::Refresh, "refresh_access_token", async move {
			let claims = self
				.issuer
				.decode_token(refresh_token)
				.filter(|claims| claims.is_refresh())
				.ok_or_else(|| Error::unauthorized("invalid refresh token"))?;
			let account = self
				.users
				.get(&claims.sub)
				.await?
				.ok_or_else(|| Error::unauthorized("invalid refresh token"))?;

			if !account.active {
				return Err(Error::forbidden("account is inactive"));
			}

			Ok(self.issuer.create_access_token(&ClaimsSubject::from(&account))?)
		})
		.await
	}

	/// Redeems an email confirmation token.
	///
	/// Unknown, consumed, and empty tokens are indistinguishable to the caller.
	pub async fn confirm_email(&self, raw_token: &str) -> Result<()> {
		observe(AuthFlow::ConfirmEmail, "confirm_email", async move {
			if raw_token.is_empty() || !self.users.confirm_email(&hash_token(raw_token)).await? {
				return Err(Error::forbidden("invalid confirmation token"));
			}

			Ok(())
		})
		.await
	}

	/// Renames an account; the change is audit-logged.
	pub async fn change_username(&self, id: &UserId, new_username: &str) -> Result<UserAccount> {
		observe(AuthFlow::ChangeUsername, "change_username", async move {
			let username = self.config.username_policy.check(new_username)?;
			let account = self.require_account(id).await?;

			if account.username == username {
				return Err(ConflictReason::UsernameUnchanged.into());
			}
			if self.users.get_by_username(&username).await?.is_some() {
				return Err(ConflictReason::UsernameTaken.into());
			}

			obs::audit_username_change(id, &account.username, &username);

			if !self
				.users
				.update(id, AccountPatch::default().username(username))
				.await
				.map_err(store_conflict)?
			{
				return Err(Error::not_found("account"));
			}

			self.require_account(id).await
		})
		.await
	}

	/// Re-sends the confirmation email under its own throttle.
	pub async fn request_email_confirmation(&self, id: &UserId) -> Result<()> {
		observe(AuthFlow::RequestEmailConfirmation, "request_email_confirmation", async move {
			let account = self.require_account(id).await?;

			if account.confirmed {
				return Err(ConflictReason::AlreadyConfirmed.into());
			}

			let key = ThrottleKey::email_confirmation(id);

			if !self.limiter.check(&key, &self.config.throttle.email_confirmation).await? {
				return Err(Error::RateLimited { action: ThrottleAction::EmailConfirmation });
			}

			self.spawn_confirmation(account.email);

			Ok(())
		})
		.await
	}

	/// Reports the account's email and whether it is confirmed.
	pub async fn email_confirmation_status(&self, id: &UserId) -> Result<EmailConfirmationStatus> {
		let account = self.require_account(id).await?;

		Ok(EmailConfirmationStatus { email: account.email, confirmed: account.confirmed })
	}
}
