//! Password lifecycle: forgot, reset, set, change, and status.
//!
//! Reset tokens live in the cache as `hash -> user id` with a bounded TTL; only the digest is
//! stored. Redemption claims the mapping by deleting it before the password is replaced, so
//! each token works once even under concurrent requests.

// self
use crate::{
	_prelude::*,
	auth::{AccountPatch, Secret, UserId, check_email},
	error::ConflictReason,
	ext::EmailKind,
	flows::{AuthService, observe},
	obs::{self, AuthFlow},
	store::StoreError,
	throttle::{ThrottleAction, ThrottleKey},
	token::{RecoveryToken, TokenHash, hash_token},
};

/// Password capabilities reported to the account owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStatus {
	/// A local password is set.
	pub has_password: bool,
	/// The account is linked to a social provider.
	pub has_provider: bool,
	/// A forgot-password request would currently pass the reset throttle.
	pub reset_available: bool,
}

impl AuthService {
	/// Starts a password reset by mailing a single-use token.
	///
	/// Accounts without a local password are rejected with [`Error::PasswordNotSet`] before any
	/// token is generated or budget consumed.
	pub async fn forgot_password(&self, email: &str) -> Result<()> {
		observe(AuthFlow::ForgotPassword, "forgot_password", async move {
			let email = check_email(email)?;
			let account =
				self.users.get_by_email(&email).await?.ok_or_else(|| Error::not_found("account"))?;

			if !account.has_password() {
				return Err(Error::PasswordNotSet);
			}

			let key = ThrottleKey::password_reset(&account.id);

			if !self.limiter.check(&key, &self.config.throttle.password_reset).await? {
				return Err(Error::RateLimited { action: ThrottleAction::PasswordReset });
			}

			let token = RecoveryToken::generate(self.config.recovery.token_length);

			self.cache
				.set(
					&reset_key(&token.hash),
					account.id.to_string(),
					Some(self.config.recovery.reset_token_lifetime()),
				)
				.await?;
			obs::log_reset_requested(&account.id);
			self.spawn_email(EmailKind::ForgotPassword, account.email, token.raw);

			Ok(())
		})
		.await
	}

	/// Redeems a reset token and replaces the password.
	pub async fn password_reset(
		&self,
		raw_token: &str,
		password: &Secret,
		confirmation: &Secret,
	) -> Result<()> {
		observe(AuthFlow::PasswordReset, "password_reset", async move {
			let key = reset_key(&hash_token(raw_token));
			let stored =
				self.cache.get(&key).await?.ok_or_else(|| Error::not_found("reset token"))?;

			self.config.password_policy.check_pair(password, confirmation)?;

			// Only the caller whose delete removes the mapping may redeem it.
			if !self.cache.delete(&key).await? {
				return Err(Error::not_found("reset token"));
			}

			let id = UserId::new(&stored).map_err(|e| StoreError::Serialization {
				message: format!("reset token maps to an invalid user id: {e}"),
			})?;
			let hash = self.hasher().hash(password).await?;

			if !self.users.update(&id, AccountPatch::default().password_hash(hash)).await? {
				return Err(Error::not_found("account"));
			}

			Ok(())
		})
		.await
	}

	/// Sets the first local password of a social account.
	pub async fn password_set(
		&self,
		id: &UserId,
		password: &Secret,
		confirmation: &Secret,
	) -> Result<()> {
		observe(AuthFlow::PasswordSet, "password_set", async move {
			let account = self.require_account(id).await?;

			if account.has_password() || !account.has_provider() {
				return Err(ConflictReason::PasswordExists.into());
			}

			self.config.password_policy.check_pair(password, confirmation)?;

			let hash = self.hasher().hash(password).await?;

			self.users.update(id, AccountPatch::default().password_hash(hash)).await?;

			Ok(())
		})
		.await
	}

	/// Replaces the password after verifying the current one.
	pub async fn password_change(
		&self,
		id: &UserId,
		current: &Secret,
		password: &Secret,
		confirmation: &Secret,
	) -> Result<()> {
		observe(AuthFlow::PasswordChange, "password_change", async move {
			let account = self.require_account(id).await?;
			let Some(stored) = account.password_hash.as_deref() else {
				return Err(Error::PasswordNotSet);
			};

			self.config.password_policy.check_change(current, password, confirmation)?;

			if !self.hasher().verify(current, stored).await? {
				return Err(Error::unauthorized("current password is incorrect"));
			}

			let hash = self.hasher().hash(password).await?;

			self.users.update(id, AccountPatch::default().password_hash(hash)).await?;

			Ok(())
		})
		.await
	}

	/// Reports password capabilities without consuming reset budget.
	pub async fn password_status(&self, id: &UserId) -> Result<PasswordStatus> {
		let account = self.require_account(id).await?;
		let reset_available = account.has_password()
			&& self
				.limiter
				.peek(
					&ThrottleKey::password_reset(id),
					self.config.throttle.password_reset.max_attempts,
				)
				.await?;

		Ok(PasswordStatus {
			has_password: account.has_password(),
			has_provider: account.has_provider(),
			reset_available,
		})
	}
}

fn reset_key(hash: &TokenHash) -> String {
	format!("password_reset:{hash}")
}
