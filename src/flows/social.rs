//! Resolves an identity asserted by a social provider into a local account.
//!
//! The provider handshake happens elsewhere; this flow receives the verified provider name,
//! subject, and email address.

// self
use crate::{
	_prelude::*,
	auth::{AccountPatch, NewAccount, ProviderId, SocialIdentity, SubjectId, check_email},
	error::ConflictReason,
	flows::{AuthService, observe, store_conflict},
	obs::AuthFlow,
	token::TokenPair,
};

const USERNAME_PROBE_LIMIT: u32 = 1_000;
const USERNAME_FALLBACK: &str = "user";

impl AuthService {
	/// Signs in the account linked to `provider`/`subject`, creating it on first sight.
	///
	/// New accounts get a username derived from the email's local part with a numeric postfix
	/// appended until it is free. An email already owned by another account is a conflict.
	pub async fn resolve_social(
		&self,
		provider: ProviderId,
		subject: SubjectId,
		email: &str,
	) -> Result<TokenPair> {
		observe(AuthFlow::Social, "resolve_social", async move {
			let identity = SocialIdentity::new(provider, subject);
			let now = OffsetDateTime::now_utc();

			if let Some(account) = self.users.get_by_social(&identity).await? {
				if !account.active {
					return Err(Error::forbidden("account is inactive"));
				}

				self.users.update(&account.id, AccountPatch::default().last_login(now)).await?;

				return self.mint(&account);
			}

			let email = check_email(email)?;

			if self.users.get_by_email(&email).await?.is_some() {
				return Err(ConflictReason::EmailTaken.into());
			}

			let username = self.free_username(&email).await?;
			let id = self
				.users
				.create(NewAccount::social(email, username, identity))
				.await
				.map_err(store_conflict)?;

			self.users.update(&id, AccountPatch::default().last_login(now)).await?;

			let account = self.require_account(&id).await?;

			self.mint(&account)
		})
		.await
	}

	async fn free_username(&self, email: &str) -> Result<String> {
		let policy = &self.config.username_policy;
		let base = username_base(email, policy.min_length, policy.max_length);

		for n in 0..USERNAME_PROBE_LIMIT {
			let postfix = if n == 0 { String::new() } else { n.to_string() };
			let keep = policy.max_length.saturating_sub(postfix.len());
			let candidate = format!("{}{postfix}", truncate(&base, keep));

			if policy.check(&candidate).is_err() {
				continue;
			}
			if self.users.get_by_username(&candidate).await?.is_none() {
				return Ok(candidate);
			}
		}

		Err(ConflictReason::UsernameTaken.into())
	}
}

/// Local part of `email` reduced to the username charset, padded to `min` with a fallback.
fn username_base(email: &str, min: usize, max: usize) -> String {
	let local = email.split('@').next().unwrap_or_default();
	let mut base =
		local.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect::<String>();

	if !base.chars().any(|c| c.is_ascii_alphabetic()) {
		base.insert_str(0, USERNAME_FALLBACK);
	}
	while base.len() < min {
		base.push('_');
	}

	truncate(&base, max).to_owned()
}

// ASCII-only input, so byte slicing stays on char boundaries.
fn truncate(value: &str, max: usize) -> &str {
	&value[..value.len().min(max)]
}
