//! Service configuration built once at process start and shared read-only afterwards.
//!
//! Every section deserializes with defaults, so a partial JSON document (or none at all) yields
//! a usable configuration. Signing keys stay out of this struct; they are handed to
//! [`TokenIssuer::new`](crate::token::TokenIssuer::new) directly.

// self
use crate::{
	_prelude::*,
	auth::{PasswordHasher, PasswordPolicy, UsernamePolicy},
	error::ConfigError,
	token::SigningAlgorithm,
};

/// Minimum raw recovery token length accepted by [`AuthConfig::validate`].
pub const MIN_RECOVERY_TOKEN_LENGTH: usize = 16;
/// Longest lifetime or window accepted by [`AuthConfig::validate`] (100 years).
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
	/// Access/refresh token settings.
	pub tokens: TokenConfig,
	/// Throttle budgets.
	pub throttle: ThrottleConfig,
	/// Recovery token settings.
	pub recovery: RecoveryConfig,
	/// Password rules shared by every flow that accepts a new password.
	pub password_policy: PasswordPolicy,
	/// Username rules.
	pub username_policy: UsernamePolicy,
	/// bcrypt cost factor.
	pub password_hash_cost: u32,
}
impl AuthConfig {
	/// Parses a JSON document, reporting the failing path, then validates it.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(json);
		let config: Self = serde_path_to_error::deserialize(&mut de)?;

		config.validate()?;

		Ok(config)
	}

	/// Rejects settings the services cannot operate with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		bounded(self.tokens.access_lifetime_secs, "access token lifetime")?;
		bounded(self.tokens.refresh_lifetime_secs, "refresh token lifetime")?;
		bounded(self.recovery.reset_token_lifetime_secs, "reset token lifetime")?;

		if self.tokens.leeway_secs > MAX_DURATION_SECS {
			return Err(ConfigError::DurationTooLong {
				field: "token leeway",
				max_secs: MAX_DURATION_SECS,
			});
		}

		self.throttle.login.validate("login")?;
		self.throttle.password_reset.validate("password reset")?;
		self.throttle.email_confirmation.validate("email confirmation")?;

		if self.recovery.token_length < MIN_RECOVERY_TOKEN_LENGTH {
			return Err(ConfigError::TokenTooShort { min: MIN_RECOVERY_TOKEN_LENGTH });
		}
		if self.password_policy.min_length == 0
			|| self.password_policy.min_length > self.password_policy.max_length
		{
			return Err(ConfigError::InvertedBounds { field: "password" });
		}
		if self.username_policy.min_length == 0
			|| self.username_policy.min_length > self.username_policy.max_length
		{
			return Err(ConfigError::InvertedBounds { field: "username" });
		}

		PasswordHasher::new(self.password_hash_cost)?;

		Ok(())
	}

	/// Overrides the bcrypt cost; tests use the minimum to stay fast.
	pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
		self.password_hash_cost = cost;

		self
	}

	/// Overrides the login throttle budget.
	pub fn with_login_throttle(mut self, max_attempts: u32, window_secs: u64) -> Self {
		self.throttle.login = ThrottlePolicy { max_attempts, window_secs };

		self
	}

	/// Overrides the password-reset throttle budget.
	pub fn with_password_reset_throttle(mut self, max_attempts: u32, window_secs: u64) -> Self {
		self.throttle.password_reset = ThrottlePolicy { max_attempts, window_secs };

		self
	}
}
impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			tokens: TokenConfig::default(),
			throttle: ThrottleConfig::default(),
			recovery: RecoveryConfig::default(),
			password_policy: PasswordPolicy::default(),
			username_policy: UsernamePolicy::default(),
			password_hash_cost: bcrypt::DEFAULT_COST,
		}
	}
}

/// Access/refresh token settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
	/// Signing algorithm; must match the key handed to the issuer.
	pub algorithm: SigningAlgorithm,
	/// Access token lifetime in seconds.
	pub access_lifetime_secs: u64,
	/// Refresh token lifetime in seconds.
	pub refresh_lifetime_secs: u64,
	/// Clock-skew tolerance applied to expiry checks, in seconds.
	pub leeway_secs: u64,
}
impl TokenConfig {
	/// Access token lifetime.
	pub fn access_lifetime(&self) -> Duration {
		seconds(self.access_lifetime_secs)
	}

	/// Refresh token lifetime.
	pub fn refresh_lifetime(&self) -> Duration {
		seconds(self.refresh_lifetime_secs)
	}
}
impl Default for TokenConfig {
	fn default() -> Self {
		Self {
			algorithm: SigningAlgorithm::Hs256,
			access_lifetime_secs: 15 * 60,
			refresh_lifetime_secs: 24 * 60 * 60,
			leeway_secs: 0,
		}
	}
}

/// Attempt budget for one throttled action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottlePolicy {
	/// Attempts allowed per window.
	pub max_attempts: u32,
	/// Window length in seconds.
	pub window_secs: u64,
}
impl ThrottlePolicy {
	/// Window length.
	pub fn window(&self) -> Duration {
		seconds(self.window_secs)
	}

	fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
		if self.max_attempts == 0 {
			return Err(ConfigError::ZeroAttempts { field });
		}

		bounded(self.window_secs, field)
	}
}

/// Throttle budgets per action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
	/// Brute-force guard keyed by client address + login identifier.
	pub login: ThrottlePolicy,
	/// Forgot-password guard keyed by account.
	pub password_reset: ThrottlePolicy,
	/// Confirmation re-send guard keyed by account.
	pub email_confirmation: ThrottlePolicy,
}
impl Default for ThrottleConfig {
	fn default() -> Self {
		Self {
			login: ThrottlePolicy { max_attempts: 5, window_secs: 300 },
			password_reset: ThrottlePolicy { max_attempts: 1, window_secs: 3600 },
			email_confirmation: ThrottlePolicy { max_attempts: 1, window_secs: 300 },
		}
	}
}

/// Recovery token settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
	/// How long a password reset token stays redeemable, in seconds.
	pub reset_token_lifetime_secs: u64,
	/// Length of generated raw tokens.
	pub token_length: usize,
}
impl RecoveryConfig {
	/// Reset token lifetime.
	pub fn reset_token_lifetime(&self) -> Duration {
		seconds(self.reset_token_lifetime_secs)
	}
}
impl Default for RecoveryConfig {
	fn default() -> Self {
		Self { reset_token_lifetime_secs: 30 * 60, token_length: 64 }
	}
}

fn bounded(secs: u64, field: &'static str) -> Result<(), ConfigError> {
	match secs {
		0 => Err(ConfigError::NonPositiveDuration { field }),
		secs if secs > MAX_DURATION_SECS =>
			Err(ConfigError::DurationTooLong { field, max_secs: MAX_DURATION_SECS }),
		_ => Ok(()),
	}
}

fn seconds(secs: u64) -> Duration {
	Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}
