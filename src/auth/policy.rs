//! Shared input policy: email shape, username rules, and password rules.
//!
//! Every flow that accepts a new password (register, set, reset, change) goes through
//! [`PasswordPolicy::check_pair`], so the rules live in exactly one place.

// self
use crate::{_prelude::*, auth::Secret};

const EMAIL_MAX_LEN: usize = 254;

/// Structured validation failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ValidationError {
	/// Email does not look like `local@domain.tld`.
	#[error("Email address is invalid.")]
	EmailInvalid,
	/// Username length outside the policy bounds.
	#[error("Username must be between {min} and {max} characters.")]
	UsernameLength {
		/// Minimum length.
		min: usize,
		/// Maximum length.
		max: usize,
	},
	/// Username contains characters outside the allowed set.
	#[error("Username may only contain letters, digits, and underscores.")]
	UsernameCharacters,
	/// Username contains no letter at all.
	#[error("Username must contain at least one letter.")]
	UsernameNeedsLetter,
	/// Username is on the reserved list.
	#[error("Username is reserved.")]
	UsernameReserved,
	/// Password contains whitespace.
	#[error("Password must not contain whitespace.")]
	PasswordWhitespace,
	/// Password length outside the policy bounds.
	#[error("Password must be between {min} and {max} characters.")]
	PasswordLength {
		/// Minimum length.
		min: usize,
		/// Maximum length.
		max: usize,
	},
	/// Password and confirmation differ.
	#[error("Passwords do not match.")]
	PasswordMismatch,
	/// Password contains characters outside the allowed set.
	#[error("Password contains unsupported characters.")]
	PasswordCharacters,
	/// New password equals the current one.
	#[error("New password must differ from the current one.")]
	PasswordUnchanged,
	/// Login identifier or password was empty.
	#[error("Login and password are required.")]
	MissingCredentials,
}

/// Username rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsernamePolicy {
	/// Minimum length in characters.
	pub min_length: usize,
	/// Maximum length in characters.
	pub max_length: usize,
	/// Names nobody may register (compared case-insensitively).
	pub reserved: Vec<String>,
}
impl UsernamePolicy {
	/// Validates a username, returning its trimmed form.
	pub fn check(&self, raw: &str) -> Result<String, ValidationError> {
		let username = raw.trim();
		let len = username.chars().count();

		if len < self.min_length || len > self.max_length {
			return Err(ValidationError::UsernameLength {
				min: self.min_length,
				max: self.max_length,
			});
		}
		if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return Err(ValidationError::UsernameCharacters);
		}
		if !username.chars().any(|c| c.is_ascii_alphabetic()) {
			return Err(ValidationError::UsernameNeedsLetter);
		}
		if self.reserved.iter().any(|name| name.eq_ignore_ascii_case(username)) {
			return Err(ValidationError::UsernameReserved);
		}

		Ok(username.to_owned())
	}
}
impl Default for UsernamePolicy {
	fn default() -> Self {
		Self {
			min_length: 4,
			max_length: 20,
			reserved: ["admin", "administrator", "root", "support", "system", "moderator"]
				.into_iter()
				.map(String::from)
				.collect(),
		}
	}
}

/// Password rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
	/// Minimum length in characters.
	pub min_length: usize,
	/// Maximum length in characters.
	pub max_length: usize,
	/// Punctuation allowed besides ASCII letters and digits.
	pub allowed_symbols: String,
}
impl PasswordPolicy {
	/// Validates a new password against its confirmation field.
	pub fn check_pair(&self, password: &Secret, confirmation: &Secret) -> Result<(), ValidationError> {
		let value = confirmation.expose();

		if value.chars().any(char::is_whitespace) {
			return Err(ValidationError::PasswordWhitespace);
		}

		let len = value.chars().count();

		if len < self.min_length || len > self.max_length {
			return Err(ValidationError::PasswordLength {
				min: self.min_length,
				max: self.max_length,
			});
		}
		if password.expose() != value {
			return Err(ValidationError::PasswordMismatch);
		}
		if !value.chars().all(|c| c.is_ascii_alphanumeric() || self.allowed_symbols.contains(c)) {
			return Err(ValidationError::PasswordCharacters);
		}

		Ok(())
	}

	/// Validates a password change: the pair rules plus "new differs from current".
	pub fn check_change(
		&self,
		current: &Secret,
		password: &Secret,
		confirmation: &Secret,
	) -> Result<(), ValidationError> {
		self.check_pair(password, confirmation)?;

		if current.expose() == password.expose() {
			return Err(ValidationError::PasswordUnchanged);
		}

		Ok(())
	}
}
impl Default for PasswordPolicy {
	fn default() -> Self {
		Self {
			min_length: 6,
			max_length: 32,
			allowed_symbols: "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~".into(),
		}
	}
}

/// Validates the shape of an email address and returns its trimmed form.
pub fn check_email(raw: &str) -> Result<String, ValidationError> {
	let email = raw.trim();

	if email.is_empty() || email.len() > EMAIL_MAX_LEN || email.chars().any(char::is_whitespace) {
		return Err(ValidationError::EmailInvalid);
	}

	let Some((local, domain)) = email.split_once('@') else {
		return Err(ValidationError::EmailInvalid);
	};

	if local.is_empty() || domain.contains('@') {
		return Err(ValidationError::EmailInvalid);
	}

	let labels = domain.split('.').collect::<Vec<_>>();

	if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
		return Err(ValidationError::EmailInvalid);
	}

	Ok(email.to_owned())
}
