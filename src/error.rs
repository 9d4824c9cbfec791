//! Service-level error types shared across flows, stores, and token helpers.

// self
use crate::{_prelude::*, auth::ValidationError, store::StoreError, throttle::ThrottleAction};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every failure path carries a classification through [`Error::kind`]; transport layers map
/// the kind onto their own status codes.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Hashing or signing primitive failed.
	#[error(transparent)]
	Crypto(#[from] CryptoError),
	/// Input violated shape or policy rules.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// Unknown account, identifier, or recovery token.
	#[error("{resource} was not found.")]
	NotFound {
		/// Short label of what was looked up.
		resource: &'static str,
	},
	/// Requested change collides with existing state.
	#[error("{0}")]
	Conflict(ConflictReason),
	/// Credentials or tokens were rejected.
	#[error("Unauthorized: {reason}.")]
	Unauthorized {
		/// Caller-safe reason string.
		reason: &'static str,
	},
	/// Throttle denied the action.
	#[error("Too many {action} requests.")]
	RateLimited {
		/// Throttled action.
		action: ThrottleAction,
	},
	/// Account state forbids the action.
	#[error("Forbidden: {reason}.")]
	Forbidden {
		/// Caller-safe reason string.
		reason: &'static str,
	},
	/// Account has no local password to recover.
	#[error("Account has no password set.")]
	PasswordNotSet,
}
impl Error {
	/// Returns the classification used by transport layers.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Validation(_) => ErrorKind::Validation,
			Self::NotFound { .. } => ErrorKind::NotFound,
			Self::Conflict(_) => ErrorKind::Conflict,
			Self::Unauthorized { .. } => ErrorKind::Unauthorized,
			Self::RateLimited { .. } => ErrorKind::RateLimited,
			Self::Forbidden { .. } => ErrorKind::Forbidden,
			Self::PasswordNotSet => ErrorKind::NotAcceptable,
			Self::Storage(_) | Self::Config(_) | Self::Crypto(_) => ErrorKind::Internal,
		}
	}

	pub(crate) fn not_found(resource: &'static str) -> Self {
		Self::NotFound { resource }
	}

	pub(crate) fn unauthorized(reason: &'static str) -> Self {
		Self::Unauthorized { reason }
	}

	pub(crate) fn forbidden(reason: &'static str) -> Self {
		Self::Forbidden { reason }
	}
}

/// Stable error classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// Malformed or out-of-policy input.
	Validation,
	/// Unknown identifier, account, or token.
	NotFound,
	/// Email/username taken, password exists, username unchanged, already confirmed.
	Conflict,
	/// Bad credentials or rejected token.
	Unauthorized,
	/// Throttle denial.
	RateLimited,
	/// Account inactive or confirmation token unknown.
	Forbidden,
	/// Account cannot use the requested password flow (no local password).
	NotAcceptable,
	/// Storage, configuration, or crypto failure.
	Internal,
}
impl ErrorKind {
	/// Returns a stable label suitable for logs or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Validation => "validation",
			Self::NotFound => "not_found",
			Self::Conflict => "conflict",
			Self::Unauthorized => "unauthorized",
			Self::RateLimited => "rate_limited",
			Self::Forbidden => "forbidden",
			Self::NotAcceptable => "not_acceptable",
			Self::Internal => "internal",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Reasons attached to [`Error::Conflict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
pub enum ConflictReason {
	/// Another account already owns the email.
	#[error("Email is already registered.")]
	EmailTaken,
	/// Another account already owns the username.
	#[error("Username is already taken.")]
	UsernameTaken,
	/// The requested username equals the current one.
	#[error("Username is unchanged.")]
	UsernameUnchanged,
	/// The account already has a local password.
	#[error("Password already exists.")]
	PasswordExists,
	/// The email address is already confirmed.
	#[error("Email is already confirmed.")]
	AlreadyConfirmed,
}
impl From<ConflictReason> for Error {
	fn from(reason: ConflictReason) -> Self {
		Self::Conflict(reason)
	}
}

/// Configuration failures raised while building services.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration document could not be parsed.
	#[error("Configuration is malformed at `{path}`.")]
	Parse {
		/// Path of the offending field.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// A lifetime or window was zero.
	#[error("The {field} duration must be positive.")]
	NonPositiveDuration {
		/// Field label.
		field: &'static str,
	},
	/// A lifetime or window exceeded the supported maximum.
	#[error("The {field} duration must not exceed {max_secs} seconds.")]
	DurationTooLong {
		/// Field label.
		field: &'static str,
		/// Largest accepted value.
		max_secs: u64,
	},
	/// A throttle budget was zero.
	#[error("The {field} attempt budget must be at least one.")]
	ZeroAttempts {
		/// Field label.
		field: &'static str,
	},
	/// Minimum length exceeds the maximum.
	#[error("The {field} length bounds are inverted.")]
	InvertedBounds {
		/// Field label.
		field: &'static str,
	},
	/// bcrypt cost outside the supported range.
	#[error("Password hash cost {cost} is outside 4..=31.")]
	HashCost {
		/// Rejected cost.
		cost: u32,
	},
	/// Signing key material could not be loaded.
	#[error("Signing key is invalid.")]
	SigningKey {
		/// Underlying key parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Signing key family does not match the configured algorithm.
	#[error("Signing key does not match the {algorithm} algorithm.")]
	KeyAlgorithmMismatch {
		/// Configured algorithm label.
		algorithm: &'static str,
	},
	/// Recovery tokens would be too easy to guess.
	#[error("Recovery tokens must be at least {min} characters long.")]
	TokenTooShort {
		/// Minimum accepted length.
		min: usize,
	},
	/// Secrets must not be empty.
	#[error("The {field} secret must not be empty.")]
	EmptySecret {
		/// Field label.
		field: &'static str,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Parse { path: e.path().to_string(), source: e.into_inner() }
	}
}

/// Hashing and signing failures.
#[derive(Debug, ThisError)]
pub enum CryptoError {
	/// Password hashing failed.
	#[error("Password hashing failed.")]
	Hash {
		/// Underlying bcrypt failure.
		#[source]
		source: bcrypt::BcryptError,
	},
	/// Token signing failed.
	#[error("Token signing failed.")]
	Sign {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Payload serialization failed.
	#[error("Payload serialization failed.")]
	Serialize {
		/// Underlying serializer failure.
		#[source]
		source: BoxError,
	},
	/// Blocking work could not be joined.
	#[error("Blocking crypto task failed.")]
	Join {
		/// Runtime join failure.
		#[source]
		source: BoxError,
	},
}
impl CryptoError {
	pub(crate) fn serialize(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Serialize { source: Box::new(src) }
	}

	pub(crate) fn join(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Join { source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_service_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert_eq!(error.kind(), ErrorKind::Internal);
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Service error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn kinds_cover_the_taxonomy() {
		assert_eq!(Error::from(ConflictReason::UsernameUnchanged).kind(), ErrorKind::Conflict);
		assert_eq!(Error::not_found("account").kind(), ErrorKind::NotFound);
		assert_eq!(Error::unauthorized("bad credentials").kind(), ErrorKind::Unauthorized);
		assert_eq!(Error::forbidden("inactive").kind(), ErrorKind::Forbidden);
		assert_eq!(
			Error::RateLimited { action: ThrottleAction::LoginAttempt }.kind(),
			ErrorKind::RateLimited
		);
		assert_eq!(Error::PasswordNotSet.kind(), ErrorKind::NotAcceptable);
		assert_eq!(
			Error::from(ValidationError::PasswordMismatch).kind(),
			ErrorKind::Validation
		);
	}

	#[test]
	fn config_parse_errors_keep_the_path() {
		let json = r#"{"tokens":{"access_lifetime_secs":"soon"}}"#;
		let mut de = serde_json::Deserializer::from_str(json);
		let err = serde_path_to_error::deserialize::<_, crate::config::AuthConfig>(&mut de)
			.expect_err("A string lifetime must fail to parse.");
		let config_error = ConfigError::from(err);

		assert!(
			matches!(&config_error, ConfigError::Parse { path, .. } if path == "tokens.access_lifetime_secs")
		);
	}
}
