//! JWT claim shapes and the token pair returned by successful auth flows.

// self
use crate::{
	_prelude::*,
	auth::{PermissionSet, Secret, UserAccount, UserId},
};

/// Distinguishes access tokens from refresh tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
	/// Short-lived request credential.
	Access,
	/// Long-lived credential that only mints access tokens.
	Refresh,
}
impl TokenKind {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Access => "access",
			Self::Refresh => "refresh",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Account fields copied into every minted token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsSubject {
	/// Account identifier.
	pub id: UserId,
	/// Username at mint time.
	pub username: String,
	/// Permissions at mint time.
	pub permissions: PermissionSet,
}
impl From<&UserAccount> for ClaimsSubject {
	fn from(account: &UserAccount) -> Self {
		Self {
			id: account.id.clone(),
			username: account.username.clone(),
			permissions: account.permissions.clone(),
		}
	}
}

/// Decoded, verified token claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Subject (account identifier).
	pub sub: UserId,
	/// Username at mint time.
	pub username: String,
	/// Permissions at mint time.
	#[serde(default)]
	pub permissions: PermissionSet,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
	/// Token kind.
	#[serde(rename = "type")]
	pub kind: TokenKind,
}
impl TokenClaims {
	/// Builds claims for `subject` valid for `lifetime` from `issued_at`.
	pub fn new(
		subject: &ClaimsSubject,
		kind: TokenKind,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Self {
		Self {
			sub: subject.id.clone(),
			username: subject.username.clone(),
			permissions: subject.permissions.clone(),
			iat: issued_at.unix_timestamp(),
			exp: issued_at.unix_timestamp().saturating_add(lifetime.whole_seconds()),
			kind,
		}
	}

	/// Issued-at instant.
	pub fn issued_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.iat).ok()
	}

	/// Expiry instant.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp).ok()
	}

	/// Returns true for refresh tokens.
	pub fn is_refresh(&self) -> bool {
		self.kind == TokenKind::Refresh
	}
}

/// Access + refresh tokens returned by sign-in flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Access token.
	pub access: Secret,
	/// Refresh token.
	pub refresh: Secret,
}
