//! Account records exchanged with the user repository.

// self
use crate::{
	_prelude::*,
	auth::{PermissionSet, ProviderId, SubjectId, UserId},
};

/// Provider identity attached to accounts created through social sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocialIdentity {
	/// Provider name.
	pub provider: ProviderId,
	/// Subject identifier issued by the provider.
	pub subject: SubjectId,
}
impl SocialIdentity {
	/// Pairs a provider with the subject it issued.
	pub fn new(provider: ProviderId, subject: SubjectId) -> Self {
		Self { provider, subject }
	}
}

/// Persisted account state as returned by the repository.
///
/// The provider/subject pair lives in a single [`SocialIdentity`] so both halves are always
/// present or absent together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
	/// Opaque identifier.
	pub id: UserId,
	/// Unique email address.
	pub email: String,
	/// Unique, case-sensitive username.
	pub username: String,
	/// bcrypt hash; `None` for social accounts without a local password.
	pub password_hash: Option<String>,
	/// Inactive accounts are banned from signing in.
	pub active: bool,
	/// Whether the email address has been confirmed.
	pub confirmed: bool,
	/// Social provider identity, if the account originated there.
	pub social: Option<SocialIdentity>,
	/// Granted permissions.
	pub permissions: PermissionSet,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Last successful sign-in.
	pub last_login: Option<OffsetDateTime>,
}
impl UserAccount {
	/// Returns true if a local password is set.
	pub fn has_password(&self) -> bool {
		self.password_hash.is_some()
	}

	/// Returns true if the account is linked to a social provider.
	pub fn has_provider(&self) -> bool {
		self.social.is_some()
	}

	/// Applies a partial update in place.
	pub fn apply(&mut self, patch: &AccountPatch) {
		if let Some(username) = &patch.username {
			self.username = username.clone();
		}
		if let Some(hash) = &patch.password_hash {
			self.password_hash = Some(hash.clone());
		}
		if let Some(active) = patch.active {
			self.active = active;
		}
		if let Some(confirmed) = patch.confirmed {
			self.confirmed = confirmed;
		}
		if let Some(permissions) = &patch.permissions {
			self.permissions = permissions.clone();
		}
		if let Some(instant) = patch.last_login {
			self.last_login = Some(instant);
		}
	}
}
impl Debug for UserAccount {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserAccount")
			.field("id", &self.id)
			.field("email", &self.email)
			.field("username", &self.username)
			.field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
			.field("active", &self.active)
			.field("confirmed", &self.confirmed)
			.field("social", &self.social)
			.field("permissions", &self.permissions)
			.field("created_at", &self.created_at)
			.field("last_login", &self.last_login)
			.finish()
	}
}

/// Account fields supplied to [`UserRepository::create`](crate::store::UserRepository::create).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
	/// Unique email address.
	pub email: String,
	/// Unique username.
	pub username: String,
	/// bcrypt hash, absent for social sign-ups.
	pub password_hash: Option<String>,
	/// Social provider identity.
	pub social: Option<SocialIdentity>,
	/// Initial permissions.
	pub permissions: PermissionSet,
	/// Creation instant.
	pub created_at: OffsetDateTime,
}
impl NewAccount {
	/// Local sign-up with a hashed password.
	pub fn local(
		email: impl Into<String>,
		username: impl Into<String>,
		password_hash: impl Into<String>,
	) -> Self {
		Self {
			email: email.into(),
			username: username.into(),
			password_hash: Some(password_hash.into()),
			social: None,
			permissions: PermissionSet::default(),
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Social sign-up without a local password.
	pub fn social(
		email: impl Into<String>,
		username: impl Into<String>,
		identity: SocialIdentity,
	) -> Self {
		Self {
			email: email.into(),
			username: username.into(),
			password_hash: None,
			social: Some(identity),
			permissions: PermissionSet::default(),
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Overrides the initial permissions.
	pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
		self.permissions = permissions;

		self
	}

	/// Materializes the persisted record under the provided identifier.
	///
	/// New accounts start active and unconfirmed.
	pub fn into_account(self, id: UserId) -> UserAccount {
		UserAccount {
			id,
			email: self.email,
			username: self.username,
			password_hash: self.password_hash,
			active: true,
			confirmed: false,
			social: self.social,
			permissions: self.permissions,
			created_at: self.created_at,
			last_login: None,
		}
	}
}
impl Debug for NewAccount {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NewAccount")
			.field("email", &self.email)
			.field("username", &self.username)
			.field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
			.field("social", &self.social)
			.finish()
	}
}

/// Partial update passed to [`UserRepository::update`](crate::store::UserRepository::update).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPatch {
	/// Replacement username.
	pub username: Option<String>,
	/// Replacement password hash.
	pub password_hash: Option<String>,
	/// Replacement active flag.
	pub active: Option<bool>,
	/// Replacement confirmed flag.
	pub confirmed: Option<bool>,
	/// Replacement permissions.
	pub permissions: Option<PermissionSet>,
	/// Replacement last-login instant.
	pub last_login: Option<OffsetDateTime>,
}
impl AccountPatch {
	/// Sets the username.
	pub fn username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}

	/// Sets the password hash.
	pub fn password_hash(mut self, hash: impl Into<String>) -> Self {
		self.password_hash = Some(hash.into());

		self
	}

	/// Sets the active flag.
	pub fn active(mut self, active: bool) -> Self {
		self.active = Some(active);

		self
	}

	/// Sets the confirmed flag.
	pub fn confirmed(mut self, confirmed: bool) -> Self {
		self.confirmed = Some(confirmed);

		self
	}

	/// Sets the permissions.
	pub fn permissions(mut self, permissions: PermissionSet) -> Self {
		self.permissions = Some(permissions);

		self
	}

	/// Sets the last-login instant.
	pub fn last_login(mut self, instant: OffsetDateTime) -> Self {
		self.last_login = Some(instant);

		self
	}

	/// Returns true if the patch changes nothing.
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}
}
impl Debug for AccountPatch {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccountPatch")
			.field("username", &self.username)
			.field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
			.field("active", &self.active)
			.field("confirmed", &self.confirmed)
			.field("permissions", &self.permissions)
			.field("last_login", &self.last_login)
			.finish()
	}
}
