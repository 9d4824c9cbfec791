//! Email delivery contract for confirmation and password-reset links.

// self
use crate::{_prelude::*, auth::Secret};

/// Boxed future returned by [`EmailDispatcher`] methods.
pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DispatchError>> + 'a + Send>>;

/// Kinds of email the core sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailKind {
	/// Email address confirmation link.
	Confirmation,
	/// Password reset link.
	ForgotPassword,
}
impl EmailKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Confirmation => "confirmation",
			Self::ForgotPassword => "forgot_password",
		}
	}
}
impl Display for EmailKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Delivery failure reported by an [`EmailDispatcher`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Email delivery failed: {message}.")]
pub struct DispatchError {
	/// Human-readable error payload.
	pub message: String,
}
impl DispatchError {
	/// Wraps a delivery failure message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Fire-and-forget email delivery.
///
/// Calls run on background tasks; the raw token is only ever handed to this trait and must not be
/// logged by implementations.
pub trait EmailDispatcher
where
	Self: Send + Sync,
{
	/// Sends the email confirmation link.
	fn send_confirmation_email<'a>(
		&'a self,
		email: &'a str,
		raw_token: &'a Secret,
	) -> DispatchFuture<'a>;

	/// Sends the password reset link.
	fn send_forgot_password_email<'a>(
		&'a self,
		email: &'a str,
		raw_token: &'a Secret,
	) -> DispatchFuture<'a>;

	/// Routes to the method matching `kind`.
	fn dispatch<'a>(
		&'a self,
		kind: EmailKind,
		email: &'a str,
		raw_token: &'a Secret,
	) -> DispatchFuture<'a> {
		match kind {
			EmailKind::Confirmation => self.send_confirmation_email(email, raw_token),
			EmailKind::ForgotPassword => self.send_forgot_password_email(email, raw_token),
		}
	}
}
