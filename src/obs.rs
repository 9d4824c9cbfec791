//! Optional observability helpers for auth flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `identity_gate.flow` with the `flow` and
//!   `stage` (call site) fields, plus `warn` events for failed background email dispatch and
//!   `info` audit events for username changes.
//! - Enable `metrics` to increment the `identity_gate_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `identity_gate_throttle_total` counter labeled by `action` + `decision`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Auth flows observed by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthFlow {
	/// Local sign-up.
	Register,
	/// Password sign-in.
	Login,
	/// Access token refresh.
	Refresh,
	/// Email confirmation redemption.
	ConfirmEmail,
	/// Email confirmation re-send.
	RequestEmailConfirmation,
	/// Username change.
	ChangeUsername,
	/// Password reset request.
	ForgotPassword,
	/// Password reset redemption.
	PasswordReset,
	/// First local password for a social account.
	PasswordSet,
	/// Authenticated password change.
	PasswordChange,
	/// Social identity resolution.
	Social,
}
impl AuthFlow {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthFlow::Register => "register",
			AuthFlow::Login => "login",
			AuthFlow::Refresh => "refresh",
			AuthFlow::ConfirmEmail => "confirm_email",
			AuthFlow::RequestEmailConfirmation => "request_email_confirmation",
			AuthFlow::ChangeUsername => "change_username",
			AuthFlow::ForgotPassword => "forgot_password",
			AuthFlow::PasswordReset => "password_reset",
			AuthFlow::PasswordSet => "password_set",
			AuthFlow::PasswordChange => "password_change",
			AuthFlow::Social => "social",
		}
	}
}
impl Display for AuthFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
