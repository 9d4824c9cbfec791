// self
use crate::{_prelude::*, auth::UserId, ext::EmailKind, obs::AuthFlow};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by auth flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow + stage.
	pub fn new(flow: AuthFlow, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("identity_gate.flow", flow = flow.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (flow, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a background email dispatch that failed; the caller's result is unaffected.
pub fn log_dispatch_failure(kind: EmailKind, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!(email = kind.as_str(), %error, "Email dispatch failed.");

	#[cfg(not(feature = "tracing"))]
	let _ = (kind, error);
}

/// Audit trail entry for a username change.
pub fn audit_username_change(id: &UserId, old: &str, new: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(user_id = %id, old_username = old, new_username = new, "Username changed.");

	#[cfg(not(feature = "tracing"))]
	let _ = (id, old, new);
}

/// Records that a reset token was issued; the token itself is never logged.
pub fn log_reset_requested(id: &UserId) {
	#[cfg(feature = "tracing")]
	tracing::info!(user_id = %id, "Password reset requested.");

	#[cfg(not(feature = "tracing"))]
	let _ = id;
}
