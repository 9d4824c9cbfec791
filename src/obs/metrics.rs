// self
use crate::{
	obs::{AuthFlow, FlowOutcome},
	throttle::ThrottleAction,
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(flow: AuthFlow, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"identity_gate_flow_total",
			"flow" => flow.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (flow, outcome);
	}
}

/// Records a throttle decision via the global metrics recorder (when enabled).
pub fn record_throttle_decision(action: ThrottleAction, allowed: bool) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"identity_gate_throttle_total",
			"action" => action.as_str(),
			"decision" => if allowed { "allowed" } else { "denied" }
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (action, allowed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_flow_outcome(AuthFlow::Login, FlowOutcome::Failure);
		record_throttle_decision(ThrottleAction::LoginAttempt, false);
	}
}
