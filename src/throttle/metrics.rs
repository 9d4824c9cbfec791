// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for throttle decisions.
#[derive(Debug, Default)]
pub struct ThrottleMetrics {
	checks: AtomicU64,
	allowed: AtomicU64,
	denied: AtomicU64,
}
impl ThrottleMetrics {
	/// Returns the total number of consuming checks.
	pub fn checks(&self) -> u64 {
		self.checks.load(Ordering::Relaxed)
	}

	/// Returns the number of checks that consumed budget.
	pub fn allowed(&self) -> u64 {
		self.allowed.load(Ordering::Relaxed)
	}

	/// Returns the number of checks rejected because the budget was spent.
	pub fn denied(&self) -> u64 {
		self.denied.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, allowed: bool) {
		self.checks.fetch_add(1, Ordering::Relaxed);

		if allowed {
			self.allowed.fetch_add(1, Ordering::Relaxed);
		} else {
			self.denied.fetch_add(1, Ordering::Relaxed);
		}
	}
}
