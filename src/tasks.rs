//! Supervised registry for fire-and-forget work such as email dispatch.

// crates.io
use tokio_util::{sync::CancellationToken, task::TaskTracker};
// self
use crate::_prelude::*;

/// Tracks background tasks so they can be cancelled and drained on shutdown.
#[derive(Clone, Debug, Default)]
pub struct BackgroundTasks {
	tracker: TaskTracker,
	cancel: CancellationToken,
}
impl BackgroundTasks {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Spawns `fut` on the current tokio runtime; returns `false` once shutdown has begun.
	pub fn spawn<F>(&self, fut: F) -> bool
	where
		F: 'static + Send + Future<Output = ()>,
	{
		if self.cancel.is_cancelled() {
			return false;
		}

		let cancel = self.cancel.clone();

		self.tracker.spawn(async move {
			cancel.run_until_cancelled(fut).await;
		});

		true
	}

	/// Number of tasks still running.
	pub fn len(&self) -> usize {
		self.tracker.len()
	}

	/// Returns true if no task is running.
	pub fn is_empty(&self) -> bool {
		self.tracker.is_empty()
	}

	/// Returns true once [`shutdown`](Self::shutdown) has been called.
	pub fn is_shutdown(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Waits for every running task to finish without cancelling them.
	pub async fn wait_idle(&self) {
		self.tracker.close();
		self.tracker.wait().await;
		self.tracker.reopen();
	}

	/// Cancels running tasks, refuses new ones, and waits for the cancelled tasks to unwind.
	pub async fn shutdown(&self) {
		self.cancel.cancel();
		self.tracker.close();
		self.tracker.wait().await;
	}
}
