//! Execution contexts that run credential work off the calling thread.

// self
use crate::_prelude::*;

/// Unit of work submitted to a [`CallExecutor`].
pub type CallTask = Pin<Box<dyn Future<Output = ()> + 'static + Send>>;

/// Caller-supplied execution context.
///
/// Ordering and the thread a task runs on are unspecified, but every submitted task must
/// eventually run to completion.
pub trait CallExecutor
where
	Self: Send + Sync,
{
	/// Schedules `task`; must not run it inline on the caller's thread.
	fn execute(&self, task: CallTask);
}
impl<E> CallExecutor for Arc<E>
where
	E: ?Sized + CallExecutor,
{
	fn execute(&self, task: CallTask) {
		E::execute(self, task)
	}
}

/// [`CallExecutor`] that spawns detached tasks onto a tokio runtime.
#[cfg(feature = "tokio")]
#[derive(Clone, Debug)]
pub struct TokioExecutor(tokio::runtime::Handle);
#[cfg(feature = "tokio")]
impl TokioExecutor {
	/// Wraps an explicit runtime handle.
	pub fn new(handle: tokio::runtime::Handle) -> Self {
		Self(handle)
	}

	/// Captures the runtime the caller is running on, if any.
	pub fn try_current() -> Option<Self> {
		tokio::runtime::Handle::try_current().ok().map(Self)
	}
}
#[cfg(feature = "tokio")]
impl CallExecutor for TokioExecutor {
	fn execute(&self, task: CallTask) {
		drop(self.0.spawn(task));
	}
}

#[cfg(all(test, feature = "tokio"))]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// self
	use super::*;

	#[tokio::test]
	async fn tokio_executor_runs_submitted_tasks() {
		let executor: Arc<dyn CallExecutor> =
			Arc::new(TokioExecutor::try_current().expect("Test should run inside a runtime."));
		let ran = Arc::new(AtomicBool::new(false));
		let (tx, rx) = tokio::sync::oneshot::channel();
		let flag = ran.clone();

		executor.execute(Box::pin(async move {
			flag.store(true, Ordering::SeqCst);

			let _ = tx.send(());
		}));
		rx.await.expect("Submitted task should complete.");

		assert!(ran.load(Ordering::SeqCst));
	}

	#[test]
	fn try_current_is_none_outside_a_runtime() {
		assert!(TokioExecutor::try_current().is_none());
	}
}
