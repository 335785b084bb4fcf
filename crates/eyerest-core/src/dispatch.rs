//! Fire-and-forget task dispatch.
//!
//! Side effects triggered by the clock (ramps, speech, alarm) are spawned
//! here and never joined. Dispatching never blocks the caller.

use std::future::Future;

use tokio::runtime::Handle;

#[derive(Debug, Clone)]
pub struct TaskDispatcher {
    runtime: Handle,
}

impl TaskDispatcher {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Dispatcher bound to the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Spawn an async side effect.
    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::trace!(task = label, "dispatching");
        drop(self.runtime.spawn(task));
    }

    /// Run a synchronous, possibly blocking side effect on the blocking pool.
    pub fn spawn_blocking<F>(&self, label: &'static str, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        tracing::trace!(task = label, "dispatching blocking");
        drop(self.runtime.spawn_blocking(task));
    }
}
