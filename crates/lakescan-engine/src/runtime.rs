//! Async runtime handle crossing the engine boundary.
//!
//! Each handle owns a dedicated multi-thread tokio runtime sized by the
//! reader's thread count. Handles are cheap to clone; the runtime is released
//! when the last clone drops. Release uses `shutdown_background` so a reader
//! abandoned inside an async context tears down without blocking.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::error::EngineError;

#[derive(Clone)]
pub struct RuntimeHandle {
    core: Arc<RuntimeCore>,
}

struct RuntimeCore {
    runtime: Option<Runtime>,
}

impl RuntimeHandle {
    /// Acquire a runtime with `thread_num` worker threads.
    pub fn new(thread_num: usize) -> Result<Self, EngineError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(thread_num.max(1))
            .thread_name("lakescan-io")
            .enable_all()
            .build()
            .map_err(|e| EngineError::Runtime(e.to_string()))?;
        Ok(Self {
            core: Arc::new(RuntimeCore {
                runtime: Some(runtime),
            }),
        })
    }

    /// Spawn engine work onto this runtime.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.core
            .runtime
            .as_ref()
            .expect("runtime is only taken in drop")
            .spawn(future)
    }
}

impl Drop for RuntimeCore {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
