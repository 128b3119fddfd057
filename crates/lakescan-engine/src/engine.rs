//! The interface every native storage engine implements.
//!
//! Reader construction consumes an [`IoConfig`] exactly once together with a
//! [`RuntimeHandle`] and returns `Result<Box<dyn EngineReader>, EngineError>`
//! — a sum type, never a nullable handle plus a separate error code.

use arrow_array::RecordBatch;
use futures::future::BoxFuture;
use lakescan_core::IoConfig;

use crate::error::EngineError;
use crate::runtime::RuntimeHandle;

pub trait TableEngine: Send + Sync {
    /// Construct a reader for one scan unit. The configuration is consumed
    /// here; the returned reader is exclusively owned by the caller.
    fn open_reader(
        &self,
        config: IoConfig,
        runtime: RuntimeHandle,
    ) -> Result<Box<dyn EngineReader>, EngineError>;
}

pub trait EngineReader: Send {
    /// Pull the next decoded batch.
    ///
    /// Resolves to `Ok(Some(batch))`, `Ok(None)` once the stream is
    /// exhausted, or `Err` with the engine diagnostic. Not safe for
    /// overlapping calls; the dataset layer serializes pulls.
    fn next_batch(&mut self) -> BoxFuture<'_, Result<Option<RecordBatch>, EngineError>>;
}
