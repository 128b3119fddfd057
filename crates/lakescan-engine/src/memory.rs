//! In-memory engine for testing.
//!
//! Serves a scripted sequence of batches and exposes instrumentation the
//! bridge tests assert on: how many readers were constructed, how many pulls
//! reached the engine, plus failure injection and a pull gate for
//! deterministic concurrency tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow_array::RecordBatch;
use futures::future::BoxFuture;
use lakescan_core::IoConfig;
use tokio::sync::Notify;

use crate::engine::{EngineReader, TableEngine};
use crate::error::EngineError;
use crate::runtime::RuntimeHandle;

/// Blocks a pull until released: the reader signals `entered` when a pull
/// reaches the engine, then waits for `release`.
#[derive(Default)]
pub struct PullGate {
    pub entered: Notify,
    pub release: Notify,
}

pub struct MemoryEngine {
    batches: Vec<RecordBatch>,
    open_error: Option<String>,
    read_error_after: Option<(usize, String)>,
    gate: Option<Arc<PullGate>>,
    opens: AtomicUsize,
    pulls: Arc<AtomicUsize>,
}

impl MemoryEngine {
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        Self {
            batches,
            open_error: None,
            read_error_after: None,
            gate: None,
            opens: AtomicUsize::new(0),
            pulls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every `open_reader` call fails with this diagnostic.
    pub fn with_open_error(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Pulls fail with this diagnostic after `batches` successful batches.
    pub fn with_read_error_after(mut self, batches: usize, message: impl Into<String>) -> Self {
        self.read_error_after = Some((batches, message.into()));
        self
    }

    pub fn with_gate(mut self, gate: Arc<PullGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of reader constructions that reached the engine.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of pulls that reached the engine.
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

impl TableEngine for MemoryEngine {
    fn open_reader(
        &self,
        _config: IoConfig,
        _runtime: RuntimeHandle,
    ) -> Result<Box<dyn EngineReader>, EngineError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.open_error {
            return Err(EngineError::Reader(message.clone()));
        }
        Ok(Box::new(MemoryReader {
            queue: self.batches.iter().cloned().collect(),
            served: 0,
            read_error_after: self.read_error_after.clone(),
            gate: self.gate.clone(),
            pulls: Arc::clone(&self.pulls),
        }))
    }
}

struct MemoryReader {
    queue: VecDeque<RecordBatch>,
    served: usize,
    read_error_after: Option<(usize, String)>,
    gate: Option<Arc<PullGate>>,
    pulls: Arc<AtomicUsize>,
}

impl EngineReader for MemoryReader {
    fn next_batch(&mut self) -> BoxFuture<'_, Result<Option<RecordBatch>, EngineError>> {
        Box::pin(async move {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            if let Some((after, message)) = &self.read_error_after {
                if self.served >= *after {
                    return Err(EngineError::Reader(message.clone()));
                }
            }
            match self.queue.pop_front() {
                Some(batch) => {
                    self.served += 1;
                    Ok(Some(batch))
                }
                None => Ok(None),
            }
        })
    }
}
