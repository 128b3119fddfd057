//! Reference engine: streams Arrow record batches out of Parquet files in an
//! object store.
//!
//! `open_reader` spawns a driver task on the reader's runtime. The driver
//! walks the configured file locations in order, opens each through the async
//! parquet reader with the configured batch-size hint, and forwards batches
//! through a bounded channel. The pull side simply receives; dropping the
//! reader closes the channel and the driver exits on its next send.
//!
//! Primary keys and partition pairs are carried in the configuration but not
//! interpreted here: merge-on-read, predicate pushdown, and projection are
//! the real engine's business. Partition columns are materialized by the
//! dataset layer.

use arrow_array::RecordBatch;
use futures::future::BoxFuture;
use futures::StreamExt;
use lakescan_core::IoConfig;
use parquet::arrow::async_reader::{ParquetObjectReader, ParquetRecordBatchStreamBuilder};
use tokio::sync::mpsc;

use crate::engine::{EngineReader, TableEngine};
use crate::error::EngineError;
use crate::runtime::RuntimeHandle;
use crate::store::{parse_location, resolve_store};

#[derive(Debug, Default)]
pub struct ParquetScanEngine;

impl ParquetScanEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TableEngine for ParquetScanEngine {
    fn open_reader(
        &self,
        config: IoConfig,
        runtime: RuntimeHandle,
    ) -> Result<Box<dyn EngineReader>, EngineError> {
        // Bounded prefetch: decode stays at most one batch ahead of the consumer.
        let (tx, rx) = mpsc::channel(2);
        runtime.spawn(drive(config, tx));
        Ok(Box::new(ParquetStreamReader {
            rx,
            _runtime: runtime,
        }))
    }
}

struct ParquetStreamReader {
    rx: mpsc::Receiver<Result<RecordBatch, EngineError>>,
    // Keeps the runtime alive for as long as batches may still be pulled.
    _runtime: RuntimeHandle,
}

impl EngineReader for ParquetStreamReader {
    fn next_batch(&mut self) -> BoxFuture<'_, Result<Option<RecordBatch>, EngineError>> {
        Box::pin(async move {
            match self.rx.recv().await {
                Some(Ok(batch)) => Ok(Some(batch)),
                Some(Err(e)) => Err(e),
                None => Ok(None),
            }
        })
    }
}

async fn drive(config: IoConfig, tx: mpsc::Sender<Result<RecordBatch, EngineError>>) {
    let batch_size = config.batch_size();
    for location in config.files() {
        tracing::debug!(%location, batch_size, "opening parquet file");
        match scan_file(location, config.object_store_options(), batch_size, &tx).await {
            Ok(true) => {}
            // Receiver dropped; the reader was abandoned mid-stream.
            Ok(false) => return,
            Err(e) => {
                tracing::warn!(%location, error = %e, "parquet scan failed");
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
}

/// Returns `Ok(false)` once the pull side has gone away.
async fn scan_file(
    location: &str,
    store_options: &[(String, String)],
    batch_size: usize,
    tx: &mpsc::Sender<Result<RecordBatch, EngineError>>,
) -> Result<bool, EngineError> {
    let url = parse_location(location)?;
    let (store, path) = resolve_store(&url, store_options)?;
    let meta = store.head(&path).await?;
    let reader = ParquetObjectReader::new(store, meta);
    let mut stream = ParquetRecordBatchStreamBuilder::new(reader)
        .await?
        .with_batch_size(batch_size)
        .build()?;

    while let Some(item) = stream.next().await {
        let batch = item?;
        if tx.send(Ok(batch)).await.is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}
