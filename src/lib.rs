//! lakescan: a bridge between a pull-based dataset-scan framework and an
//! asynchronous columnar storage engine reading table files from an object
//! store.
//!
//! The host framework enumerates [`TableFragment`]s, asks each for its
//! physical schema, and drains the async batch stream returned by
//! [`Fragment::scan_batches`]. Each fragment lazily owns one [`DataReader`],
//! which in turn owns the engine reader and its runtime handle.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use arrow_schema::{DataType, Field, Schema};
//! use futures::TryStreamExt;
//! use lakescan::{Fragment, ParquetScanEngine, ScanOptions, TableFragment};
//!
//! async fn scan() -> lakescan::Result<()> {
//!     let schema = Arc::new(Schema::new(vec![
//!         Field::new("id", DataType::Int64, false),
//!         Field::new("name", DataType::Utf8, true),
//!     ]));
//!     let fragment = TableFragment::new(schema, Arc::new(ParquetScanEngine::new()))?;
//!     fragment.add_file_url("file:///data/part-0.parquet")?;
//!     fragment.add_partition_key_value("year", "2024")?;
//!     fragment.set_retain_partition_columns(true)?;
//!
//!     let mut stream = fragment.scan_batches(&ScanOptions::default())?;
//!     while let Some(batch) = stream.try_next().await? {
//!         println!("{} rows", batch.num_rows());
//!     }
//!     Ok(())
//! }
//! ```

pub use lakescan_core::{Error, IoConfig, IoConfigBuilder, ReaderOptions, Result};
pub use lakescan_dataset::{
    BatchStream, DataReader, Fragment, ScanOptions, TableFragment, FRAGMENT_TYPE_NAME,
};
pub use lakescan_engine::{
    EngineError, EngineReader, MemoryEngine, ParquetScanEngine, PullGate, RuntimeHandle,
    TableEngine,
};
