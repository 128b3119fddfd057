//! Engine-facing half of the lakescan bridge.
//!
//! Defines the interface every native storage engine implements
//! ([`engine::TableEngine`] / [`engine::EngineReader`]), the shared async
//! runtime handle with explicit acquire/release lifecycle, and two engine
//! implementations:
//!
//! - [`parquet::ParquetScanEngine`]: streams Arrow record batches from
//!   Parquet files in an object store.
//! - [`memory::MemoryEngine`]: scripted in-memory engine for tests.

pub mod engine;
pub mod error;
pub mod memory;
pub mod parquet;
pub mod runtime;
pub mod store;

pub use engine::{EngineReader, TableEngine};
pub use error::EngineError;
pub use memory::{MemoryEngine, PullGate};
pub use parquet::ParquetScanEngine;
pub use runtime::RuntimeHandle;
