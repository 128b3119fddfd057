//! The batch reader: owns one engine reader plus its runtime handle and
//! exposes serialized asynchronous batch pulls.
//!
//! Lifecycle: configuration accumulates until [`DataReader::start`], which
//! builds the engine configuration, acquires the runtime, and opens the
//! engine reader exactly once. From that point the configuration is frozen;
//! setters fail with `ConfigurationFrozen`. `finished` transitions false→true
//! once and is never reset; pulls after that resolve immediately without
//! contacting the engine. A mid-stream read error is terminal the same way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

use lakescan_core::{Error, IoConfig, ReaderOptions, Result};
use lakescan_engine::{EngineReader, RuntimeHandle, TableEngine};

use crate::partition::append_partition_columns;

pub struct DataReader {
    engine: Arc<dyn TableEngine>,
    schema: SchemaRef,
    state: Mutex<ReaderState>,
    finished: AtomicBool,
    in_flight: AtomicBool,
}

struct ReaderState {
    files: Vec<String>,
    primary_keys: Vec<String>,
    partitions: Vec<(String, String)>,
    object_store_options: Vec<(String, String)>,
    options: ReaderOptions,
    runtime: Option<RuntimeHandle>,
    engine_reader: Option<Box<dyn EngineReader>>,
    started: bool,
}

/// Resets the pull-in-flight flag when a pull completes or unwinds.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DataReader {
    pub fn new(
        engine: Arc<dyn TableEngine>,
        schema: SchemaRef,
        files: Vec<String>,
        primary_keys: Vec<String>,
        partitions: Vec<(String, String)>,
    ) -> Result<Self> {
        if schema.fields().is_empty() {
            return Err(Error::Config("schema must contain at least one field".into()));
        }
        Ok(Self {
            engine,
            schema,
            state: Mutex::new(ReaderState {
                files,
                primary_keys,
                partitions,
                object_store_options: Vec::new(),
                options: ReaderOptions::default(),
                runtime: None,
                engine_reader: None,
                started: false,
            }),
            finished: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn batch_size(&self) -> usize {
        self.state.lock().unwrap().options.batch_size
    }

    pub fn set_batch_size(&self, batch_size: usize) -> Result<()> {
        if batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".into()));
        }
        let mut state = self.state.lock().unwrap();
        if state.started {
            return Err(Error::ConfigurationFrozen("batch_size"));
        }
        state.options.batch_size = batch_size;
        Ok(())
    }

    pub fn thread_num(&self) -> usize {
        self.state.lock().unwrap().options.thread_num
    }

    pub fn set_thread_num(&self, thread_num: usize) -> Result<()> {
        if thread_num == 0 {
            return Err(Error::Config("thread_num must be positive".into()));
        }
        let mut state = self.state.lock().unwrap();
        if state.started {
            return Err(Error::ConfigurationFrozen("thread_num"));
        }
        state.options.thread_num = thread_num;
        Ok(())
    }

    pub fn retain_partition_columns(&self) -> bool {
        self.state.lock().unwrap().options.retain_partition_columns
    }

    pub fn set_retain_partition_columns(&self, retain: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.started {
            return Err(Error::ConfigurationFrozen("retain_partition_columns"));
        }
        state.options.retain_partition_columns = retain;
        Ok(())
    }

    /// Replaces the full set of object-store option pairs.
    pub fn set_object_store_options(&self, options: Vec<(String, String)>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.started {
            return Err(Error::ConfigurationFrozen("object_store_options"));
        }
        state.object_store_options = options;
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().unwrap().started
    }

    /// Handle to the runtime serving this reader; `None` until started.
    pub fn runtime(&self) -> Option<RuntimeHandle> {
        self.state.lock().unwrap().runtime.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Idempotent: the first call builds the engine configuration, acquires
    /// the runtime, and opens the engine reader; later calls are no-ops.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.started {
            return Ok(());
        }

        let mut builder = IoConfig::builder()
            .with_schema(Arc::clone(&self.schema))
            .add_files(state.files.iter().cloned())
            .add_primary_keys(state.primary_keys.iter().cloned())
            .with_object_store_options(state.object_store_options.clone())
            .with_options(state.options.clone());
        for (key, value) in &state.partitions {
            builder = builder.add_partition(key.clone(), value.clone());
        }
        let config = builder.build()?;

        let runtime = RuntimeHandle::new(state.options.thread_num)
            .map_err(|e| Error::EngineInit(e.to_string()))?;
        let reader = self
            .engine
            .open_reader(config, runtime.clone())
            .map_err(|e| Error::EngineInit(e.to_string()))?;

        state.runtime = Some(runtime);
        state.engine_reader = Some(reader);
        state.started = true;
        tracing::debug!(
            files = state.files.len(),
            batch_size = state.options.batch_size,
            thread_num = state.options.thread_num,
            "engine reader started"
        );
        Ok(())
    }

    /// Pull the next batch. Resolves to `Ok(None)` once the stream is
    /// exhausted; a second pull issued while one is in flight fails fast with
    /// `ConcurrentAccess`.
    pub async fn read_batch(&self) -> Result<Option<RecordBatch>> {
        if self.finished.load(Ordering::Acquire) {
            return Ok(None);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::ConcurrentAccess);
        }
        let guard = InFlightGuard(&self.in_flight);

        let (mut reader, retain, partitions) = {
            let mut state = self.state.lock().unwrap();
            if !state.started {
                return Err(Error::Config("read_batch called before start".into()));
            }
            let reader = state.engine_reader.take().ok_or(Error::ConcurrentAccess)?;
            (
                reader,
                state.options.retain_partition_columns,
                state.partitions.clone(),
            )
        };

        // The engine reader is checked out for the duration of the pull; the
        // state lock is not held across the await.
        let pulled = reader.next_batch().await;
        self.state.lock().unwrap().engine_reader = Some(reader);
        drop(guard);

        match pulled {
            Ok(Some(batch)) => {
                if retain && !partitions.is_empty() {
                    Ok(Some(append_partition_columns(&batch, &partitions)?))
                } else {
                    Ok(Some(batch))
                }
            }
            Ok(None) => {
                self.finished.store(true, Ordering::Release);
                tracing::debug!("engine signaled end of stream");
                Ok(None)
            }
            Err(e) => {
                self.finished.store(true, Ordering::Release);
                tracing::warn!(error = %e, "engine read failed");
                Err(Error::Read(e.to_string()))
            }
        }
    }
}
