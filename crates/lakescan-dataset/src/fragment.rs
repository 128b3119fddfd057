//! The fragment adapter: one schedulable scan unit as seen by the host
//! framework.
//!
//! A fragment accumulates per-file identity (file locations, primary keys,
//! partition pairs) and execution hints until its batch reader is created,
//! then freezes. The reader lives in a construct-on-first-use slot and is
//! never re-constructed; a failed initialization is sticky and poisons the
//! fragment, per the `Unconfigured → Configured → Started → {Finished |
//! Failed}` state machine.

use std::sync::{Arc, Mutex};

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use futures::stream::BoxStream;
use futures::StreamExt;
use once_cell::sync::OnceCell;

use lakescan_core::{Error, ReaderOptions, Result};
use lakescan_engine::TableEngine;

use crate::reader::DataReader;

/// Static descriptor identifying this adapter kind to the host framework.
pub const FRAGMENT_TYPE_NAME: &str = "lakescan_fragment";

/// The lazy, finite batch sequence handed to the host framework.
pub type BatchStream = BoxStream<'static, Result<RecordBatch>>;

/// Per-scan hints from the host framework. Applied to the reader
/// configuration only if the reader has not been created yet; otherwise the
/// frozen configuration wins and the hints are ignored.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub batch_size: Option<usize>,
    pub thread_num: Option<usize>,
}

/// Host framework contract: what the scan planner needs from any fragment.
pub trait Fragment: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn read_physical_schema(&self) -> Result<SchemaRef>;

    /// Produce a lazy, finite sequence of batches. Restartable per call, but
    /// not concurrently: overlapping streams on one fragment contend on the
    /// single reader and the loser fails fast.
    fn scan_batches(&self, options: &ScanOptions) -> Result<BatchStream>;
}

pub struct TableFragment {
    schema: SchemaRef,
    engine: Arc<dyn TableEngine>,
    config: Mutex<FragmentConfig>,
    reader: OnceCell<Arc<DataReader>>,
    init_error: Mutex<Option<String>>,
}

#[derive(Clone, Default)]
struct FragmentConfig {
    files: Vec<String>,
    primary_keys: Vec<String>,
    partitions: Vec<(String, String)>,
    object_store_options: Vec<(String, String)>,
    options: ReaderOptions,
}

impl TableFragment {
    pub fn new(schema: SchemaRef, engine: Arc<dyn TableEngine>) -> Result<Self> {
        Self::with_options(schema, engine, ReaderOptions::default())
    }

    pub fn with_options(
        schema: SchemaRef,
        engine: Arc<dyn TableEngine>,
        options: ReaderOptions,
    ) -> Result<Self> {
        if schema.fields().is_empty() {
            return Err(Error::Config("schema must contain at least one field".into()));
        }
        options.validate()?;
        Ok(Self {
            schema,
            engine,
            config: Mutex::new(FragmentConfig {
                options,
                ..FragmentConfig::default()
            }),
            reader: OnceCell::new(),
            init_error: Mutex::new(None),
        })
    }

    fn ensure_mutable(&self, field: &'static str) -> Result<()> {
        if self.reader.get().is_some() {
            return Err(Error::ConfigurationFrozen(field));
        }
        Ok(())
    }

    pub fn add_file_url(&self, url: impl Into<String>) -> Result<()> {
        self.ensure_mutable("files")?;
        self.config.lock().unwrap().files.push(url.into());
        Ok(())
    }

    pub fn add_file_urls(&self, urls: impl IntoIterator<Item = String>) -> Result<()> {
        self.ensure_mutable("files")?;
        self.config.lock().unwrap().files.extend(urls);
        Ok(())
    }

    pub fn add_primary_key(&self, pk: impl Into<String>) -> Result<()> {
        self.ensure_mutable("primary_keys")?;
        self.config.lock().unwrap().primary_keys.push(pk.into());
        Ok(())
    }

    pub fn add_primary_keys(&self, pks: impl IntoIterator<Item = String>) -> Result<()> {
        self.ensure_mutable("primary_keys")?;
        self.config.lock().unwrap().primary_keys.extend(pks);
        Ok(())
    }

    pub fn add_partition_key_value(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.ensure_mutable("partitions")?;
        self.config
            .lock()
            .unwrap()
            .partitions
            .push((key.into(), value.into()));
        Ok(())
    }

    pub fn add_partition_key_values(
        &self,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<()> {
        self.ensure_mutable("partitions")?;
        self.config.lock().unwrap().partitions.extend(pairs);
        Ok(())
    }

    pub fn batch_size(&self) -> usize {
        self.config.lock().unwrap().options.batch_size
    }

    pub fn set_batch_size(&self, batch_size: usize) -> Result<()> {
        if batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".into()));
        }
        self.ensure_mutable("batch_size")?;
        self.config.lock().unwrap().options.batch_size = batch_size;
        Ok(())
    }

    pub fn thread_num(&self) -> usize {
        self.config.lock().unwrap().options.thread_num
    }

    pub fn set_thread_num(&self, thread_num: usize) -> Result<()> {
        if thread_num == 0 {
            return Err(Error::Config("thread_num must be positive".into()));
        }
        self.ensure_mutable("thread_num")?;
        self.config.lock().unwrap().options.thread_num = thread_num;
        Ok(())
    }

    pub fn set_retain_partition_columns(&self, retain: bool) -> Result<()> {
        self.ensure_mutable("retain_partition_columns")?;
        self.config.lock().unwrap().options.retain_partition_columns = retain;
        Ok(())
    }

    /// Replaces the full set of object-store option pairs.
    pub fn set_object_store_options(&self, options: Vec<(String, String)>) -> Result<()> {
        self.ensure_mutable("object_store_options")?;
        self.config.lock().unwrap().object_store_options = options;
        Ok(())
    }

    /// Idempotent: the first call builds and starts the owned batch reader
    /// from the accumulated configuration. An `EngineInit` failure is
    /// recorded and returned unchanged on every later call without contacting
    /// the engine again.
    pub fn create_data_reader(&self) -> Result<Arc<DataReader>> {
        if let Some(message) = self.init_error.lock().unwrap().clone() {
            return Err(Error::EngineInit(message));
        }

        let created = self.reader.get_or_try_init(|| {
            let config = self.config.lock().unwrap().clone();
            let reader = DataReader::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.schema),
                config.files,
                config.primary_keys,
                config.partitions,
            )?;
            reader.set_batch_size(config.options.batch_size)?;
            reader.set_thread_num(config.options.thread_num)?;
            reader.set_retain_partition_columns(config.options.retain_partition_columns)?;
            reader.set_object_store_options(config.object_store_options)?;
            reader.start()?;
            Ok(Arc::new(reader))
        });

        match created {
            Ok(reader) => Ok(Arc::clone(reader)),
            Err(e) => {
                if let Error::EngineInit(message) = &e {
                    *self.init_error.lock().unwrap() = Some(message.clone());
                }
                Err(e)
            }
        }
    }
}

impl Fragment for TableFragment {
    fn type_name(&self) -> &'static str {
        FRAGMENT_TYPE_NAME
    }

    fn read_physical_schema(&self) -> Result<SchemaRef> {
        if let Some(message) = self.init_error.lock().unwrap().clone() {
            return Err(Error::EngineInit(message));
        }
        Ok(Arc::clone(&self.schema))
    }

    fn scan_batches(&self, options: &ScanOptions) -> Result<BatchStream> {
        if self.reader.get().is_none() {
            if let Some(batch_size) = options.batch_size {
                self.set_batch_size(batch_size)?;
            }
            if let Some(thread_num) = options.thread_num {
                self.set_thread_num(thread_num)?;
            }
        }

        let reader = self.create_data_reader()?;
        let stream = futures::stream::try_unfold(reader, |reader| async move {
            match reader.read_batch().await {
                Ok(Some(batch)) => Ok(Some((batch, reader))),
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            }
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Int64Array;
    use arrow_schema::{DataType, Field, Schema};
    use lakescan_engine::MemoryEngine;

    fn test_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]))
    }

    fn batch(values: &[i64]) -> RecordBatch {
        RecordBatch::try_new(
            test_schema(),
            vec![Arc::new(Int64Array::from(values.to_vec()))],
        )
        .unwrap()
    }

    #[test]
    fn options_seed_the_reader_defaults() {
        let engine = Arc::new(MemoryEngine::new(vec![]));
        let options = ReaderOptions {
            batch_size: 128,
            thread_num: 2,
            retain_partition_columns: false,
        };
        let fragment = TableFragment::with_options(test_schema(), engine, options).unwrap();
        assert_eq!(fragment.batch_size(), 128);
        assert_eq!(fragment.thread_num(), 2);
    }

    #[test]
    fn requires_nonempty_schema() {
        let engine = Arc::new(MemoryEngine::new(vec![]));
        let err = TableFragment::new(Arc::new(Schema::empty()), engine);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn type_name_is_static() {
        let engine = Arc::new(MemoryEngine::new(vec![]));
        let fragment = TableFragment::new(test_schema(), engine).unwrap();
        assert_eq!(fragment.type_name(), "lakescan_fragment");
    }

    #[test]
    fn physical_schema_is_the_constructor_schema() {
        let engine = Arc::new(MemoryEngine::new(vec![]));
        let fragment = TableFragment::new(test_schema(), engine).unwrap();
        let schema = fragment.read_physical_schema().unwrap();
        assert_eq!(schema, test_schema());
    }

    #[test]
    fn create_is_idempotent() {
        let engine = Arc::new(MemoryEngine::new(vec![batch(&[1])]));
        let fragment = TableFragment::new(test_schema(), engine.clone()).unwrap();
        let first = fragment.create_data_reader().unwrap();
        let second = fragment.create_data_reader().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.opens(), 1);
    }

    #[test]
    fn configuration_freezes_once_reader_exists() {
        let engine = Arc::new(MemoryEngine::new(vec![]));
        let fragment = TableFragment::new(test_schema(), engine).unwrap();
        fragment.add_file_url("file:///a.parquet").unwrap();
        fragment.set_batch_size(32).unwrap();
        fragment.create_data_reader().unwrap();

        assert!(matches!(
            fragment.add_file_url("file:///b.parquet"),
            Err(Error::ConfigurationFrozen("files"))
        ));
        assert!(matches!(
            fragment.add_primary_key("id"),
            Err(Error::ConfigurationFrozen("primary_keys"))
        ));
        assert!(matches!(
            fragment.add_partition_key_value("year", "2024"),
            Err(Error::ConfigurationFrozen("partitions"))
        ));
        assert!(matches!(
            fragment.set_batch_size(64),
            Err(Error::ConfigurationFrozen("batch_size"))
        ));
        assert!(matches!(
            fragment.set_object_store_options(vec![]),
            Err(Error::ConfigurationFrozen("object_store_options"))
        ));
        assert_eq!(fragment.batch_size(), 32);
    }

    #[test]
    fn init_failure_is_sticky_and_poisons_the_fragment() {
        let engine = Arc::new(MemoryEngine::new(vec![]).with_open_error("no such table"));
        let fragment = TableFragment::new(test_schema(), engine.clone()).unwrap();

        let first = fragment.create_data_reader().err().unwrap();
        assert!(matches!(first, Error::EngineInit(_)));
        assert!(first.to_string().contains("no such table"));

        // Later calls return the recorded error without another engine call.
        let second = fragment.create_data_reader().err().unwrap();
        assert!(second.to_string().contains("no such table"));
        assert_eq!(engine.opens(), 1);

        assert!(fragment.read_physical_schema().is_err());
        assert!(fragment.scan_batches(&ScanOptions::default()).is_err());
    }

    #[test]
    fn duplicate_file_urls_are_accepted() {
        let engine = Arc::new(MemoryEngine::new(vec![]));
        let fragment = TableFragment::new(test_schema(), engine).unwrap();
        fragment.add_file_url("file:///a.parquet").unwrap();
        fragment
            .add_file_urls(vec![
                "file:///a.parquet".to_string(),
                "file:///b.parquet".to_string(),
            ])
            .unwrap();
        fragment
            .add_primary_keys(vec!["id".to_string()])
            .unwrap();
        fragment
            .add_partition_key_values(vec![("year".to_string(), "2024".to_string())])
            .unwrap();
        fragment.create_data_reader().unwrap();
    }
}
