//! Reader tunables and the opaque engine IO configuration.
//!
//! `ReaderOptions` carries the execution hints a caller may tune before a
//! reader is created. `IoConfig` is the full, validated snapshot the engine
//! consumes exactly once at reader construction.

use std::sync::Arc;

use arrow_schema::SchemaRef;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_BATCH_SIZE: usize = 16;
pub const DEFAULT_THREAD_NUM: usize = 1;

/// Execution hints for one reader. Batch size and thread count are hints: the
/// engine decides actual batch boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Requested rows per decoded batch.
    pub batch_size: usize,

    /// Worker threads for the engine runtime serving this reader.
    pub thread_num: usize,

    /// Materialize partition key/value pairs as regular output columns.
    pub retain_partition_columns: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            thread_num: DEFAULT_THREAD_NUM,
            retain_partition_columns: false,
        }
    }
}

impl ReaderOptions {
    /// Create options from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LAKESCAN_BATCH_SIZE`: rows per batch
    /// - `LAKESCAN_THREAD_NUM`: engine worker threads
    /// - `LAKESCAN_RETAIN_PARTITION_COLUMNS`: `1`/`true` to retain
    pub fn from_env() -> Self {
        let mut opts = Self::default();

        if let Ok(s) = std::env::var("LAKESCAN_BATCH_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    opts.batch_size = v;
                }
            }
        }

        if let Ok(s) = std::env::var("LAKESCAN_THREAD_NUM") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    opts.thread_num = v;
                }
            }
        }

        if let Ok(s) = std::env::var("LAKESCAN_RETAIN_PARTITION_COLUMNS") {
            opts.retain_partition_columns = s == "1" || s.eq_ignore_ascii_case("true");
        }

        opts
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".into()));
        }
        if self.thread_num == 0 {
            return Err(Error::Config("thread_num must be positive".into()));
        }
        Ok(())
    }
}

/// Validated configuration snapshot consumed once by engine reader
/// construction. Obtained through [`IoConfigBuilder`].
#[derive(Debug, Clone)]
pub struct IoConfig {
    schema: SchemaRef,
    files: Vec<String>,
    primary_keys: Vec<String>,
    partitions: Vec<(String, String)>,
    object_store_options: Vec<(String, String)>,
    options: ReaderOptions,
}

impl IoConfig {
    pub fn builder() -> IoConfigBuilder {
        IoConfigBuilder::new()
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn partitions(&self) -> &[(String, String)] {
        &self.partitions
    }

    pub fn object_store_options(&self) -> &[(String, String)] {
        &self.object_store_options
    }

    pub fn batch_size(&self) -> usize {
        self.options.batch_size
    }

    pub fn thread_num(&self) -> usize {
        self.options.thread_num
    }

    pub fn retain_partition_columns(&self) -> bool {
        self.options.retain_partition_columns
    }
}

/// Builder mirroring the engine's configuration surface: files, primary keys,
/// partition pairs, and object-store options accumulate; `build` validates.
#[derive(Debug, Default)]
pub struct IoConfigBuilder {
    schema: Option<SchemaRef>,
    files: Vec<String>,
    primary_keys: Vec<String>,
    partitions: Vec<(String, String)>,
    object_store_options: Vec<(String, String)>,
    options: ReaderOptions,
}

impl IoConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn add_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    pub fn add_files(mut self, files: impl IntoIterator<Item = String>) -> Self {
        self.files.extend(files);
        self
    }

    pub fn add_primary_key(mut self, pk: impl Into<String>) -> Self {
        self.primary_keys.push(pk.into());
        self
    }

    pub fn add_primary_keys(mut self, pks: impl IntoIterator<Item = String>) -> Self {
        self.primary_keys.extend(pks);
        self
    }

    pub fn add_partition(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.partitions.push((key.into(), value.into()));
        self
    }

    /// Replaces the full set of object-store option pairs.
    pub fn with_object_store_options(mut self, options: Vec<(String, String)>) -> Self {
        self.object_store_options = options;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.options.batch_size = batch_size;
        self
    }

    pub fn with_thread_num(mut self, thread_num: usize) -> Self {
        self.options.thread_num = thread_num;
        self
    }

    pub fn with_retain_partition_columns(mut self, retain: bool) -> Self {
        self.options.retain_partition_columns = retain;
        self
    }

    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<IoConfig> {
        let schema = self
            .schema
            .ok_or_else(|| Error::Config("schema is required".into()))?;
        if schema.fields().is_empty() {
            return Err(Error::Config("schema must contain at least one field".into()));
        }
        self.options.validate()?;
        Ok(IoConfig {
            schema,
            files: self.files,
            primary_keys: self.primary_keys,
            partitions: self.partitions,
            object_store_options: self.object_store_options,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{DataType, Field, Schema};

    fn test_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]))
    }

    #[test]
    fn default_options() {
        let opts = ReaderOptions::default();
        assert_eq!(opts.batch_size, 16);
        assert_eq!(opts.thread_num, 1);
        assert!(!opts.retain_partition_columns);
    }

    #[test]
    fn options_serde_roundtrip() {
        let opts = ReaderOptions {
            batch_size: 1024,
            thread_num: 4,
            retain_partition_columns: true,
        };
        let json = serde_json::to_string(&opts).unwrap();
        let back: ReaderOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }

    #[test]
    fn options_from_env_overrides_defaults() {
        std::env::set_var("LAKESCAN_BATCH_SIZE", "256");
        std::env::set_var("LAKESCAN_RETAIN_PARTITION_COLUMNS", "true");
        let opts = ReaderOptions::from_env();
        std::env::remove_var("LAKESCAN_BATCH_SIZE");
        std::env::remove_var("LAKESCAN_RETAIN_PARTITION_COLUMNS");
        assert_eq!(opts.batch_size, 256);
        assert!(opts.retain_partition_columns);
    }

    #[test]
    fn builder_requires_schema() {
        let err = IoConfig::builder().add_file("file:///t.parquet").build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_rejects_empty_schema() {
        let schema = Arc::new(Schema::empty());
        let err = IoConfig::builder().with_schema(schema).build();
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn builder_rejects_zero_batch_size() {
        let err = IoConfig::builder()
            .with_schema(test_schema())
            .with_batch_size(0)
            .build();
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn builder_accumulates_fields() {
        let config = IoConfig::builder()
            .with_schema(test_schema())
            .add_file("file:///a.parquet")
            .add_file("file:///a.parquet")
            .add_primary_key("id")
            .add_partition("year", "2024")
            .with_object_store_options(vec![("aws_region".into(), "us-east-1".into())])
            .with_batch_size(64)
            .with_thread_num(2)
            .with_retain_partition_columns(true)
            .build()
            .unwrap();

        // Duplicate file locations are allowed; deduplication is the engine's
        // concern, not the builder's.
        assert_eq!(config.files().len(), 2);
        assert_eq!(config.schema().fields().len(), 1);
        assert_eq!(config.primary_keys(), ["id"]);
        assert_eq!(config.partitions(), [("year".to_string(), "2024".to_string())]);
        assert_eq!(config.object_store_options().len(), 1);
        assert_eq!(config.batch_size(), 64);
        assert_eq!(config.thread_num(), 2);
        assert!(config.retain_partition_columns());
    }
}
