use thiserror::Error;

/// Engine-level failures. The dataset layer maps these into the bridge
/// taxonomy at its call sites, keeping the full diagnostic text.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid file location '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("scheme '{scheme}' requires the `{feature}` feature; rebuild with `--features lakescan-engine/{feature}`")]
    MissingFeature {
        scheme: &'static str,
        feature: &'static str,
    },

    #[error("failed to initialize async runtime: {0}")]
    Runtime(String),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Diagnostic produced by an engine implementation itself (scripted
    /// failures, internal invariants).
    #[error("{0}")]
    Reader(String),
}
