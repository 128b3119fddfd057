use thiserror::Error;

/// Canonical result for the bridge layer.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid local configuration: zero batch size, empty schema, pulls
    /// issued before `start`, and similar caller mistakes.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Mutation attempted after the engine reader was created. Reported,
    /// never silently ignored.
    #[error("configuration is frozen once the reader is created: {0}")]
    ConfigurationFrozen(&'static str),

    /// The engine failed to construct a reader. The fragment that owns the
    /// reader is unusable afterward.
    #[error("engine reader initialization failed: {0}")]
    EngineInit(String),

    /// The engine failed mid-stream. Batches delivered before the failure
    /// remain valid; the stream is terminal.
    #[error("engine read failed: {0}")]
    Read(String),

    /// Two batch pulls were in flight on the same reader. The engine reader
    /// handle is not safe for overlapping pulls; the second caller fails fast.
    #[error("concurrent batch pulls on a single reader")]
    ConcurrentAccess,
}
