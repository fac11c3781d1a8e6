use thiserror::Error;

/// Error taxonomy for the analyzer.
///
/// Every failure is terminal for the operation that raised it and carries a
/// human-readable message; nothing is retried automatically.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A model checkpoint or input file could not be loaded. The message
    /// includes the underlying cause.
    #[error("load failed: {0}")]
    Load(String),

    /// The analysis pipeline failed somewhere between tokenization and
    /// decoding. No partial result is produced.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Export or save failure. In-memory state is unaffected.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
