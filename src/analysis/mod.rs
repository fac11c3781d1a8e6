//! # Analysis Module
//!
//! Text normalization and the asynchronous analysis worker. The pipeline is
//! deliberately small: normalize the text, tokenize it to a fixed length,
//! run the forward pass, softmax, argmax, package the record. The worker
//! runs it off the interactive loop's thread and reports lifecycle events
//! over a channel.

use std::io::{Error as IoError, ErrorKind};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;

pub mod preprocess;
pub mod worker;

pub use worker::{decode, submit, AnalysisEvent, AnalysisRequest};

/// Timestamp format used in result records and exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A completed analysis. Produced exactly once per successful request and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Predicted class identifier (0-4)
    pub class_id: usize,
    /// Softmax probability of the predicted class
    pub confidence: f32,
    /// Full probability distribution over the five classes
    pub probabilities: Vec<f32>,
    /// Original input text
    pub text: String,
    /// Normalized text the model actually saw
    pub processed_text: String,
    /// Completion time, formatted with [`TIMESTAMP_FORMAT`]
    pub timestamp: String,
}

impl AnalysisResult {
    /// Writes this single record as pretty-printed JSON, the same shape as
    /// one element of the history export. The record itself is unaffected
    /// by a failed write.
    pub fn save_json(&self, path: &Path) -> Result<(), AnalyzerError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AnalyzerError::Io(IoError::new(ErrorKind::InvalidData, e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
