//! Append-only log of completed analyses, with JSON and CSV export.
//!
//! Not a cache: records have no identity beyond their position and are never
//! deduplicated. The only shrink path is an explicit `clear`, and the caller
//! is responsible for confirming that with the user first.

use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::Path;

use tracing::info;

use crate::analysis::AnalysisResult;
use crate::error::AnalyzerError;
use crate::labels;

/// CSV export header: the flattened tabular form drops the probability
/// vector.
pub const CSV_HEADER: &str = "timestamp,text,class_name,confidence_percent";

/// In-memory, insertion-ordered store of analysis results.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: Vec<AnalysisResult>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a completed result to the end of the log.
    pub fn append(&mut self, result: AnalysisResult) {
        self.records.push(result);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[AnalysisResult] {
        &self.records
    }

    /// Empties the log. Confirmation is the caller's job.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Writes the full log as a pretty-printed JSON array, every field
    /// preserved. The in-memory log is never mutated by export.
    pub fn export_json(&self, path: &Path) -> Result<(), AnalyzerError> {
        let content = serde_json::to_string_pretty(&self.records)
            .map_err(|e| AnalyzerError::Io(IoError::new(ErrorKind::InvalidData, e)))?;
        fs::write(path, content)?;
        info!("Exported {} records to {}", self.records.len(), path.display());
        Ok(())
    }

    /// Writes the flattened tabular form: one header row, then timestamp,
    /// text, class name and confidence percentage per record.
    pub fn export_csv(&self, path: &Path) -> Result<(), AnalyzerError> {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for record in &self.records {
            let row = [
                csv_field(&record.timestamp),
                csv_field(&record.text),
                csv_field(labels::name(record.class_id)),
                csv_field(&format!("{:.2}%", record.confidence * 100.0)),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }
        fs::write(path, out)?;
        info!("Exported {} records to {}", self.records.len(), path.display());
        Ok(())
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(class_id: usize, text: &str) -> AnalysisResult {
        let mut probabilities = vec![0.0f32; 5];
        probabilities[class_id] = 1.0;
        AnalysisResult {
            class_id,
            confidence: 1.0,
            probabilities,
            text: text.to_string(),
            processed_text: text.to_string(),
            timestamp: "2025-01-01 12:00:00".to_string(),
        }
    }

    #[test]
    fn append_and_clear() {
        let mut store = HistoryStore::new();
        assert!(store.is_empty());

        store.append(record(0, "a"));
        store.append(record(1, "b"));
        store.append(record(4, "c"));
        assert_eq!(store.len(), 3);
        assert_eq!(store.records()[0].text, "a");
        assert_eq!(store.records()[2].text, "c");

        store.clear();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }
}
