//! Asynchronous analysis worker.
//!
//! One request runs at a time from the interactive surface; the worker
//! executes on a blocking thread so the surface's event loop never stalls
//! during tokenization or the forward pass. Lifecycle: zero or more
//! `Progress` events, then exactly one of `Finished` or `Failed`.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::preprocess::normalize;
use super::{AnalysisResult, TIMESTAMP_FORMAT};
use crate::model::ClassifierSession;

/// One analysis request. Owned exclusively by the worker executing it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Raw input text
    pub text: String,
    /// Token length the encoder pads/truncates to
    pub max_length: usize,
}

/// Lifecycle events delivered to the caller.
#[derive(Debug)]
pub enum AnalysisEvent {
    /// Pipeline checkpoint, 0-100
    Progress(u8),
    /// The single success event, carrying the completed record
    Finished(AnalysisResult),
    /// The single failure event, carrying a human-readable message
    Failed(String),
}

/// Submits a request against a loaded session and returns the event stream.
///
/// The receiver yields progress checkpoints at 25/50/75/100 and then exactly
/// one terminal event. Errors anywhere in the pipeline collapse into a
/// single `Failed` message; no partial result is emitted and nothing is
/// retried. The session is only read, never mutated.
pub fn submit(
    session: Arc<ClassifierSession>,
    request: AnalysisRequest,
) -> mpsc::Receiver<AnalysisEvent> {
    let (tx, rx) = mpsc::channel(8);

    tokio::task::spawn_blocking(move || {
        // The receiver may be dropped mid-run; sends after that are no-ops.
        let emit = |event: AnalysisEvent| {
            let _ = tx.blocking_send(event);
        };

        emit(AnalysisEvent::Progress(25));
        let processed_text = normalize(&request.text);

        emit(AnalysisEvent::Progress(50));
        let encoding = match session.encode(&processed_text, request.max_length) {
            Ok(enc) => enc,
            Err(e) => {
                error!("Analysis failed during tokenization: {}", e);
                emit(AnalysisEvent::Failed(e.to_string()));
                return;
            }
        };

        emit(AnalysisEvent::Progress(75));
        let probabilities = match session.infer(&encoding) {
            Ok(probs) => probs,
            Err(e) => {
                error!("Analysis failed during inference: {}", e);
                emit(AnalysisEvent::Failed(e.to_string()));
                return;
            }
        };

        emit(AnalysisEvent::Progress(100));
        let result = build_result(&request.text, processed_text, probabilities);
        debug!(
            "Analysis finished: class {} at {:.4}",
            result.class_id, result.confidence
        );
        emit(AnalysisEvent::Finished(result));
    });

    rx
}

/// Selects the predicted class from a probability distribution.
///
/// Ties on the exact maximum keep the lowest class id (first-index-wins),
/// which keeps repeated runs deterministic.
pub fn decode(probabilities: &[f32]) -> (usize, f32) {
    if probabilities.is_empty() {
        return (0, 0.0);
    }
    let mut best = 0;
    for (idx, &p) in probabilities.iter().enumerate() {
        if p > probabilities[best] {
            best = idx;
        }
    }
    (best, probabilities[best])
}

/// Packages a completed pipeline run into an immutable record.
fn build_result(text: &str, processed_text: String, probabilities: Vec<f32>) -> AnalysisResult {
    let (class_id, confidence) = decode(&probabilities);
    AnalysisResult {
        class_id,
        confidence,
        probabilities,
        text: text.to_string(),
        processed_text,
        timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
    }
}
