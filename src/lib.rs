//! # ruBERT Content Analyzer
//!
//! Library crate for classifying Russian-language text into five risk
//! categories (violence, hate speech, suicide-related content,
//! disinformation, neutral) with a fine-tuned BERT sequence classifier.
//!
//! ## Key Components
//!
//! - `model::ClassifierSession`: loads a pretrained checkpoint directory and
//!   runs the forward pass
//! - `analysis`: text normalization and the asynchronous analysis worker
//! - `history::HistoryStore`: append-only log of completed analyses with
//!   JSON/CSV export
//! - `session`: the interactive command loop that drives everything

pub mod analysis;
pub mod config;
pub mod error;
pub mod history;
pub mod labels;
pub mod model;
pub mod session;
