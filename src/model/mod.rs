//! Classifier session: a loaded ruBERT sequence-classification checkpoint.
//!
//! A session owns the tokenizer, the BERT encoder with its pooler and
//! classification head, and the resolved compute device. It is read-only
//! after loading; callers serialize requests against it (one analysis in
//! flight at a time from the interactive surface).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{ops, Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use chrono::{DateTime, Utc};
use tokenizers::{
    Encoding, PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};
use tracing::info;

use crate::error::AnalyzerError;
use crate::labels::NUM_CLASSES;

/// Requested compute device, parsed from configuration or the `set device`
/// command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    Cpu,
    Cuda,
}

impl FromStr for DeviceRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(DeviceRequest::Cpu),
            "cuda" | "gpu" => Ok(DeviceRequest::Cuda),
            other => Err(format!(
                "Unknown device '{}'. Must be one of: cpu, cuda",
                other
            )),
        }
    }
}

/// Token length the encoder cache is primed with at load time.
const DEFAULT_MAX_LENGTH: usize = 512;

/// Returns a copy of `base` configured to truncate and pad every encoding
/// to exactly `max_length` tokens. Pure with respect to `base`; the result
/// encodes identically for identical input.
pub fn fixed_length_tokenizer(
    base: &Tokenizer,
    max_length: usize,
) -> Result<Tokenizer, AnalyzerError> {
    let mut tokenizer = base.clone();
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            strategy: TruncationStrategy::LongestFirst,
            direction: TruncationDirection::Right,
            stride: 0,
        }))
        .map_err(|e| AnalyzerError::Inference(format!("Tokenizer truncation setup: {}", e)))?;
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::Fixed(max_length),
        direction: PaddingDirection::Right,
        pad_to_multiple_of: None,
        pad_id: 0,
        pad_type_id: 0,
        pad_token: "[PAD]".to_string(),
    }));
    Ok(tokenizer)
}

/// Tokenizer configured for one specific max_length, rebuilt only when the
/// requested length changes.
struct EncoderCache {
    max_length: usize,
    tokenizer: Tokenizer,
}

/// A loaded classifier checkpoint ready for inference.
pub struct ClassifierSession {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    encoder: Mutex<EncoderCache>,
    device: Device,
    /// Checkpoint directory the session was loaded from
    pub path: PathBuf,
    /// When the session was loaded
    pub loaded_at: DateTime<Utc>,
}

fn load_err(context: &str, e: impl std::fmt::Display) -> AnalyzerError {
    AnalyzerError::Load(format!("{}: {}", context, e))
}

impl ClassifierSession {
    /// Loads a checkpoint directory containing `config.json`,
    /// `tokenizer.json` and either `model.safetensors` or
    /// `pytorch_model.bin`.
    ///
    /// The device is resolved here; requesting CUDA on a machine without it
    /// fails the load instead of silently falling back, so the device shown
    /// to the user is always the one actually in use.
    pub fn load(dir: &Path, device: DeviceRequest) -> Result<Self, AnalyzerError> {
        let device = match device {
            DeviceRequest::Cpu => Device::Cpu,
            DeviceRequest::Cuda => {
                Device::new_cuda(0).map_err(|e| load_err("CUDA device unavailable", e))?
            }
        };

        let config_path = dir.join("config.json");
        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| load_err(&format!("Failed to read {}", config_path.display()), e))?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| load_err(&format!("Failed to parse {}", config_path.display()), e))?;

        let tokenizer_path = dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_err(&format!("Failed to load {}", tokenizer_path.display()), e))?;

        let weights_path = if dir.join("model.safetensors").exists() {
            dir.join("model.safetensors")
        } else if dir.join("pytorch_model.bin").exists() {
            dir.join("pytorch_model.bin")
        } else {
            return Err(AnalyzerError::Load(format!(
                "No model weights found in {} (expected model.safetensors or pytorch_model.bin)",
                dir.display()
            )));
        };

        let use_pth = weights_path.extension().and_then(|s| s.to_str()) == Some("bin");
        let vb = if use_pth {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)
                .map_err(|e| load_err("Failed to read pytorch checkpoint", e))?
        } else {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path.clone()], DType::F32, &device)
                    .map_err(|e| load_err("Failed to map safetensors checkpoint", e))?
            }
        };

        // BertForSequenceClassification layout: encoder under "bert", its
        // pooler, and a flat "classifier" projection to the class logits.
        let bert = BertModel::load(vb.pp("bert"), &config)
            .map_err(|e| load_err("Incompatible BERT checkpoint", e))?;
        let pooler = candle_nn::linear(
            config.hidden_size,
            config.hidden_size,
            vb.pp("bert").pp("pooler").pp("dense"),
        )
        .map_err(|e| load_err("Missing pooler weights", e))?;
        let classifier = candle_nn::linear(config.hidden_size, NUM_CLASSES, vb.pp("classifier"))
            .map_err(|e| load_err("Missing classifier head weights", e))?;

        info!(
            "Loaded classifier checkpoint from {} ({} classes, hidden size {})",
            dir.display(),
            NUM_CLASSES,
            config.hidden_size
        );

        let encoder = Mutex::new(EncoderCache {
            max_length: DEFAULT_MAX_LENGTH,
            tokenizer: fixed_length_tokenizer(&tokenizer, DEFAULT_MAX_LENGTH)?,
        });

        Ok(Self {
            bert,
            pooler,
            classifier,
            tokenizer,
            encoder,
            device,
            path: dir.to_path_buf(),
            loaded_at: Utc::now(),
        })
    }

    /// Human-readable name of the resolved device.
    pub fn device_name(&self) -> &'static str {
        if self.device.is_cuda() {
            "CUDA"
        } else {
            "CPU"
        }
    }

    /// Encodes text to exactly `max_length` tokens, truncating or padding as
    /// needed. Deterministic for identical (text, max_length) input.
    pub fn encode(&self, text: &str, max_length: usize) -> Result<Encoding, AnalyzerError> {
        let mut cache = self
            .encoder
            .lock()
            .map_err(|e| AnalyzerError::Inference(format!("Encoder cache lock: {}", e)))?;
        if cache.max_length != max_length {
            *cache = EncoderCache {
                max_length,
                tokenizer: fixed_length_tokenizer(&self.tokenizer, max_length)?,
            };
        }

        cache
            .tokenizer
            .encode(text, true)
            .map_err(|e| AnalyzerError::Inference(format!("Tokenization failed: {}", e)))
    }

    /// Runs the forward pass for one encoded input and returns the softmax
    /// probability distribution over the five classes.
    pub fn infer(&self, encoding: &Encoding) -> Result<Vec<f32>, AnalyzerError> {
        self.infer_inner(encoding)
            .map_err(|e| AnalyzerError::Inference(e.to_string()))
    }

    fn infer_inner(&self, encoding: &Encoding) -> candle_core::Result<Vec<f32>> {
        let ids = encoding.get_ids().to_vec();
        let mask = encoding.get_attention_mask().to_vec();

        let token_ids = Tensor::new(&ids[..], &self.device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;
        let attention_mask = Tensor::new(&mask[..], &self.device)?.unsqueeze(0)?;

        let sequence_output =
            self.bert
                .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        // Standard BERT pooling: CLS token -> dense -> tanh
        let cls_token = sequence_output.i((.., 0))?;
        let pooled = self.pooler.forward(&cls_token)?.tanh()?;

        let logits = self.classifier.forward(&pooled)?;
        let probabilities = ops::softmax(&logits, 1)?.squeeze(0)?;

        probabilities.to_vec1::<f32>()
    }

    /// Convenience path: encode then infer.
    pub fn classify(&self, text: &str, max_length: usize) -> Result<Vec<f32>, AnalyzerError> {
        let encoding = self.encode(text, max_length)?;
        self.infer(&encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal word-level tokenizer, enough to exercise the fixed-length
    // encoding contract without a checkpoint.
    const TOKENIZER_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"[UNK]": 0, "[PAD]": 1, "привет": 2, "мир": 3, "a": 4},
            "unk_token": "[UNK]"
        }
    }"#;

    fn test_tokenizer() -> Tokenizer {
        Tokenizer::from_bytes(TOKENIZER_JSON.as_bytes()).expect("fixture tokenizer")
    }

    #[test]
    fn fixed_length_encoding_pads_short_input_to_exact_length() {
        let encoder = fixed_length_tokenizer(&test_tokenizer(), 128).expect("configure");

        let encoding = encoder.encode("привет мир", true).expect("encode");
        assert_eq!(encoding.get_ids().len(), 128);
        assert_eq!(encoding.get_attention_mask().len(), 128);
        // Only the two real tokens attend; padding is masked out
        let attended = encoding
            .get_attention_mask()
            .iter()
            .filter(|&&m| m == 1)
            .count();
        assert_eq!(attended, 2);
    }

    #[test]
    fn fixed_length_encoding_truncates_long_input_to_exact_length() {
        let encoder = fixed_length_tokenizer(&test_tokenizer(), 128).expect("configure");

        let long_text = "a ".repeat(500);
        let encoding = encoder.encode(long_text.as_str(), true).expect("encode");
        assert_eq!(encoding.get_ids().len(), 128);
        assert!(encoding.get_attention_mask().iter().all(|&m| m == 1));
    }

    #[test]
    fn encoding_is_deterministic_for_identical_input() {
        let encoder = fixed_length_tokenizer(&test_tokenizer(), 256).expect("configure");

        let first = encoder.encode("привет мир привет неизвестное", true).expect("encode");
        let second = encoder.encode("привет мир привет неизвестное", true).expect("encode");
        assert_eq!(first.get_ids(), second.get_ids());
        assert_eq!(first.get_attention_mask(), second.get_attention_mask());
    }

    #[test]
    fn softmax_on_known_logits_is_a_distribution() {
        let logits = Tensor::new(&[[2.0f32, 1.0, 0.1, 0.1, 0.1]], &Device::Cpu).expect("tensor");
        let probs = ops::softmax(&logits, 1)
            .expect("softmax")
            .squeeze(0)
            .expect("squeeze")
            .to_vec1::<f32>()
            .expect("vec");

        assert_eq!(probs.len(), 5);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        // exp(2)/(exp(2)+exp(1)+3*exp(0.1))
        assert!((probs[0] - 0.550_48).abs() < 1e-4);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
        assert!((probs[2] - probs[3]).abs() < 1e-6);
    }

    #[test]
    fn device_request_parsing() {
        assert_eq!("cpu".parse::<DeviceRequest>(), Ok(DeviceRequest::Cpu));
        assert_eq!("CPU".parse::<DeviceRequest>(), Ok(DeviceRequest::Cpu));
        assert_eq!("cuda".parse::<DeviceRequest>(), Ok(DeviceRequest::Cuda));
        assert_eq!("gpu".parse::<DeviceRequest>(), Ok(DeviceRequest::Cuda));
        assert!("tpu".parse::<DeviceRequest>().is_err());
    }
}
