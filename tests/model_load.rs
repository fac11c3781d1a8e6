use rubert_analyzer::error::AnalyzerError;
use rubert_analyzer::model::{ClassifierSession, DeviceRequest};

#[test]
fn missing_directory_reports_load_error_with_cause() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("no-such-checkpoint");

    let result = ClassifierSession::load(&missing, DeviceRequest::Cpu);
    match result {
        Err(AnalyzerError::Load(message)) => {
            assert!(
                message.contains("config.json"),
                "message should name the missing file, got: {}",
                message
            );
        }
        Err(other) => panic!("expected Load error, got: {}", other),
        Ok(_) => panic!("load must fail for a missing directory"),
    }
}

#[test]
fn directory_without_weights_reports_load_error() {
    let dir = tempfile::tempdir().expect("tempdir");

    // A config alone is not a loadable checkpoint
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"hidden_size": 8, "intermediate_size": 16, "vocab_size": 100,
            "num_hidden_layers": 1, "num_attention_heads": 2,
            "max_position_embeddings": 32, "type_vocab_size": 2,
            "hidden_act": "gelu"}"#,
    )
    .expect("write config");

    let result = ClassifierSession::load(dir.path(), DeviceRequest::Cpu);
    assert!(matches!(result, Err(AnalyzerError::Load(_))));
}
