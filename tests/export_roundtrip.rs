use rubert_analyzer::analysis::AnalysisResult;
use rubert_analyzer::history::{HistoryStore, CSV_HEADER};

fn sample(class_id: usize, text: &str, confidence: f32) -> AnalysisResult {
    let mut probabilities = vec![0.0f32; 5];
    probabilities[class_id] = confidence;
    let spread = (1.0 - confidence) / 4.0;
    for (idx, p) in probabilities.iter_mut().enumerate() {
        if idx != class_id {
            *p = spread;
        }
    }
    AnalysisResult {
        class_id,
        confidence,
        probabilities,
        text: text.to_string(),
        processed_text: text.to_string(),
        timestamp: "2025-06-01 10:30:00".to_string(),
    }
}

#[test]
fn json_export_round_trips_field_for_field() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("history.json");

    let mut store = HistoryStore::new();
    store.append(sample(0, "угроза", 0.91));
    store.append(sample(4, "обычное сообщение", 0.85));
    store.append(sample(3, "текст, с запятой", 0.55));

    store.export_json(&path).expect("export");
    assert_eq!(store.len(), 3, "export must not mutate the store");

    let content = std::fs::read_to_string(&path).expect("read back");
    let parsed: Vec<AnalysisResult> = serde_json::from_str(&content).expect("parse");
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed, store.records().to_vec());
}

#[test]
fn clear_then_export_yields_empty_array() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("history.json");

    let mut store = HistoryStore::new();
    store.append(sample(1, "a", 0.8));
    store.append(sample(2, "b", 0.8));
    store.append(sample(3, "c", 0.8));
    store.clear();
    assert_eq!(store.len(), 0);

    store.export_json(&path).expect("export");
    let parsed: Vec<AnalysisResult> =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read back")).expect("parse");
    assert!(parsed.is_empty());
}

#[test]
fn csv_export_has_header_and_flattened_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("history.csv");

    let mut store = HistoryStore::new();
    store.append(sample(0, "привет", 0.9));
    store.append(sample(4, "текст, с запятой", 0.755));

    store.export_csv(&path).expect("export");

    let content = std::fs::read_to_string(&path).expect("read back");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], "2025-06-01 10:30:00,привет,Насилие,90.00%");
    // Comma-bearing text must be quoted; probabilities are dropped entirely
    assert_eq!(
        lines[2],
        "2025-06-01 10:30:00,\"текст, с запятой\",Нейтральный,75.50%"
    );
    assert!(!content.contains("probabilities"));
}

#[test]
fn single_result_save_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("result.json");

    let result = sample(2, "тревожное сообщение", 0.88);
    result.save_json(&path).expect("save");

    let parsed: AnalysisResult =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read back")).expect("parse");
    assert_eq!(parsed, result);
}

#[test]
fn export_to_unwritable_destination_is_an_io_error() {
    let mut store = HistoryStore::new();
    store.append(sample(0, "x", 0.9));

    let result = store.export_json(std::path::Path::new("/nonexistent-dir/out.json"));
    assert!(matches!(
        result,
        Err(rubert_analyzer::error::AnalyzerError::Io(_))
    ));
    // In-memory state unaffected by a failed export
    assert_eq!(store.len(), 1);
}
