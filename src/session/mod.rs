//! Interactive command loop driving the analyzer.
//!
//! The loop owns the mutable state: the currently loaded session, the
//! history log and the runtime-tunable settings. One analysis runs at a
//! time; the loop waits on the worker's event stream before presenting the
//! next prompt, which is what serializes requests against the shared model.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::DefaultEditor;
use tracing::{info, warn};

use crate::analysis::{worker, AnalysisEvent, AnalysisRequest, AnalysisResult};
use crate::config::{self, Settings};
use crate::error::AnalyzerError;
use crate::history::HistoryStore;
use crate::model::{ClassifierSession, DeviceRequest};

mod display;

struct SessionState {
    session: Option<Arc<ClassifierSession>>,
    history: HistoryStore,
    /// Most recent completed analysis, for the `save` command
    last_result: Option<AnalysisResult>,
    default_model_dir: PathBuf,
    device: DeviceRequest,
    max_length: usize,
    threshold: f32,
    auto_scroll: bool,
    show_probabilities: bool,
    save_to_history: bool,
}

impl SessionState {
    fn new(settings: &Settings) -> Self {
        // Device was validated during config load; a bad value cannot reach
        // this point, but default to CPU rather than panic.
        let device = settings
            .model
            .device
            .parse::<DeviceRequest>()
            .unwrap_or(DeviceRequest::Cpu);
        Self {
            session: None,
            history: HistoryStore::new(),
            last_result: None,
            default_model_dir: settings.model.directory.clone(),
            device,
            max_length: settings.analysis.max_length,
            threshold: settings.analysis.confidence_threshold,
            auto_scroll: settings.display.auto_scroll,
            show_probabilities: settings.display.show_probabilities,
            save_to_history: settings.display.save_to_history,
        }
    }

    fn model_loaded(&self) -> bool {
        self.session.is_some()
    }
}

/// Runs the interactive loop until the user exits.
///
/// `initial_model` optionally loads a checkpoint before the first prompt.
pub async fn run(settings: &Settings, initial_model: Option<PathBuf>) -> Result<()> {
    let mut state = SessionState::new(settings);
    let mut rl = DefaultEditor::new()?;

    display::print_help(false);

    if let Some(dir) = initial_model {
        load_model(&mut state, &dir);
    } else {
        println!(
            "{}",
            "Модель не загружена. Используйте 'load <dir>' для загрузки.".yellow()
        );
    }

    loop {
        let prompt = if state.model_loaded() {
            "[analyzer] > "
        } else {
            "> "
        };

        let readline = rl.readline(prompt);
        match readline {
            Ok(input) => {
                let input_trimmed = input.trim();
                if input_trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input_trimmed);

                if !dispatch(&mut state, &mut rl, input_trimmed).await {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Handles one input line. Returns false when the loop should exit.
async fn dispatch(state: &mut SessionState, rl: &mut DefaultEditor, input: &str) -> bool {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or("").to_lowercase();

    match command.as_str() {
        "exit" | "quit" | "bye" => return false,
        "help" => display::print_help(state.model_loaded()),
        "labels" => display::print_labels(),
        "settings" => print_settings(state),
        "history" => display::print_history(&state.history),
        "load" => {
            let dir = parts
                .next()
                .map(PathBuf::from)
                .unwrap_or_else(|| state.default_model_dir.clone());
            load_model(state, &dir);
        }
        "file" => match parts.next() {
            Some(path) => analyze_file(state, Path::new(path)).await,
            None => println!("Usage: file <path>"),
        },
        "export" => match parts.next() {
            Some(path) => export_history(state, Path::new(path)),
            None => println!("Usage: export <path.json|path.csv>"),
        },
        "save" => match parts.next() {
            Some(path) => save_last_result(state, Path::new(path)),
            None => println!("Usage: save <path.json>"),
        },
        "clear" => clear_history(state, rl),
        "set" => {
            let key = parts.next().unwrap_or("");
            let value = parts.next().unwrap_or("");
            apply_setting(state, key, value);
        }
        "analyze" => {
            let text = input
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim())
                .unwrap_or("");
            if text.is_empty() {
                println!("Usage: analyze <text>");
            } else {
                analyze_text(state, text).await;
            }
        }
        _ => analyze_text(state, input).await,
    }

    true
}

fn load_model(state: &mut SessionState, dir: &Path) {
    println!("Загрузка модели из {}...", dir.display());
    match ClassifierSession::load(dir, state.device) {
        Ok(session) => {
            println!(
                "{} Устройство: {}",
                "Модель успешно загружена.".green(),
                session.device_name()
            );
            info!("Model loaded from {}", dir.display());
            state.session = Some(Arc::new(session));
        }
        Err(e) => {
            warn!("Model load failed: {}", e);
            println!("{}", format!("Не удалось загрузить модель: {}", e).red());
        }
    }
}

async fn analyze_text(state: &mut SessionState, text: &str) {
    let Some(session) = state.session.clone() else {
        println!(
            "{}",
            "Сначала загрузите модель командой 'load <dir>'.".yellow()
        );
        return;
    };

    let request = AnalysisRequest {
        text: text.to_string(),
        max_length: state.max_length,
    };

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>3}%")
            .unwrap(),
    );

    let mut rx = worker::submit(session, request);
    while let Some(event) = rx.recv().await {
        match event {
            AnalysisEvent::Progress(value) => pb.set_position(value as u64),
            AnalysisEvent::Finished(result) => {
                pb.finish_and_clear();
                display::print_result(&result, state.threshold, state.show_probabilities);
                if state.save_to_history {
                    state.history.append(result.clone());
                    if state.auto_scroll {
                        println!(
                            "{}",
                            format!("Сохранено в историю (записей: {})", state.history.len())
                                .bright_black()
                        );
                    }
                }
                state.last_result = Some(result);
            }
            AnalysisEvent::Failed(message) => {
                pb.finish_and_clear();
                println!("{}", format!("Ошибка анализа: {}", message).red());
            }
        }
    }
}

async fn analyze_file(state: &mut SessionState, path: &Path) {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            println!(
                "Загружен файл: {} ({} символов)",
                path.display(),
                text.chars().count()
            );
            let trimmed = text.trim();
            if trimmed.is_empty() {
                println!("{}", "Файл пуст".yellow());
            } else {
                analyze_text(state, trimmed).await;
            }
        }
        Err(e) => {
            let err = AnalyzerError::Load(format!("Failed to read {}: {}", path.display(), e));
            println!("{}", format!("Не удалось загрузить файл: {}", err).red());
        }
    }
}

fn export_history(state: &SessionState, path: &Path) {
    if state.history.is_empty() {
        println!("{}", "История пуста".yellow());
        return;
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let result = if is_csv {
        state.history.export_csv(path)
    } else {
        state.history.export_json(path)
    };

    match result {
        Ok(()) => println!(
            "{}",
            format!("История экспортирована: {}", path.display()).green()
        ),
        Err(e) => println!("{}", format!("Не удалось экспортировать историю: {}", e).red()),
    }
}

fn save_last_result(state: &SessionState, path: &Path) {
    let Some(result) = &state.last_result else {
        println!("{}", "Нет результата для сохранения".yellow());
        return;
    };

    match result.save_json(path) {
        Ok(()) => println!(
            "{}",
            format!("Результат сохранён: {}", path.display()).green()
        ),
        Err(e) => println!("{}", format!("Не удалось сохранить результат: {}", e).red()),
    }
}

fn clear_history(state: &mut SessionState, rl: &mut DefaultEditor) {
    if state.history.is_empty() {
        println!("{}", "История пуста".yellow());
        return;
    }

    let question = format!(
        "Очистить историю ({} записей)? [y/N] ",
        state.history.len()
    );
    match rl.readline(&question) {
        Ok(answer) if answer.trim().eq_ignore_ascii_case("y") => {
            state.history.clear();
            println!("{}", "История очищена".green());
        }
        _ => println!("Отменено"),
    }
}

fn apply_setting(state: &mut SessionState, key: &str, value: &str) {
    match key.to_lowercase().as_str() {
        "max_length" | "maxlen" => match value.parse::<usize>() {
            Ok(v) => match config::validate_max_length(v) {
                Ok(()) => {
                    state.max_length = v;
                    println!("max_length = {}", v);
                }
                Err(e) => println!("{}", e.red()),
            },
            Err(_) => println!("{}", "max_length must be an integer".red()),
        },
        "threshold" => match value.parse::<f32>() {
            Ok(v) => match config::validate_threshold(v) {
                Ok(()) => {
                    state.threshold = v;
                    println!("confidence_threshold = {}", v);
                }
                Err(e) => println!("{}", e.red()),
            },
            Err(_) => println!("{}", "threshold must be a number".red()),
        },
        "device" => match value.parse::<DeviceRequest>() {
            Ok(v) => {
                state.device = v;
                println!("device = {} (applies to the next 'load')", value.to_lowercase());
            }
            Err(e) => println!("{}", e.red()),
        },
        "probabilities" => match parse_toggle(value) {
            Some(v) => {
                state.show_probabilities = v;
                println!("show_probabilities = {}", v);
            }
            None => println!("Usage: set probabilities on|off"),
        },
        "autosave" => match parse_toggle(value) {
            Some(v) => {
                state.save_to_history = v;
                println!("save_to_history = {}", v);
            }
            None => println!("Usage: set autosave on|off"),
        },
        "autoscroll" => match parse_toggle(value) {
            Some(v) => {
                state.auto_scroll = v;
                println!("auto_scroll = {}", v);
            }
            None => println!("Usage: set autoscroll on|off"),
        },
        _ => println!(
            "Unknown setting '{}'. Available: max_length, threshold, device, probabilities, autosave, autoscroll",
            key
        ),
    }
}

fn parse_toggle(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn print_settings(state: &SessionState) {
    println!("\nТекущие настройки:");
    println!("  max_length           = {}", state.max_length);
    println!("  confidence_threshold = {}", state.threshold);
    println!(
        "  device               = {}",
        match state.device {
            DeviceRequest::Cpu => "cpu",
            DeviceRequest::Cuda => "cuda",
        }
    );
    println!("  show_probabilities   = {}", state.show_probabilities);
    println!("  save_to_history      = {}", state.save_to_history);
    println!("  auto_scroll          = {}", state.auto_scroll);
    println!(
        "  model                = {}",
        state
            .session
            .as_ref()
            .map(|s| format!("{} ({})", s.path.display(), s.device_name()))
            .unwrap_or_else(|| "не загружена".to_string())
    );
    println!();
}
