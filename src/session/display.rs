use colored::*;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use crate::analysis::AnalysisResult;
use crate::history::HistoryStore;
use crate::labels::{self, CLASSES};

/// Terminal color for a class, approximating the catalog's display color.
fn class_color(class_id: usize) -> Color {
    match class_id {
        0 => Color::Red,
        1 => Color::Yellow,
        2 => Color::Magenta,
        3 => Color::Blue,
        4 => Color::Green,
        _ => Color::White,
    }
}

fn table_color(class_id: usize) -> comfy_table::Color {
    match class_id {
        0 => comfy_table::Color::Red,
        1 => comfy_table::Color::Yellow,
        2 => comfy_table::Color::Magenta,
        3 => comfy_table::Color::Blue,
        4 => comfy_table::Color::Green,
        _ => comfy_table::Color::White,
    }
}

/// Prints one completed analysis: predicted class, confidence, description,
/// a low-confidence warning under the threshold, and optionally the full
/// per-class breakdown with the predicted row highlighted.
pub fn print_result(result: &AnalysisResult, threshold: f32, show_probabilities: bool) {
    let name = labels::name(result.class_id);
    let description = labels::get(result.class_id).map(|c| c.description).unwrap_or("");

    println!();
    println!(
        "Класс: {}",
        name.color(class_color(result.class_id)).bold()
    );
    println!("Уверенность: {:.2}%", result.confidence * 100.0);
    println!("{}", description);

    if result.confidence < threshold {
        println!(
            "{}",
            format!(
                "Низкая уверенность (< {:.0}%). Рекомендуется ручная проверка.",
                threshold * 100.0
            )
            .yellow()
        );
    }

    if show_probabilities {
        println!("\nДетальные вероятности по классам:");
        for (idx, prob) in result.probabilities.iter().enumerate() {
            let line = format!("  {:<16} {:>6.2}%", labels::name(idx), prob * 100.0);
            if idx == result.class_id {
                println!("{}", line.color(class_color(idx)).bold());
            } else {
                println!("{}", line.color(class_color(idx)));
            }
        }
    }
    println!();
}

/// Renders the history as a table: time, a text fragment, class and
/// confidence, newest entries last.
pub fn print_history(store: &HistoryStore) {
    if store.is_empty() {
        println!("{}", "История пуста".yellow());
        return;
    }

    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Время").add_attribute(Attribute::Bold),
            Cell::new("Текст (фрагмент)").add_attribute(Attribute::Bold),
            Cell::new("Класс").add_attribute(Attribute::Bold),
            Cell::new("Уверенность").add_attribute(Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    for record in store.records() {
        let fragment: String = if record.text.chars().count() > 50 {
            record.text.chars().take(50).collect::<String>() + "..."
        } else {
            record.text.clone()
        };
        table.add_row(vec![
            Cell::new(&record.timestamp),
            Cell::new(fragment),
            Cell::new(labels::name(record.class_id)).fg(table_color(record.class_id)),
            Cell::new(format!("{:.2}%", record.confidence * 100.0))
                .set_alignment(CellAlignment::Right),
        ]);
    }

    println!("\n{}", table);
    println!("{}", format!("Записей: {}", store.len()).bright_green());
}

/// Prints the class catalog.
pub fn print_labels() {
    println!("\nКатегории контента:");
    for label in &CLASSES {
        println!(
            "  {} {:<16} {}",
            label.id,
            label.name.color(class_color(label.id)).bold(),
            label.description
        );
    }
    println!();
}

pub fn print_help(model_loaded: bool) {
    println!("\n{}", "ruBERT Content Analyzer".cyan());
    println!("{}", "=".repeat(60).bright_cyan());
    println!("{} - Load a checkpoint directory", "load [dir]".green());
    if model_loaded {
        println!("{} - Classify text (or just type the text)", "analyze <text>".green());
        println!("{} - Classify the contents of a UTF-8 text file", "file <path>".green());
    } else {
        println!("{} - (available after load) classify text", "analyze <text>".green());
        println!("{} - (available after load) classify a text file", "file <path>".green());
    }
    println!("{} - Show the analysis history", "history".green());
    println!("{} - Export history (.json or .csv)", "export <path>".green());
    println!("{} - Save the last result as JSON", "save <path>".green());
    println!("{} - Clear the history (asks for confirmation)", "clear".green());
    println!("{} - Show the class catalog", "labels".green());
    println!("{} - Show current settings", "settings".green());
    println!(
        "{} - Change a setting (max_length, threshold, device,",
        "set <key> <value>".green()
    );
    println!("                      probabilities, autosave, autoscroll)");
    println!("{} - Show this help message", "help".green());
    println!("{} - Exit", "exit, quit, bye".green());
    println!();
}
