// Status display: effective configuration and model availability.

use colored::Colorize;

use crate::config::Config;
use crate::dataset::reader::InputFormat;
use crate::similarity::download;

/// Display system status to the terminal.
pub fn show(config: &Config) {
    println!("{}", "=== colsim status ===".bold());
    println!("Engine: {}", config.engine);
    println!("Both-missing policy: {}", config.both_missing);
    println!("Substring bonus: {:.2}", config.substring_bonus);
    println!("Output workbook: {}", config.output_path.display());
    println!("Accepted inputs: {}", InputFormat::accepted_list());

    let embed_dir = download::embedding_model_dir(&config.model_dir);
    if download::embedding_files_present(&config.model_dir) {
        let size = dir_size(&embed_dir)
            .map(format_bytes)
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "Embedding model: {} ({}, {})",
            "present".green(),
            embed_dir.display(),
            size
        );
    } else {
        println!(
            "Embedding model: {} ({})",
            "not downloaded".yellow(),
            embed_dir.display()
        );
        println!("  Run `colsim download-model` to enable --engine semantic");
    }
}

fn dir_size(dir: &std::path::Path) -> Option<u64> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum(),
    )
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
