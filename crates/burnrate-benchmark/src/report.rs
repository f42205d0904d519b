use std::fs;
use std::path::{Path, PathBuf};

use burnrate_core::{BenchmarkResultRow, OutputArchive, ReportMeta, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

const PLACEHOLDER_MODEL_NAME: &str = "model";
const BANNER_RULE_WIDTH: usize = 112;

const TABLE_HEADER: &str = "| Concurrency | Generation Throughput (tokens/s) |  Prompt Throughput (tokens/s) | Min TTFT (s) | Max TTFT (s) | Success Rate |";
const TABLE_DIVIDER: &str = "|-------------|----------------------------------|-------------------------------|--------------|--------------|--------------|";

/// Makes a model identifier safe to embed in a file name.
pub fn sanitize_model_name(name: &str) -> String {
    let sanitized = name.replace(['/', '\\'], "_");
    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return PLACEHOLDER_MODEL_NAME.to_string();
    }
    sanitized.to_string()
}

pub fn markdown_file_name(model_name: &str) -> String {
    format!("API_Throughput_{}.md", sanitize_model_name(model_name))
}

pub fn archive_file_name(model_name: &str, concurrency: u32, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}_concurrency_{}_{}.json",
        sanitize_model_name(model_name),
        concurrency,
        timestamp.format("%Y-%m-%d_%H-%M-%S")
    )
}

fn metadata_lines(meta: &ReportMeta) -> String {
    format!(
        "Input Tokens: {}\nOutput Tokens: {}\nTest Model: {}\nLatency: {:.2} ms\n",
        meta.input_tokens, meta.max_tokens, meta.model_name, meta.latency_ms
    )
}

/// Console header printed before the first level runs.
pub fn render_banner(meta: &ReportMeta, now: DateTime<Utc>) -> String {
    let rule = "#".repeat(BANNER_RULE_WIDTH);
    format!(
        "\n{rule}\n{:^width$}\n{:^width$}\n{rule}\n{}\n",
        "Burnrate API Throughput Benchmark",
        format!("Time: {}", now.format("%Y-%m-%d %H:%M:%S UTC+0")),
        metadata_lines(meta),
        width = BANNER_RULE_WIDTH,
    )
}

pub fn render_table_header() -> String {
    format!("{}\n{}", TABLE_HEADER, TABLE_DIVIDER)
}

pub fn render_row(row: &BenchmarkResultRow) -> String {
    format!(
        "| {:>11} | {:>32.2} | {:>29.2} | {:>12.2} | {:>12.2} | {:>11.2}% |",
        row.concurrency,
        row.generation_throughput,
        row.prompt_throughput,
        row.min_ttft,
        row.max_ttft,
        row.success_rate * 100.0
    )
}

pub fn render_markdown(rows: &[BenchmarkResultRow], meta: &ReportMeta) -> String {
    let mut out = format!("```\n{}```\n\n", metadata_lines(meta));
    out.push_str(&render_table_header());
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}

pub fn save_markdown(dir: &Path, rows: &[BenchmarkResultRow], meta: &ReportMeta) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(markdown_file_name(&meta.model_name));
    fs::write(&path, render_markdown(rows, meta))?;
    Ok(path)
}

pub fn save_archive(dir: &Path, archive: &OutputArchive) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(archive_file_name(
        &archive.model_name,
        archive.concurrency,
        archive.timestamp,
    ));
    let json = serde_json::to_string_pretty(archive)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Writes report artifacts, logging and skipping any that fail.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_dir: PathBuf,
    archive_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(report_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn write_markdown(&self, rows: &[BenchmarkResultRow], meta: &ReportMeta) -> Option<PathBuf> {
        match save_markdown(&self.report_dir, rows, meta) {
            Ok(path) => {
                info!(path = %path.display(), "Saved results");
                Some(path)
            }
            Err(e) => {
                warn!(dir = %self.report_dir.display(), "Skipping markdown report: {}", e);
                None
            }
        }
    }

    pub fn write_archive(&self, archive: &OutputArchive) -> Option<PathBuf> {
        match save_archive(&self.archive_dir, archive) {
            Ok(path) => {
                info!(path = %path.display(), count = archive.count, "Saved model outputs");
                Some(path)
            }
            Err(e) => {
                warn!(
                    concurrency = archive.concurrency,
                    "Skipping output archive: {}", e
                );
                None
            }
        }
    }
}
