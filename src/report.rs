use crate::config::DetectorConfig;
use crate::core::duplicate::DuplicatePair;
use crate::core::pipeline::{FingerprintFailure, RunSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Cannot write report {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for report lines.
pub trait ReportSink {
    fn append_line(&mut self, line: &str) -> Result<(), ReportError>;

    /// Flushes everything written so far. Further lines may still follow.
    fn finalize(&mut self) -> Result<(), ReportError>;
}

/// Receives each report line for live display.
pub type MirrorFn = Box<dyn Fn(&str) + Send>;

/// Writes every line to a report file and mirrors it on stdout.
pub struct TeeSink {
    path: PathBuf,
    file: BufWriter<File>,
    mirror: Option<MirrorFn>,
}

impl TeeSink {
    /// Truncates any previous report at `path`.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path).map_err(|source| io_error(path, source))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            mirror: Some(Box::new(|line: &str| println!("{}", line))),
        })
    }

    /// `false` keeps the report file-only.
    pub fn mirror(mut self, mirror: bool) -> Self {
        if !mirror {
            self.mirror = None;
        }
        self
    }

    /// Replaces the stdout mirror, e.g. to print around a progress bar.
    pub fn mirror_with(mut self, mirror: MirrorFn) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for TeeSink {
    fn append_line(&mut self, line: &str) -> Result<(), ReportError> {
        if let Some(mirror) = &self.mirror {
            mirror(line);
        }
        writeln!(self.file, "{}", line).map_err(|source| io_error(&self.path, source))
    }

    fn finalize(&mut self) -> Result<(), ReportError> {
        self.file
            .flush()
            .map_err(|source| io_error(&self.path, source))
    }
}

/// Keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
    pub finalized: bool,
}

impl ReportSink for MemorySink {
    fn append_line(&mut self, line: &str) -> Result<(), ReportError> {
        self.lines.push(line.to_string());
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ReportError> {
        self.finalized = true;
        Ok(())
    }
}

fn io_error(path: &Path, source: io::Error) -> ReportError {
    ReportError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

pub fn write_listing(sink: &mut dyn ReportSink, listed: usize) -> Result<(), ReportError> {
    sink.append_line(&format!("Analyzing {} images...", listed))
}

pub fn write_fingerprint_summary(
    sink: &mut dyn ReportSink,
    analyzed: usize,
) -> Result<(), ReportError> {
    sink.append_line(&format!("Generated fingerprints for {} images.", analyzed))
}

/// Markdown pair table plus the trailing summary.
pub fn write_pairs(
    sink: &mut dyn ReportSink,
    pairs: &[DuplicatePair],
    analyzed: usize,
    threshold: u32,
) -> Result<(), ReportError> {
    sink.append_line("# Duplicate Pairs")?;
    sink.append_line("| Pair | File 1 | File 2 | Similarity |")?;
    sink.append_line("| ---- | ------ | ------ | ---------- |")?;

    for (index, pair) in pairs.iter().enumerate() {
        sink.append_line(&format!(
            "| D{} | {} | {} | {}% |",
            index + 1,
            pair.left.file_name,
            pair.right.file_name,
            pair.similarity_percent
        ))?;
    }

    sink.append_line("")?;
    sink.append_line(&format!(
        "Found {} duplicate pairs among {} images using hash-based comparison.",
        pairs.len(),
        analyzed
    ))?;
    sink.append_line("")?;
    sink.append_line(&format!(
        "Hash threshold: {} (lower values indicate stricter matching).",
        threshold
    ))
}

#[derive(Debug, Serialize)]
struct JsonPair<'a> {
    id: String,
    #[serde(flatten)]
    pair: &'a DuplicatePair,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    config: &'a DetectorConfig,
    images_listed: usize,
    images_analyzed: usize,
    failures: &'a [FingerprintFailure],
    pairs: Vec<JsonPair<'a>>,
}

/// Machine-readable copy of a finished run.
pub fn write_json_report(
    path: &Path,
    config: &DetectorConfig,
    summary: &RunSummary,
) -> Result<(), ReportError> {
    let report = JsonReport {
        generated_at: Utc::now(),
        config,
        images_listed: summary.images_listed,
        images_analyzed: summary.records.len(),
        failures: &summary.failures,
        pairs: summary
            .pairs
            .iter()
            .enumerate()
            .map(|(index, pair)| JsonPair {
                id: format!("D{}", index + 1),
                pair,
            })
            .collect(),
    };

    let file = File::create(path).map_err(|source| io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush().map_err(|source| io_error(path, source))
}
