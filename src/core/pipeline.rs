use crate::config::DetectorConfig;
use crate::core::duplicate::{DuplicateDetector, DuplicatePair};
use crate::core::fingerprint::{Fingerprint, FingerprintError, Fingerprinter};
use crate::core::image::ImageRecord;
use crate::core::scanner::{ScanError, ScannerService};
use crate::error::DetectorError;
use crate::report::{self, ReportSink};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// An image that could not be fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintFailure {
    pub file_name: String,
    pub reason: String,
}

/// Result of the fingerprinting phase, both halves in listing order.
#[derive(Debug, Default)]
pub struct FingerprintOutcome {
    pub records: Vec<ImageRecord>,
    pub failures: Vec<FingerprintFailure>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub images_listed: usize,
    pub records: Vec<ImageRecord>,
    pub failures: Vec<FingerprintFailure>,
    pub pairs: Vec<DuplicatePair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerprintProgress {
    pub current_file: String,
    /// Files attempted so far, successful or not.
    pub attempted: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub enum ProgressEvent {
    /// One file attempted. In parallel runs these arrive from worker
    /// threads, so their order is not listing order.
    Attempted(FingerprintProgress),
    /// The successful count reached a multiple of `progress_every`.
    /// Always emitted in listing order; failures never count.
    Milestone {
        fingerprinted: usize,
        total: usize,
        current_file: String,
    },
}

pub type ProgressCallback = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

/// scan → fingerprint all → compare all, each phase handing an owned
/// collection to the next.
pub struct DuplicatePipeline {
    config: DetectorConfig,
    scanner: ScannerService,
    fingerprinter: Fingerprinter,
    detector: DuplicateDetector,
    progress_callback: Option<ProgressCallback>,
}

impl DuplicatePipeline {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        config.validate()?;

        Ok(Self {
            scanner: ScannerService::new(&config.extensions),
            fingerprinter: Fingerprinter::new(config.fingerprint_bits, config.algorithm),
            detector: DuplicateDetector::new(config.hamming_threshold, config.fingerprint_bits),
            progress_callback: None,
            config,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn scan(&self) -> Result<Vec<PathBuf>, ScanError> {
        self.scanner.scan_directory(&self.config.image_dir)
    }

    /// Attempts every file exactly once. Failures are logged and collected,
    /// never propagated.
    pub fn fingerprint_all(&self, files: &[PathBuf]) -> FingerprintOutcome {
        let total = files.len();
        let attempted = AtomicUsize::new(0);

        let attempt = |path: &PathBuf| {
            let result = self.fingerprinter.fingerprint_file(path);
            let done = attempted.fetch_add(1, Ordering::Relaxed) + 1;
            self.send_progress(ProgressEvent::Attempted(FingerprintProgress {
                current_file: file_name_of(path),
                attempted: done,
                total,
            }));
            result
        };

        let every = self.config.progress_every;
        let mut outcome = FingerprintOutcome::default();
        let mut record = |path: &PathBuf, result: Result<Fingerprint, FingerprintError>| {
            match result {
                Ok(fingerprint) => {
                    outcome.records.push(ImageRecord::new(path, fingerprint));
                    let fingerprinted = outcome.records.len();
                    if fingerprinted % every == 0 {
                        log::info!("Processed {}/{} images...", fingerprinted, total);
                        self.send_progress(ProgressEvent::Milestone {
                            fingerprinted,
                            total,
                            current_file: file_name_of(path),
                        });
                    }
                }
                Err(e) => {
                    log::warn!("Error fingerprinting {}: {}", path.display(), e);
                    outcome.failures.push(FingerprintFailure {
                        file_name: file_name_of(path),
                        reason: e.to_string(),
                    });
                }
            }
        };

        if self.config.parallel {
            let results: Vec<_> = files.par_iter().map(attempt).collect();
            for (path, result) in files.iter().zip(results) {
                record(path, result);
            }
        } else {
            for path in files {
                record(path, attempt(path));
            }
        }

        outcome
    }

    pub fn compare(&self, records: &[ImageRecord]) -> Vec<DuplicatePair> {
        self.detector.find_pairs(records)
    }

    /// Runs every phase and writes the Markdown report to `sink`. A fatal
    /// scan error is written to the sink before it is returned.
    pub fn run(&self, sink: &mut dyn ReportSink) -> Result<RunSummary, DetectorError> {
        log::info!("Scanning {}", self.config.image_dir.display());
        let files = match self.scan() {
            Ok(files) => files,
            Err(e) => {
                sink.append_line(&format!("Scan failed: {}", e))?;
                sink.finalize()?;
                return Err(e.into());
            }
        };

        report::write_listing(sink, files.len())?;

        let FingerprintOutcome { records, failures } =
            benchmark("fingerprinting", || self.fingerprint_all(&files));
        report::write_fingerprint_summary(sink, records.len())?;

        let pairs = benchmark("pairwise comparison", || self.compare(&records));
        report::write_pairs(sink, &pairs, records.len(), self.config.hamming_threshold)?;
        sink.finalize()?;

        if !failures.is_empty() {
            log::warn!("{} image(s) could not be fingerprinted", failures.len());
        }

        Ok(RunSummary {
            images_listed: files.len(),
            records,
            failures,
            pairs,
        })
    }

    fn send_progress(&self, progress: ProgressEvent) {
        if let Some(callback) = &self.progress_callback {
            callback(&progress);
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    log::info!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
