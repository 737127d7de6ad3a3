use crate::config::ConfigError;
use crate::core::scanner::ScanError;
use crate::report::ReportError;
use thiserror::Error;

/// Errors that end a run. Per-image fingerprint failures never show up here.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}
