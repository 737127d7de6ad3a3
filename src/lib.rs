//! Cross-author near-duplicate detection for gallery images.
//!
//! Filenames carry the submitting author (everything before the first `.`)
//! and optionally a `YYYY-MM-DD at HH.MM.SS` capture time. Every image is
//! reduced to a perceptual fingerprint; pairs from different authors whose
//! fingerprints are within a Hamming threshold are reported, most similar
//! first.

pub mod config;
pub mod core;
pub mod error;
pub mod report;

pub use config::DetectorConfig;
pub use error::DetectorError;
