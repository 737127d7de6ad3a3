use crate::core::fingerprint::FingerprintAlgorithm;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted grid side; a 1024×1024 fingerprint is already ~128 KiB.
pub const MAX_FINGERPRINT_BITS: u32 = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fingerprint_bits must be at least 1")]
    ZeroFingerprintBits,

    #[error("fingerprint_bits {bits} exceeds the maximum of {max}")]
    FingerprintBitsTooLarge { bits: u32, max: u32 },

    #[error("progress_every must be at least 1")]
    ZeroProgressInterval,

    #[error("at least one image extension is required")]
    NoExtensions,

    #[error("Cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Knobs for one duplicate-detection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub image_dir: PathBuf,
    pub report_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub extensions: Vec<String>,
    /// Grid side N of the perceptual hash, so fingerprints carry N² bits.
    /// N alone is the similarity denominator.
    pub fingerprint_bits: u32,
    /// Inclusive maximum Hamming distance for a reported pair.
    pub hamming_threshold: u32,
    pub algorithm: FingerprintAlgorithm,
    pub progress_every: usize,
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("web_media/400"),
            report_path: PathBuf::from("duplicate_analysis.md"),
            json_path: None,
            extensions: vec!["jpg".to_string(), "jpeg".to_string()],
            fingerprint_bits: 16,
            hamming_threshold: 5,
            algorithm: FingerprintAlgorithm::default(),
            progress_every: 50,
            parallel: false,
        }
    }
}

impl DetectorConfig {
    /// Reads a JSON config; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.to_string_lossy().to_string();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ConfigError::Parse { path: display, source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fingerprint_bits(self.fingerprint_bits)?;
        if self.progress_every == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }
        if self
            .extensions
            .iter()
            .all(|ext| ext.trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }
}

/// Grid sides the hasher can build without overflowing its bit count.
pub fn check_fingerprint_bits(bits: u32) -> Result<(), ConfigError> {
    if bits == 0 {
        return Err(ConfigError::ZeroFingerprintBits);
    }
    match bits.checked_mul(bits) {
        Some(_) if bits <= MAX_FINGERPRINT_BITS => Ok(()),
        _ => Err(ConfigError::FingerprintBitsTooLarge {
            bits,
            max: MAX_FINGERPRINT_BITS,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_gallery_constants() {
        let config = DetectorConfig::default();
        assert_eq!(config.fingerprint_bits, 16);
        assert_eq!(config.hamming_threshold, 5);
        assert_eq!(config.progress_every, 50);
        assert!(config.extensions.contains(&"jpeg".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_degenerate_values() {
        let config = DetectorConfig {
            fingerprint_bits: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroFingerprintBits)));

        let config = DetectorConfig {
            fingerprint_bits: 70_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FingerprintBitsTooLarge { bits: 70_000, .. })
        ));

        let config = DetectorConfig {
            progress_every: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroProgressInterval)));

        let config = DetectorConfig {
            extensions: vec![".".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoExtensions)));
    }

    #[test]
    fn test_fingerprint_bits_bounds() {
        assert!(check_fingerprint_bits(1).is_ok());
        assert!(check_fingerprint_bits(MAX_FINGERPRINT_BITS).is_ok());
        assert!(matches!(
            check_fingerprint_bits(MAX_FINGERPRINT_BITS + 1),
            Err(ConfigError::FingerprintBitsTooLarge { .. })
        ));
        assert!(matches!(
            check_fingerprint_bits(u32::MAX),
            Err(ConfigError::FingerprintBitsTooLarge { .. })
        ));
    }

    #[test]
    fn test_oversized_grid_in_json_is_rejected() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"fingerprint_bits": 70000}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FingerprintBitsTooLarge { .. })
        ));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"hamming_threshold": 8, "algorithm": "double-gradient"}"#)
                .unwrap();
        assert_eq!(config.hamming_threshold, 8);
        assert_eq!(config.algorithm, FingerprintAlgorithm::DoubleGradient);
        assert_eq!(config.fingerprint_bits, 16);
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("galldup.json");
        std::fs::write(&path, r#"{"image_dir": "photos", "parallel": true}"#).unwrap();

        let config = DetectorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.image_dir, PathBuf::from("photos"));
        assert!(config.parallel);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            DetectorConfig::from_json_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            DetectorConfig::from_json_file(&temp_dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
