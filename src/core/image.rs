use crate::core::filename::ParsedFileName;
use crate::core::fingerprint::Fingerprint;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A successfully fingerprinted gallery image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub author: String,
    pub captured_at: String,
    pub fingerprint: Fingerprint,
}

impl ImageRecord {
    pub fn new(path: &Path, fingerprint: Fingerprint) -> Self {
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let ParsedFileName {
            author,
            captured_at,
        } = ParsedFileName::parse(&file_name);

        Self {
            file_name,
            path: path.to_path_buf(),
            author,
            captured_at,
            fingerprint,
        }
    }

    pub fn same_author(&self, other: &ImageRecord) -> bool {
        self.author == other.author
    }
}
