use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    NotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Cannot read directory {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Lists the images directly inside a gallery directory.
#[derive(Debug, Clone)]
pub struct ScannerService {
    extensions: HashSet<String>,
}

impl ScannerService {
    /// `extensions` are matched case-insensitively; a leading `.` is ignored.
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn is_supported_format(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    /// Immediate children of `dir` with a recognized extension, sorted by
    /// file name. Any failure to read `dir` itself is fatal.
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let path = dir.to_string_lossy().to_string();
        if !dir.exists() {
            return Err(ScanError::NotFound { path });
        }
        if !dir.is_dir() {
            return Err(ScanError::NotADirectory { path });
        }

        let mut images = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                // depth 0 is the directory itself; anything below is a
                // single entry we can skip
                Err(e) if e.depth() == 0 => {
                    return Err(ScanError::Unreadable { path, source: e });
                }
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_supported_format(entry.path()) {
                images.push(entry.into_path());
            }
        }

        log::debug!("Found {} candidate images in {}", images.len(), dir.display());
        Ok(images)
    }
}
