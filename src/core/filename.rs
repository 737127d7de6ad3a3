use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static CAPTURED_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}\s+at\s+\d{2}\.\d{2}\.\d{2})")
        .expect("capture timestamp pattern is valid")
});

/// Author and capture time encoded in a gallery filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFileName {
    pub author: String,
    /// Empty when the filename carries no timestamp.
    pub captured_at: String,
}

impl ParsedFileName {
    pub fn parse(file_name: &str) -> Self {
        Self {
            author: author_of(file_name).to_string(),
            captured_at: captured_at_of(file_name),
        }
    }
}

/// Everything before the first `.`; the whole name when there is none.
pub fn author_of(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// First `YYYY-MM-DD at HH.MM.SS` found anywhere in the name.
pub fn captured_at_of(file_name: &str) -> String {
    CAPTURED_AT
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
