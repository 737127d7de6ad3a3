// Cross-author near-duplicate detection over fingerprinted images.

use crate::core::image::ImageRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    pub left: ImageRecord,
    pub right: ImageRecord,
    pub distance: u32,
    pub similarity_percent: u8,
}

/// `round((bits - distance) / bits * 100)`, clamped to `[0, 100]`.
pub fn similarity_percent(distance: u32, fingerprint_bits: u32) -> u8 {
    if fingerprint_bits == 0 {
        return if distance == 0 { 100 } else { 0 };
    }
    let bits = fingerprint_bits as f64;
    let pct = ((bits - distance as f64) / bits * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

pub struct DuplicateDetector {
    pub threshold: u32,
    pub fingerprint_bits: u32,
}

impl DuplicateDetector {
    pub fn new(threshold: u32, fingerprint_bits: u32) -> Self {
        Self {
            threshold,
            fingerprint_bits,
        }
    }

    /// Compares every unordered pair once. Pairs from the same author are
    /// skipped; the rest are kept when `distance <= threshold`. Output is
    /// ordered by descending similarity, ties in enumeration order.
    pub fn find_pairs(&self, records: &[ImageRecord]) -> Vec<DuplicatePair> {
        let mut pairs = Vec::new();

        for (i, left) in records.iter().enumerate() {
            for right in &records[i + 1..] {
                if left.same_author(right) {
                    continue;
                }

                let distance = left.fingerprint.hamming_distance(&right.fingerprint);
                if distance <= self.threshold {
                    pairs.push(DuplicatePair {
                        left: left.clone(),
                        right: right.clone(),
                        distance,
                        similarity_percent: similarity_percent(distance, self.fingerprint_bits),
                    });
                }
            }
        }

        // sort_by is stable
        pairs.sort_by(|a, b| b.similarity_percent.cmp(&a.similarity_percent));
        log::debug!(
            "Compared {} images, {} pairs within threshold {}",
            records.len(),
            pairs.len(),
            self.threshold
        );
        pairs
    }
}
