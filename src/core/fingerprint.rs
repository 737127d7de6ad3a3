use image::ImageReader;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Fixed-length perceptual bit sequence.
///
/// Two fingerprints are only comparable when produced with the same grid
/// size and algorithm; every record in a run satisfies that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bytes: Box<[u8]>,
    bit_len: usize,
}

impl Fingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
            bit_len: bytes.len() * 8,
        }
    }

    /// Packs `bits` MSB-first; trailing pad bits stay zero.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for (i, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
            bytes[i / 8] |= 0x80 >> (i % 8);
        }
        Self {
            bytes: bytes.into_boxed_slice(),
            bit_len: bits.len(),
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bit positions that differ.
    pub fn hamming_distance(&self, other: &Fingerprint) -> u32 {
        debug_assert_eq!(
            self.bit_len, other.bit_len,
            "fingerprints of different lengths are not comparable"
        );
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FingerprintAlgorithm {
    /// Block mean hash, what the gallery tooling has always used
    #[default]
    Blockhash,
    Mean,
    Median,
    Gradient,
    DoubleGradient,
}

impl From<FingerprintAlgorithm> for HashAlg {
    fn from(algorithm: FingerprintAlgorithm) -> Self {
        match algorithm {
            FingerprintAlgorithm::Blockhash => HashAlg::Blockhash,
            FingerprintAlgorithm::Mean => HashAlg::Mean,
            FingerprintAlgorithm::Median => HashAlg::Median,
            FingerprintAlgorithm::Gradient => HashAlg::Gradient,
            FingerprintAlgorithm::DoubleGradient => HashAlg::DoubleGradient,
        }
    }
}

/// Computes `grid`×`grid` perceptual fingerprints for image files.
pub struct Fingerprinter {
    hasher: Hasher,
    grid: u32,
}

impl Fingerprinter {
    pub fn new(grid: u32, algorithm: FingerprintAlgorithm) -> Self {
        let hasher = HasherConfig::new()
            .hash_size(grid, grid)
            .hash_alg(algorithm.into())
            .to_hasher();
        Self { hasher, grid }
    }

    pub fn grid(&self) -> u32 {
        self.grid
    }

    pub fn fingerprint_file(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let hash = self.hasher.hash_image(&img);
        Ok(Fingerprint::from_bytes(hash.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::fs;
    use tempfile::TempDir;

    fn bits_with_flips(len: usize, flips: &[usize]) -> Fingerprint {
        let bits: Vec<bool> = (0..len).map(|i| flips.contains(&i)).collect();
        Fingerprint::from_bits(&bits)
    }

    fn create_test_image(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let intensity = ((x * 7 + y * 3) % 256) as u8;
            Rgb([intensity, 255 - intensity, intensity / 2])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_from_bits_packing() {
        let fp = bits_with_flips(16, &[0, 15]);
        assert_eq!(fp.as_bytes(), &[0x80, 0x01]);
        assert_eq!(fp.bit_len(), 16);
        assert_eq!(fp.to_hex(), "8001");
    }

    #[test]
    fn test_hamming_distance_counts_bits() {
        let zero = bits_with_flips(16, &[]);
        let five = bits_with_flips(16, &[0, 3, 7, 8, 12]);
        assert_eq!(zero.hamming_distance(&zero), 0);
        assert_eq!(zero.hamming_distance(&five), 5);
    }

    #[test]
    fn test_hamming_distance_is_symmetric() {
        let a = bits_with_flips(24, &[1, 2, 9, 20]);
        let b = bits_with_flips(24, &[2, 3, 9, 17, 23]);
        assert_eq!(a.hamming_distance(&b), b.hamming_distance(&a));
        assert_eq!(a.hamming_distance(&b), 5);
    }

    #[test]
    fn test_fingerprint_length_follows_grid() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.png");
        create_test_image(&file, 64, 48);

        let fingerprinter = Fingerprinter::new(16, FingerprintAlgorithm::Blockhash);
        let fp = fingerprinter.fingerprint_file(&file).unwrap();
        assert_eq!(fp.bit_len(), 256);
    }

    #[test]
    fn test_identical_copies_have_zero_distance() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("alice.png");
        let copy = temp_dir.path().join("bob.png");
        create_test_image(&original, 80, 60);
        fs::copy(&original, &copy).unwrap();

        let fingerprinter = Fingerprinter::new(16, FingerprintAlgorithm::default());
        let a = fingerprinter.fingerprint_file(&original).unwrap();
        let b = fingerprinter.fingerprint_file(&copy).unwrap();
        assert_eq!(a.hamming_distance(&b), 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("broken.jpeg");
        fs::write(&file, b"definitely not a jpeg").unwrap();

        let fingerprinter = Fingerprinter::new(16, FingerprintAlgorithm::default());
        assert!(fingerprinter.fingerprint_file(&file).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let fingerprinter = Fingerprinter::new(8, FingerprintAlgorithm::Mean);
        let result = fingerprinter.fingerprint_file(&temp_dir.path().join("nope.jpeg"));
        assert!(matches!(result, Err(FingerprintError::Io(_))));
    }
}
