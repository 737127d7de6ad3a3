pub mod duplicate;
pub mod filename;
pub mod fingerprint;
pub mod image;
pub mod pipeline;
pub mod scanner;

pub use duplicate::{DuplicateDetector, DuplicatePair};
pub use fingerprint::{Fingerprint, FingerprintAlgorithm, Fingerprinter};
pub use self::image::ImageRecord;
pub use pipeline::{DuplicatePipeline, ProgressEvent, RunSummary};
pub use scanner::ScannerService;
