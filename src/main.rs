use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use galldup::config::{self, DetectorConfig};
use galldup::core::filename::ParsedFileName;
use galldup::core::fingerprint::{FingerprintAlgorithm, Fingerprinter};
use galldup::core::pipeline::{DuplicatePipeline, ProgressEvent};
use galldup::report::{self, ReportSink, TeeSink};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "galldup",
    version,
    about = "Find near-duplicate gallery images submitted by different authors"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare every cross-author image pair and write a duplicate report
    Scan(ScanArgs),

    /// Print the perceptual fingerprint of individual images
    Fingerprint {
        /// Images to fingerprint
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Fingerprint grid side N (N² bits)
        #[arg(long, default_value_t = 16)]
        bits: u32,
        #[arg(long, value_enum, default_value_t = FingerprintAlgorithm::default())]
        algorithm: FingerprintAlgorithm,
    },

    /// Show the author and capture time encoded in filenames
    Parse {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Directory to scan
    #[arg(short, long, value_name = "DIR")]
    path: Option<PathBuf>,
    /// JSON config file; flags given on the command line win
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Markdown report destination (overwritten)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Also write a JSON report here
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
    /// Image extension to include (repeatable)
    #[arg(short, long = "ext", value_name = "EXT")]
    extensions: Vec<String>,
    /// Fingerprint grid side N (N² bits); N is also the similarity denominator
    #[arg(long)]
    bits: Option<u32>,
    /// Maximum Hamming distance for a reported pair (inclusive)
    #[arg(short, long)]
    threshold: Option<u32>,
    #[arg(long, value_enum)]
    algorithm: Option<FingerprintAlgorithm>,
    /// Log progress after this many fingerprinted images
    #[arg(long, value_name = "N")]
    progress_every: Option<usize>,
    /// Fingerprint files on all cores
    #[arg(long)]
    parallel: bool,
    /// Don't mirror the report on stdout
    #[arg(short, long)]
    quiet: bool,
}

impl ScanArgs {
    fn into_config(self) -> Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::from_json_file(path)?,
            None => DetectorConfig::default(),
        };

        if let Some(path) = self.path {
            config.image_dir = path;
        }
        if let Some(output) = self.output {
            config.report_path = output;
        }
        if self.json.is_some() {
            config.json_path = self.json;
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions;
        }
        if let Some(bits) = self.bits {
            config.fingerprint_bits = bits;
        }
        if let Some(threshold) = self.threshold {
            config.hamming_threshold = threshold;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(every) = self.progress_every {
            config.progress_every = every;
        }
        config.parallel |= self.parallel;

        Ok(config)
    }
}

/// Log output that pauses any live progress bars while it writes.
struct SuspendingStderr {
    progress: MultiProgress,
}

impl Write for SuspendingStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

fn main() -> Result<()> {
    let progress = MultiProgress::new();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(SuspendingStderr {
            progress: progress.clone(),
        })))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            let quiet = args.quiet;
            let config = args.into_config()?;
            scan(config, quiet, &progress)?;
        }

        Commands::Fingerprint {
            files,
            bits,
            algorithm,
        } => {
            config::check_fingerprint_bits(bits)?;
            let fingerprinter = Fingerprinter::new(bits, algorithm);
            for file in &files {
                match fingerprinter.fingerprint_file(file) {
                    Ok(fp) => println!("{}  {}", fp, file.display()),
                    Err(err) => eprintln!("⚠️  {}: {}", file.display(), err),
                }
            }
        }

        Commands::Parse { names } => {
            for name in &names {
                let parsed = ParsedFileName::parse(name);
                println!(
                    "{}\n     author: {}\n     captured: {}",
                    name,
                    parsed.author,
                    if parsed.captured_at.is_empty() {
                        "-"
                    } else {
                        parsed.captured_at.as_str()
                    }
                );
            }
        }
    }

    Ok(())
}

fn scan(config: DetectorConfig, quiet: bool, progress: &MultiProgress) -> Result<()> {
    println!("▶ Scanning for duplicates in: {}", config.image_dir.display());

    let bar = progress.add(ProgressBar::new(0));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    let progress_bar = bar.clone();
    let pipeline = DuplicatePipeline::new(config)?.with_progress_callback(Box::new(
        move |event: &ProgressEvent| {
            if let ProgressEvent::Attempted(p) = event {
                progress_bar.set_length(p.total as u64);
                progress_bar.set_position(p.attempted as u64);
                progress_bar.set_message(p.current_file.clone());
            }
        },
    ));
    let config = pipeline.config();

    let mirror_progress = progress.clone();
    let mut sink = TeeSink::create(&config.report_path)?
        .mirror_with(Box::new(move |line: &str| {
            mirror_progress.suspend(|| println!("{}", line));
        }))
        .mirror(!quiet);
    let summary = pipeline.run(&mut sink);
    bar.finish_and_clear();
    let summary = summary
        .with_context(|| format!("Duplicate scan of {} failed", config.image_dir.display()))?;

    if let Some(json_path) = &config.json_path {
        report::write_json_report(json_path, config, &summary)?;
        println!("✅ JSON report written to {}", json_path.display());
    }

    sink.finalize()?;
    println!("\n✅ Results have been written to {}", sink.path().display());
    Ok(())
}
