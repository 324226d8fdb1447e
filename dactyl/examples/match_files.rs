//! Example: match a probe image against candidate image files
//!
//! 1. Load the probe and every candidate with the `image` crate
//! 2. Run `HybridMatcher` over the candidates
//! 3. Print the JSON match report
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example match_files -- probe.png candidate1.png candidate2.jpg
//! ```
//!
//! Set `DACTYL_THRESHOLD` to change the threshold echoed in the report and
//! `DACTYL_LOG_DIR` to also write a rolling log file.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use common::log_setup::setup_logging;
use dactyl::{Candidate, CancelToken, HybridMatcher, Image, MatchReport, Matcher};

fn load(path: &Path) -> Result<Image> {
    let dynamic =
        image::open(path).with_context(|| format!("Failed to load image {}", path.display()))?;
    Ok(Image::from(dynamic))
}

fn candidate_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn main() -> Result<()> {
    let log_dir = env::var_os("DACTYL_LOG_DIR").map(PathBuf::from);
    setup_logging("match_files", "info", log_dir.as_deref());

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("Usage: {} <probe_image> <candidate_image>...", args[0]);
    }

    let threshold: f64 = match env::var("DACTYL_THRESHOLD") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid DACTYL_THRESHOLD {:?}", value))?,
        Err(_) => 0.6,
    };

    let probe_path = Path::new(&args[1]);
    let probe = load(probe_path)?;
    tracing::info!(
        "Probe {}: {}x{}",
        probe_path.display(),
        probe.width(),
        probe.height()
    );

    let candidates = args[2..]
        .iter()
        .map(|arg| {
            let path = Path::new(arg);
            Ok(Candidate::new(candidate_id(path), load(path)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let matcher = HybridMatcher::default();
    let result = matcher.match_candidates(&probe, &candidates, threshold, &CancelToken::new())?;

    let probe_filename = probe_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let report = MatchReport::new(probe_filename, &result);
    println!("{}", report.to_json()?);

    Ok(())
}
