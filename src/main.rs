//! wav-normalizer
//!
//! Converts one audio file into a 16 kHz mono 16-bit PCM WAV and prints the
//! path of the result.
//!
//! Usage: `wav-normalizer <input> [config.toml]`

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wav_normalizer::{ConversionOutcome, NormalizeError, Normalizer, NormalizerConfig};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "wav-normalizer";

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args_os().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        eprintln!("usage: {} <input> [config.toml]", APP_NAME);
        return ExitCode::from(2);
    };
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    // Config is loaded first so its log level can seed the filter
    let (config, config_error) = load_config(&config_path);
    init_logging(&config.log_level);

    tracing::debug!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = config_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path.display(),
            e
        );
    }
    tracing::debug!("Configuration loaded: {:?}", config);

    let result = match Normalizer::from_config(&config) {
        Ok(normalizer) => normalizer.normalize(&input).await,
        Err(e) => Err(e),
    };

    if report(&result, &mut std::io::stdout(), &mut std::io::stderr()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print the result path to `out`, or the error once to `err`
fn report(
    result: &Result<ConversionOutcome, NormalizeError>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> bool {
    match result {
        Ok(outcome) => {
            tracing::info!(outcome = ?outcome, "Normalization finished");
            let _ = writeln!(out, "{}", outcome.path().display());
            true
        }
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            false
        }
    }
}

fn load_config(path: &Path) -> (NormalizerConfig, Option<NormalizeError>) {
    if !path.exists() {
        return (NormalizerConfig::default(), None);
    }
    match NormalizerConfig::from_file(path) {
        Ok(config) => (config, None),
        Err(e) => (NormalizerConfig::default(), Some(e)),
    }
}

/// Initialize logging with tracing
fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("wav_normalizer={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
