//! Audio normalization for speech pipelines
//!
//! Turns an arbitrary audio file into a 16 kHz, mono, 16-bit PCM WAV file.
//! Files that already carry a `.wav` extension and a 16 kHz WAV header are
//! passed through untouched; everything else goes through an external
//! encoder (ffmpeg by default).

pub mod config;
pub mod encoder;
pub mod error;
pub mod header;
pub mod normalize;

#[cfg(test)]
pub(crate) mod tests;

pub use config::{generate_default_config, EncoderConfig, NormalizerConfig};
pub use encoder::{AudioEncoder, EncodeOptions, EncodeOutput, FfmpegEncoder};
pub use error::{NormalizeError, Result};
pub use header::{is_conforming_wav, read_header, WavHeaderSnapshot};
pub use normalize::{ensure_exists, Action, AudioFile, ConversionOutcome, Normalizer};
