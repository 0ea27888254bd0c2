//! Encoder module - the external transcoder behind a capability trait
//!
//! The orchestrator never talks to a concrete binary. It hands a source,
//! a destination and [`EncodeOptions`] to an [`AudioEncoder`] and looks only
//! at the exit code and captured stderr that come back.

pub mod ffmpeg;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

pub use self::ffmpeg::FfmpegEncoder;

/// Output format requested from the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Resample rate in Hz
    pub sample_rate: u32,
    /// Output channel count
    pub channels: u16,
    /// Encoder codec name
    pub codec: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            sample_rate: crate::header::REQUIRED_SAMPLE_RATE,
            channels: 1,
            codec: "pcm_s16le".to_string(),
        }
    }
}

/// Result of one encoder run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutput {
    /// Process exit code; `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured standard error
    pub stderr: String,
}

impl EncodeOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A black-box transcoder.
///
/// Implementations must write a complete file to `destination` (overwriting
/// whatever is there) before reporting success. A non-zero exit is reported
/// through [`EncodeOutput`], not as an `Err`; `Err` is reserved for failing
/// to run the encoder at all.
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        options: &EncodeOptions,
    ) -> Result<EncodeOutput>;
}

#[async_trait]
impl<E: AudioEncoder + ?Sized> AudioEncoder for std::sync::Arc<E> {
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        options: &EncodeOptions,
    ) -> Result<EncodeOutput> {
        (**self).encode(source, destination, options).await
    }
}
