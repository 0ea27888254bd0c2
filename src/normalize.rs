//! Normalization orchestrator
//!
//! Decides per file whether it can be passed through, must be re-encoded in
//! place, or must be encoded into a new `.wav` sibling, and carries out that
//! decision.
//!
//! In-place re-encoding never writes to the original path directly. The
//! encoder writes a temporary sibling, which is then renamed over the
//! original, so a concurrent reader sees either the old or the new file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{NormalizerConfig, DEFAULT_TEMP_SUFFIX};
use crate::encoder::{AudioEncoder, EncodeOptions, FfmpegEncoder};
use crate::error::{NormalizeError, Result};
use crate::header;

const WAV_EXTENSION: &str = "wav";

/// An input file and the parts of its name the orchestrator decides on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    path: PathBuf,
    /// Lower-cased extension without the dot, empty if there is none
    extension: String,
    stem: String,
}

impl AudioFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| NormalizeError::InvalidPath(path.clone()))?;
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            path,
            extension,
            stem,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn basename(&self) -> &str {
        &self.stem
    }

    pub fn is_wav(&self) -> bool {
        self.extension == WAV_EXTENSION
    }

    /// `<dir>/<stem>.wav`
    pub fn wav_sibling(&self) -> PathBuf {
        self.path.with_file_name(format!("{}.{}", self.stem, WAV_EXTENSION))
    }

    /// The original path with `suffix` appended, e.g. `a.wav.temp.wav`
    pub fn temp_sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// What has to happen to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Already a conforming WAV
    PassThrough,
    /// `.wav` that is not conforming; encode to `temp`, rename over the original
    ReencodeInPlace { temp: PathBuf },
    /// Any other extension; encode into `destination`
    EncodeToSibling { destination: PathBuf },
}

/// Result of a successful normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The input was already conforming and was not touched
    Unchanged(PathBuf),
    /// The input's content was replaced; the path is unchanged
    Replaced(PathBuf),
    /// A new `.wav` file was written next to the untouched input
    Created(PathBuf),
}

impl ConversionOutcome {
    /// Path of the conforming WAV file
    pub fn path(&self) -> &Path {
        match self {
            ConversionOutcome::Unchanged(p)
            | ConversionOutcome::Replaced(p)
            | ConversionOutcome::Created(p) => p,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            ConversionOutcome::Unchanged(p)
            | ConversionOutcome::Replaced(p)
            | ConversionOutcome::Created(p) => p,
        }
    }

    pub fn was_encoded(&self) -> bool {
        !matches!(self, ConversionOutcome::Unchanged(_))
    }
}

/// Fail fast if `path` does not exist
pub async fn ensure_exists(path: &Path) -> Result<()> {
    if !tokio::fs::try_exists(path).await? {
        return Err(NormalizeError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Turns arbitrary audio files into 16 kHz mono 16-bit PCM WAV files.
///
/// Stateless between calls. Two concurrent calls on the same path race on
/// the temporary file and the rename; callers must not do that.
#[derive(Debug, Clone)]
pub struct Normalizer<E = FfmpegEncoder> {
    encoder: E,
    options: EncodeOptions,
    temp_suffix: String,
    keep_temp_on_failure: bool,
}

impl Normalizer<FfmpegEncoder> {
    /// Build a normalizer running the ffmpeg binary named in `config`
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        Normalizer::with_config(FfmpegEncoder::new(&config.encoder.ffmpeg_path), config)
    }
}

impl<E: AudioEncoder> Normalizer<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            options: EncodeOptions::default(),
            temp_suffix: DEFAULT_TEMP_SUFFIX.to_string(),
            keep_temp_on_failure: false,
        }
    }

    pub fn with_config(encoder: E, config: &NormalizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            encoder,
            options: EncodeOptions::default(),
            temp_suffix: config.temp_suffix.clone(),
            keep_temp_on_failure: config.keep_temp_on_failure,
        })
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Decide what to do with `file` without running the encoder.
    ///
    /// Only `.wav` files have their header read.
    pub async fn plan(&self, file: &AudioFile) -> Result<Action> {
        let path = file.path();
        tracing::debug!(path = %path.display(), "Checking if the file is a valid WAV");

        if !file.is_wav() {
            let destination = file.wav_sibling();
            tracing::debug!(
                destination = %destination.display(),
                "Converting to a new WAV file"
            );
            return Ok(Action::EncodeToSibling { destination });
        }

        if header::is_conforming_wav(path).await? {
            tracing::debug!(path = %path.display(), "File is a valid WAV file");
            Ok(Action::PassThrough)
        } else {
            tracing::debug!(
                path = %path.display(),
                "File has a .wav extension but is not a valid WAV, overwriting"
            );
            Ok(Action::ReencodeInPlace {
                temp: file.temp_sibling(&self.temp_suffix),
            })
        }
    }

    /// Normalize the file at `path`.
    ///
    /// Returns the path of a conforming WAV: the input itself when it
    /// already conforms or was re-encoded in place, otherwise the new
    /// `.wav` sibling.
    pub async fn normalize(&self, path: impl AsRef<Path>) -> Result<ConversionOutcome> {
        let path = path.as_ref();
        ensure_exists(path).await?;
        let file = AudioFile::new(path)?;

        match self.plan(&file).await? {
            Action::PassThrough => Ok(ConversionOutcome::Unchanged(file.path)),
            Action::ReencodeInPlace { temp } => {
                self.reencode_in_place(&file, &temp).await?;
                Ok(ConversionOutcome::Replaced(file.path))
            }
            Action::EncodeToSibling { destination } => {
                self.run_encoder(file.path(), &destination).await?;
                Ok(ConversionOutcome::Created(destination))
            }
        }
    }

    async fn reencode_in_place(&self, file: &AudioFile, temp: &Path) -> Result<()> {
        // Cleanup after a failed encode removes `temp`, which must never be the input
        if temp == file.path() {
            return Err(NormalizeError::Config(format!(
                "temporary file {} would overwrite the input",
                temp.display()
            )));
        }

        if let Err(err) = self.run_encoder(file.path(), temp).await {
            self.discard_temp(temp).await;
            return Err(err);
        }

        // rename(2) replaces the destination atomically
        if let Err(source) = tokio::fs::rename(temp, file.path()).await {
            self.discard_temp(temp).await;
            return Err(NormalizeError::Rename {
                from: temp.to_path_buf(),
                to: file.path().to_path_buf(),
                source,
            });
        }

        tracing::debug!(path = %file.path().display(), "Replaced file with re-encoded WAV");
        Ok(())
    }

    async fn run_encoder(&self, source: &Path, destination: &Path) -> Result<()> {
        let output = self
            .encoder
            .encode(source, destination, &self.options)
            .await?;

        if !output.success() {
            tracing::debug!(
                source = %source.display(),
                code = ?output.exit_code,
                "Encoder failed"
            );
            return Err(NormalizeError::EncoderFailure {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    async fn discard_temp(&self, temp: &Path) {
        if self.keep_temp_on_failure {
            return;
        }
        match tokio::fs::remove_file(temp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(temp = %temp.display(), "Failed to remove temporary file: {}", e);
            }
        }
    }
}
