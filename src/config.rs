//! Normalizer configuration
//!
//! Loaded from an optional TOML file; every field has a default so an
//! empty file (or no file at all) yields a working setup. The output format
//! (16 kHz, mono, `pcm_s16le`) is not configurable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, Result};

/// Suffix appended to the original path for the in-place temporary file
pub const DEFAULT_TEMP_SUFFIX: &str = ".temp.wav";

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Path or name of the ffmpeg binary
    pub ffmpeg_path: PathBuf,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerConfig {
    /// Encoder configuration
    pub encoder: EncoderConfig,

    /// Suffix for the temporary file used when re-encoding in place.
    /// Must end in `.wav`.
    pub temp_suffix: String,

    /// Leave the temporary file behind when re-encoding fails
    pub keep_temp_on_failure: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig::default(),
            temp_suffix: DEFAULT_TEMP_SUFFIX.to_string(),
            keep_temp_on_failure: false,
            log_level: "info".to_string(),
        }
    }
}

impl NormalizerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NormalizeError::Config(format!("{}: {}", path.display(), e)))?;
        let config: NormalizerConfig = toml::from_str(&content)
            .map_err(|e| NormalizeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| NormalizeError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Reject settings that could make the temporary file collide with
    /// the input or keep ffmpeg from choosing the WAV muxer.
    pub fn validate(&self) -> Result<()> {
        // ffmpeg picks the muxer from the output extension
        if !self.temp_suffix.to_lowercase().ends_with(".wav") {
            return Err(NormalizeError::Config(format!(
                "temp_suffix must end in .wav, got {:?}",
                self.temp_suffix
            )));
        }
        if self.temp_suffix.contains(std::path::is_separator) {
            return Err(NormalizeError::Config(format!(
                "temp_suffix must not contain a path separator, got {:?}",
                self.temp_suffix
            )));
        }
        Ok(())
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    NormalizerConfig::default().to_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = NormalizerConfig::default();
        assert_eq!(config.encoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.temp_suffix, ".temp.wav");
        assert!(!config.keep_temp_on_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "log_level = \"debug\"").unwrap();
        writeln!(temp_file, "[encoder]").unwrap();
        writeln!(temp_file, "ffmpeg_path = \"/opt/ffmpeg/bin/ffmpeg\"").unwrap();

        let config = NormalizerConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.encoder.ffmpeg_path,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.temp_suffix, DEFAULT_TEMP_SUFFIX);
    }

    #[test]
    fn test_temp_suffix_must_keep_wav_extension() {
        for suffix in ["", ".tmp", "/../x.wav"] {
            let mut temp_file = NamedTempFile::new().unwrap();
            writeln!(temp_file, "temp_suffix = {:?}", suffix).unwrap();

            let err = NormalizerConfig::from_file(temp_file.path()).unwrap_err();
            assert!(matches!(err, NormalizeError::Config(_)), "{:?}", suffix);
        }
    }

    #[test]
    fn test_output_format_is_not_configurable() {
        for line in ["sample_rate = 44100", "channels = 2", "codec = \"pcm_f32le\""] {
            let mut temp_file = NamedTempFile::new().unwrap();
            writeln!(temp_file, "[encoder]").unwrap();
            writeln!(temp_file, "{}", line).unwrap();

            let err = NormalizerConfig::from_file(temp_file.path()).unwrap_err();
            assert!(matches!(err, NormalizeError::Config(_)), "{}", line);
        }
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "encoder = 12 [").unwrap();

        assert!(NormalizerConfig::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_generate_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        generate_default_config(&path).unwrap();

        assert!(path.exists());
        let loaded = NormalizerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.encoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(loaded.temp_suffix, DEFAULT_TEMP_SUFFIX);
    }
}
