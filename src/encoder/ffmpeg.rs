//! ffmpeg subprocess encoder

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{AudioEncoder, EncodeOptions, EncodeOutput};
use crate::error::{NormalizeError, Result};

/// Runs the `ffmpeg` binary once per encode
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one conversion, in the order ffmpeg expects them.
    ///
    /// Paths are passed through as raw OS strings.
    pub fn build_args(
        source: &Path,
        destination: &Path,
        options: &EncodeOptions,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-nostats", "-loglevel", "error", "-y", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(path_arg(source));
        args.push("-ar".into());
        args.push(options.sample_rate.to_string().into());
        args.push("-ac".into());
        args.push(options.channels.to_string().into());
        args.push("-c:a".into());
        args.push(OsString::from(&options.codec));
        args.push(path_arg(destination));
        args
    }

    /// Whether `<program> -version` runs and exits cleanly
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// A relative path starting with `-` would be parsed as an option
fn path_arg(path: &Path) -> OsString {
    let leading_dash = path.as_os_str().to_string_lossy().starts_with('-');
    if path.is_relative() && leading_dash {
        Path::new(".").join(path).into_os_string()
    } else {
        path.as_os_str().to_os_string()
    }
}

#[async_trait]
impl AudioEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        options: &EncodeOptions,
    ) -> Result<EncodeOutput> {
        let args = Self::build_args(source, destination, options);
        tracing::debug!(program = %self.program.display(), ?args, "Running encoder");

        // Arguments are passed as a vector, never through a shell
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| NormalizeError::EncoderSpawn {
                program: self.program.display().to_string(),
                source,
            })?;

        Ok(EncodeOutput {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
