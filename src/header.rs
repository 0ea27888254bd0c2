//! WAV header inspection
//!
//! Decides from the first bytes of a file whether it is already a WAV
//! container at the sample rate the speech pipeline expects. Only the
//! container magic and the sample rate field are looked at; channel count
//! and bit depth are trusted as-is.

use std::path::Path;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;

use crate::error::{NormalizeError, Result};

/// Size of a canonical WAV header; nothing past it is ever read
pub const WAV_HEADER_LEN: u64 = 44;

/// Sample rate a pass-through file must report
pub const REQUIRED_SAMPLE_RATE: u32 = 16_000;

/// Byte offset of the little-endian sample rate in the `fmt ` chunk
const SAMPLE_RATE_OFFSET: usize = 24;

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const RIFX_MAGIC: &[u8; 4] = b"RIFX";

/// Minimal parsed view of a WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeaderSnapshot {
    riff_magic: Option<[u8; 4]>,
    sample_rate: Option<u32>,
}

impl WavHeaderSnapshot {
    /// Parse the leading bytes of a file.
    ///
    /// `riff_magic` is only set when at least four bytes were available;
    /// `sample_rate` only when the buffer reaches past offset 27.
    pub fn parse(data: &[u8]) -> Self {
        let riff_magic = data.get(..4).map(|m| [m[0], m[1], m[2], m[3]]);
        let sample_rate = data
            .get(SAMPLE_RATE_OFFSET..SAMPLE_RATE_OFFSET + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));

        Self {
            riff_magic,
            sample_rate,
        }
    }

    pub fn riff_magic(&self) -> Option<[u8; 4]> {
        self.riff_magic
    }

    /// Sample rate read at offset 24. Always little-endian, RIFX included.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Whether the magic reads `RIFF` or `RIFX`
    pub fn has_wav_magic(&self) -> bool {
        matches!(&self.riff_magic, Some(m) if m == RIFF_MAGIC || m == RIFX_MAGIC)
    }

    /// Whether the file can be passed through without re-encoding
    pub fn is_conforming(&self) -> bool {
        self.has_wav_magic() && self.sample_rate == Some(REQUIRED_SAMPLE_RATE)
    }
}

/// Read at most [`WAV_HEADER_LEN`] bytes from `path` and parse them.
pub async fn read_header(path: &Path) -> Result<WavHeaderSnapshot> {
    let read_err = |source| NormalizeError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(read_err)?;
    let mut reader = file.take(WAV_HEADER_LEN);
    let mut data = BytesMut::with_capacity(WAV_HEADER_LEN as usize);

    // Short reads are fine, keep going until the bounded reader hits EOF
    loop {
        let n = reader.read_buf(&mut data).await.map_err(read_err)?;
        if n == 0 {
            break;
        }
    }

    Ok(WavHeaderSnapshot::parse(&data))
}

/// Check whether `path` is a WAV file sampled at 16 kHz.
///
/// Never fails for a readable file; a file that cannot be opened or read
/// yields [`NormalizeError::FileRead`].
pub async fn is_conforming_wav(path: &Path) -> Result<bool> {
    let snapshot = read_header(path).await?;
    tracing::trace!(
        path = %path.display(),
        sample_rate = ?snapshot.sample_rate(),
        magic_ok = snapshot.has_wav_magic(),
        "Parsed WAV header"
    );
    Ok(snapshot.is_conforming())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::build_wav_header;

    #[test]
    fn test_rejects_empty_and_short_input() {
        assert!(!WavHeaderSnapshot::parse(&[]).is_conforming());
        assert!(!WavHeaderSnapshot::parse(b"RIF").is_conforming());
        assert_eq!(WavHeaderSnapshot::parse(b"RIF").riff_magic(), None);
    }

    #[test]
    fn test_rejects_foreign_magic_regardless_of_rate() {
        for magic in [b"RIFZ", b"riff", b"ID3\x03", b"fLaC", b"OggS"] {
            let mut header = build_wav_header(REQUIRED_SAMPLE_RATE, 1, 16);
            header[..4].copy_from_slice(magic);
            let snapshot = WavHeaderSnapshot::parse(&header);
            assert_eq!(snapshot.sample_rate(), Some(16_000));
            assert!(!snapshot.is_conforming(), "{:?}", magic);
        }
    }

    #[test]
    fn test_accepts_16k_riff_and_rifx() {
        let mut header = build_wav_header(16_000, 1, 16);
        assert!(WavHeaderSnapshot::parse(&header).is_conforming());

        header[..4].copy_from_slice(b"RIFX");
        assert!(WavHeaderSnapshot::parse(&header).is_conforming());
    }

    #[test]
    fn test_rejects_other_sample_rates() {
        for rate in [8_000, 15_999, 16_001, 22_050, 44_100, 48_000] {
            let header = build_wav_header(rate, 1, 16);
            let snapshot = WavHeaderSnapshot::parse(&header);
            assert_eq!(snapshot.sample_rate(), Some(rate));
            assert!(!snapshot.is_conforming(), "rate {}", rate);
        }
    }

    #[test]
    fn test_channels_and_bit_depth_are_not_checked() {
        let header = build_wav_header(16_000, 2, 24);
        assert!(WavHeaderSnapshot::parse(&header).is_conforming());
    }

    #[test]
    fn test_truncated_header_is_not_conforming() {
        let header = build_wav_header(16_000, 1, 16);
        for len in 4..28 {
            let snapshot = WavHeaderSnapshot::parse(&header[..len]);
            assert!(snapshot.has_wav_magic());
            assert_eq!(snapshot.sample_rate(), None);
            assert!(!snapshot.is_conforming(), "len {}", len);
        }
        // Exactly 28 bytes is enough to read the rate
        assert!(WavHeaderSnapshot::parse(&header[..28]).is_conforming());
    }

    #[tokio::test]
    async fn test_reads_header_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.wav");
        let mut bytes = build_wav_header(16_000, 1, 16);
        bytes.extend(std::iter::repeat(0u8).take(32_000));
        std::fs::write(&path, &bytes).unwrap();

        assert!(is_conforming_wav(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_file_is_not_conforming() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        assert!(!is_conforming_wav(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wav");

        let err = is_conforming_wav(&path).await.unwrap_err();
        assert!(matches!(err, NormalizeError::FileRead { .. }));
    }
}
