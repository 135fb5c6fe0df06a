//! Minimal WAV container inspection.
//!
//! Reads playback duration from the RIFF chunk headers without decoding any
//! samples: duration is the `data` chunk size divided by the byte rate
//! declared in the `fmt ` chunk.

use std::path::Path;

/// Byte offset of the byte-rate field inside the `fmt ` chunk body
/// (audio format u16, channels u16, sample rate u32, then byte rate u32).
const FMT_BYTE_RATE_OFFSET: usize = 8;

/// Returns the duration in seconds of a WAV file's contents.
///
/// Returns 0.0 if the bytes are not a well-formed RIFF/WAVE container or
/// the `fmt `/`data` chunks are missing or unusable. Pure function over the
/// file bytes; no side effects.
pub fn wav_duration_seconds(bytes: &[u8]) -> f64 {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return 0.0;
    }

    let fmt = match find_chunk(bytes, b"fmt ") {
        Some(chunk) => chunk,
        None => return 0.0,
    };
    let data = match find_chunk(bytes, b"data") {
        Some(chunk) => chunk,
        None => return 0.0,
    };

    let rate_at = fmt.offset + FMT_BYTE_RATE_OFFSET;
    if rate_at + 4 > bytes.len() {
        return 0.0;
    }
    let byte_rate = u32::from_le_bytes([
        bytes[rate_at],
        bytes[rate_at + 1],
        bytes[rate_at + 2],
        bytes[rate_at + 3],
    ]);
    if byte_rate == 0 {
        tracing::debug!("wav fmt chunk declares zero byte rate");
        return 0.0;
    }

    data.size as f64 / byte_rate as f64
}

/// Reads a WAV file and returns its duration in seconds.
///
/// Returns 0.0 when the file cannot be read or is malformed, mirroring
/// [`wav_duration_seconds`].
pub async fn wav_file_duration_seconds(path: impl AsRef<Path>) -> f64 {
    match tokio::fs::read(path.as_ref()).await {
        Ok(bytes) => wav_duration_seconds(&bytes),
        Err(e) => {
            tracing::debug!(path = %path.as_ref().display(), "wav read failed: {}", e);
            0.0
        }
    }
}

struct Chunk {
    /// Offset of the chunk body (past the 8-byte header).
    offset: usize,
    /// Declared body size.
    size: u32,
}

/// Linearly scans sub-chunk headers starting after the 12-byte RIFF header.
fn find_chunk(bytes: &[u8], id: &[u8; 4]) -> Option<Chunk> {
    let mut i = 12usize;
    while i + 8 <= bytes.len() {
        let size = u32::from_le_bytes([bytes[i + 4], bytes[i + 5], bytes[i + 6], bytes[i + 7]]);
        if &bytes[i..i + 4] == id {
            return Some(Chunk {
                offset: i + 8,
                size,
            });
        }
        i = i.checked_add(8 + size as usize)?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal valid WAV: RIFF header, 16-byte fmt chunk, and a
    /// data chunk whose size is declared but whose body is elided (the
    /// parser only reads headers).
    fn minimal_wav(byte_rate: u32, data_size: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&36u32.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&16000u32.to_le_bytes()); // sample rate
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes()); // block align
        buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        buf
    }

    #[test]
    fn duration_is_data_size_over_byte_rate() {
        let wav = minimal_wav(32000, 64000);
        assert!((wav_duration_seconds(&wav) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn missing_magic_yields_zero() {
        assert_eq!(wav_duration_seconds(b"OggS not a wav at all"), 0.0);
        assert_eq!(wav_duration_seconds(b""), 0.0);
        // Correct RIFF marker but wrong form type.
        let mut wav = minimal_wav(32000, 64000);
        wav[8..12].copy_from_slice(b"AVI ");
        assert_eq!(wav_duration_seconds(&wav), 0.0);
    }

    #[test]
    fn zero_byte_rate_yields_zero() {
        let wav = minimal_wav(0, 64000);
        assert_eq!(wav_duration_seconds(&wav), 0.0);
    }

    #[test]
    fn missing_data_chunk_yields_zero() {
        let wav = minimal_wav(32000, 64000);
        // Truncate before the data chunk header.
        assert_eq!(wav_duration_seconds(&wav[..36]), 0.0);
    }

    #[test]
    fn skips_unknown_chunks_before_fmt() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        // A LIST chunk the scanner must step over.
        buf.extend_from_slice(b"LIST");
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(b"INFO");
        let tail = minimal_wav(32000, 16000);
        buf.extend_from_slice(&tail[12..]);
        assert!((wav_duration_seconds(&buf) - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn file_helper_reads_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        tokio::fs::write(&path, minimal_wav(32000, 32000))
            .await
            .unwrap();
        assert!((wav_file_duration_seconds(&path).await - 1.0).abs() < 1e-9);
        assert_eq!(wav_file_duration_seconds(dir.path().join("nope.wav")).await, 0.0);
    }
}
