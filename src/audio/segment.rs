//! Temporary WAV segments for transcription uploads.
//!
//! The transcription API receives only the slice of audio covering one
//! context window. The slice is written to a uuid-named WAV file in the
//! system temp directory and removed again as soon as the request is done,
//! on success and failure paths alike.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use super::decode::{decode_window, DecodedSegment};
use super::source::AudioSource;

/// A WAV file on disk that deletes itself when dropped.
pub struct SegmentFile {
    path: PathBuf,
}

impl SegmentFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode decoded PCM into a temp WAV file.
    pub fn write(segment: &DecodedSegment) -> Result<Self> {
        let path = std::env::temp_dir().join(format!("segment-{}.wav", uuid::Uuid::new_v4()));

        let spec = hound::WavSpec {
            channels: segment.channels,
            sample_rate: segment.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let file = SegmentFile { path };

        let mut writer = hound::WavWriter::create(&file.path, spec)
            .with_context(|| format!("Failed to create segment file: {:?}", file.path))?;
        for &sample in &segment.samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to segment WAV")?;
        }
        writer.finalize().context("Failed to finalize segment WAV")?;

        Ok(file)
    }
}

impl Drop for SegmentFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove segment file {:?}: {}", self.path, e);
            }
        }
    }
}

/// Cut `[start_seconds, end_seconds)` out of the source and write it as a
/// temp WAV. Returns `None` when the window contains no audio.
pub fn cut_window(
    source: &AudioSource,
    start_seconds: f64,
    end_seconds: f64,
) -> Result<Option<SegmentFile>> {
    let segment = decode_window(
        Arc::clone(&source.bytes),
        source.extension(),
        start_seconds,
        end_seconds,
    )?;

    if segment.is_empty() {
        return Ok(None);
    }

    Ok(Some(SegmentFile::write(&segment)?))
}
