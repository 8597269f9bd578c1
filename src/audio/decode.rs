//! Audio decoding via symphonia.
//!
//! Uploaded audiobooks arrive in whatever container the browser accepted
//! (MP3, M4A, WAV, FLAC, OGG). Everything downstream works on interleaved
//! 16-bit PCM, so this module exposes exactly two operations: probe the
//! total duration of a file, and decode the samples overlapping a time
//! window.

use anyhow::{anyhow, Context, Result};
use std::io::Cursor;
use std::sync::Arc;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeBase};
use tracing::debug;

/// PCM samples decoded for one context window.
#[derive(Debug, Clone)]
pub struct DecodedSegment {
    /// Interleaved 16-bit samples.
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedSegment {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Shared file bytes, readable without copying the whole buffer per decode.
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

struct OpenTrack {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    time_base: Option<TimeBase>,
    n_frames: Option<u64>,
}

fn open_track(bytes: Arc<Vec<u8>>, extension: Option<&str>) -> Result<OpenTrack> {
    let stream = MediaSourceStream::new(
        Box::new(Cursor::new(SharedBytes(bytes))),
        Default::default(),
    );

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported or corrupt audio container")?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("No decodable audio track found"))?;

    let decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("Audio track has no sample rate"))?;
    let track_id = track.id;
    let time_base = track.codec_params.time_base;
    let n_frames = track.codec_params.n_frames;

    Ok(OpenTrack {
        track_id,
        sample_rate,
        time_base,
        n_frames,
        format,
        decoder,
    })
}

/// Probe the total duration of an audio file in seconds.
///
/// Uses the container's frame count when available and falls back to a full
/// decode for containers that do not declare one.
pub fn probe_duration(bytes: Arc<Vec<u8>>, extension: Option<&str>) -> Result<f64> {
    let mut track = open_track(bytes, extension)?;

    if let Some(n_frames) = track.n_frames {
        return Ok(n_frames as f64 / track.sample_rate as f64);
    }

    // No declared length; count decoded frames.
    let mut total_frames: u64 = 0;
    loop {
        let packet = match track.format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e).context("Failed to read audio packet"),
        };

        if packet.track_id() != track.track_id {
            continue;
        }

        match track.decoder.decode(&packet) {
            Ok(decoded) => total_frames += decoded.frames() as u64,
            // Skip over malformed packets; partial files still get a duration.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Failed to decode audio packet"),
        }
    }

    Ok(total_frames as f64 / track.sample_rate as f64)
}

/// Decode the interleaved PCM samples overlapping `[start_seconds, end_seconds)`.
///
/// Seeks to the window start where the container supports it, otherwise
/// decodes from the beginning and discards frames before the window.
pub fn decode_window(
    bytes: Arc<Vec<u8>>,
    extension: Option<&str>,
    start_seconds: f64,
    end_seconds: f64,
) -> Result<DecodedSegment> {
    let mut track = open_track(bytes, extension)?;
    let sample_rate = track.sample_rate;

    let mut segment = DecodedSegment {
        samples: Vec::new(),
        sample_rate,
        channels: 0,
    };

    if end_seconds <= start_seconds {
        return Ok(segment);
    }

    let start_frame = (start_seconds.max(0.0) * sample_rate as f64) as u64;
    let end_frame = (end_seconds * sample_rate as f64).ceil() as u64;

    // Best effort: jump near the window start. Non-seekable containers fall
    // back to decoding from the top.
    let seek_to = SeekTo::Time {
        time: Time::from(start_seconds.max(0.0)),
        track_id: Some(track.track_id),
    };
    if track.format.seek(SeekMode::Accurate, seek_to).is_ok() {
        track.decoder.reset();
    }

    // Frame position of the next packet when the container gives no
    // timestamps we can convert.
    let mut fallback_frame: u64 = 0;

    loop {
        let packet = match track.format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e).context("Failed to read audio packet"),
        };

        if packet.track_id() != track.track_id {
            continue;
        }

        let decoded = match track.decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Failed to decode audio packet"),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let frames = decoded.frames() as u64;

        let packet_start = match track.time_base {
            Some(tb) => {
                let t = tb.calc_time(packet.ts());
                ((t.seconds as f64 + t.frac) * sample_rate as f64).round() as u64
            }
            None => fallback_frame,
        };
        fallback_frame = packet_start + frames;

        if packet_start >= end_frame {
            break;
        }
        if packet_start + frames <= start_frame {
            continue;
        }

        if segment.channels == 0 {
            segment.channels = channels as u16;
        }

        let mut buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        let lo = start_frame.saturating_sub(packet_start).min(frames) as usize;
        let hi = (end_frame.saturating_sub(packet_start)).min(frames) as usize;
        segment
            .samples
            .extend_from_slice(&buf.samples()[lo * channels..hi * channels]);
    }

    debug!(
        "Decoded window {:.2}s-{:.2}s: {} samples at {}Hz",
        start_seconds,
        end_seconds,
        segment.samples.len(),
        sample_rate
    );

    Ok(segment)
}
