// Integration tests for windowed decoding and segment cutting
//
// Fixtures are generated WAVs whose sample values equal their frame index,
// so window boundaries can be checked exactly.

use audiobook_assistant::audio::{decode, segment, AudioSource};
use std::sync::Arc;

const RATE: u32 = 8000;

/// Two seconds of mono audio where sample N has value N.
fn counting_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for n in 0..(RATE * 2) {
            writer.write_sample(n as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn wav_source() -> AudioSource {
    AudioSource::ephemeral(counting_wav(), "audio/wav".to_string(), "book.wav".to_string())
}

#[test]
fn probe_duration_reads_the_declared_length() {
    let duration = decode::probe_duration(Arc::new(counting_wav()), Some("wav")).unwrap();
    assert!((duration - 2.0).abs() < 1e-9, "duration was {duration}");
}

#[test]
fn decode_window_cuts_exact_frame_boundaries() {
    let segment =
        decode::decode_window(Arc::new(counting_wav()), Some("wav"), 0.5, 1.0).unwrap();

    assert_eq!(segment.sample_rate, RATE);
    assert_eq!(segment.channels, 1);
    assert_eq!(segment.samples.len(), (RATE / 2) as usize);
    assert_eq!(segment.samples[0], (RATE / 2) as i16);
    assert_eq!(
        *segment.samples.last().unwrap(),
        (RATE - 1) as i16
    );
}

#[test]
fn decode_window_clamps_a_negative_start() {
    let segment =
        decode::decode_window(Arc::new(counting_wav()), Some("wav"), -1.0, 0.25).unwrap();

    assert_eq!(segment.samples.len(), (RATE / 4) as usize);
    assert_eq!(segment.samples[0], 0);
}

#[test]
fn decode_window_past_the_end_is_empty() {
    let segment =
        decode::decode_window(Arc::new(counting_wav()), Some("wav"), 5.0, 6.0).unwrap();
    assert!(segment.is_empty());
}

#[test]
fn garbage_bytes_are_rejected() {
    let result = decode::probe_duration(Arc::new(vec![7u8; 64]), Some("wav"));
    assert!(result.is_err());
}

#[test]
fn cut_window_writes_a_wav_and_cleans_up() {
    let source = wav_source();

    let file = segment::cut_window(&source, 0.25, 0.75).unwrap().unwrap();
    let path = file.path().to_path_buf();

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().sample_rate, RATE);
    assert_eq!(reader.len(), RATE / 2);
    drop(reader);

    drop(file);
    assert!(!path.exists(), "segment file should be removed on drop");
}

#[test]
fn cut_window_with_no_audio_yields_nothing() {
    let source = wav_source();
    assert!(segment::cut_window(&source, 10.0, 12.0).unwrap().is_none());
}
