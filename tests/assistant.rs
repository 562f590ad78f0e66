//! Assistant pipeline integration tests
//!
//! Tests the recording, upload-payload, and view-state contracts without
//! requiring audio hardware or a running service.

use std::io::Cursor;

use sophia_voice::voice::{RecordingSession, SAMPLE_RATE, samples_to_wav};
use sophia_voice::{Config, Error, ViewState, service, ui};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

#[test]
fn test_finalized_payload_preserves_fragments() {
    let a = generate_sine_samples(440.0, 0.05, 0.3);
    let b = generate_sine_samples(880.0, 0.05, 0.3);

    let mut session = RecordingSession::default();
    session.push(&a);
    session.push(&b);

    // Payload equals a+b concatenated, no drop, no reorder
    let mut expected = a.clone();
    expected.extend_from_slice(&b);
    assert_eq!(session.finalize(), expected);
}

#[test]
fn test_sequential_sessions_are_independent() {
    let first_audio = generate_sine_samples(440.0, 0.05, 0.3);
    let second_audio = generate_sine_samples(220.0, 0.05, 0.3);

    let mut first = RecordingSession::default();
    first.push(&first_audio);
    let first_payload = first.finalize();

    let mut second = RecordingSession::default();
    second.push(&second_audio);
    let second_payload = second.finalize();

    // No fragment leakage between sessions
    assert_eq!(first_payload, first_audio);
    assert_eq!(second_payload, second_audio);
}

#[test]
fn test_upload_payload_is_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");

    let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read.len(), samples.len());
}

#[test]
fn test_successful_reply_drives_view() {
    let config = Config::default();
    let reply = service::parse_reply(
        r#"{"text":"hello","audio_url":"/media/out.mp3"}"#,
        &config.service_origin,
    )
    .unwrap();

    assert_eq!(reply.audio_url, "http://127.0.0.1:8000/media/out.mp3");

    let mut view = ViewState::default();
    view.apply_reply(&reply);

    let rendered = ui::render(&view, &config.assistant_name);
    assert!(rendered.contains("Sophia: hello"));
}

#[test]
fn test_reply_replaces_previous_response() {
    let origin = "http://127.0.0.1:8000";
    let mut view = ViewState::default();

    let first = service::parse_reply(
        r#"{"text":"first","audio_url":"/media/a.mp3"}"#,
        origin,
    )
    .unwrap();
    view.apply_reply(&first);

    let second = service::parse_reply(
        r#"{"text":"second","audio_url":"/media/b.mp3"}"#,
        origin,
    )
    .unwrap();
    view.apply_reply(&second);

    assert_eq!(view.response_text, "second");
    let rendered = ui::render(&view, "Sophia");
    assert!(!rendered.contains("first"));
}

#[test]
fn test_missing_audio_url_leaves_view_untouched() {
    let mut view = ViewState::default();

    // A malformed success response never produces a reply to apply
    let result = service::parse_reply(r#"{"text":"hi"}"#, "http://127.0.0.1:8000");
    assert!(matches!(result, Err(Error::MissingField("audio_url"))));

    // so the response text stays unset
    assert!(view.response_text.is_empty());
    let rendered = ui::render(&view, "Sophia");
    assert!(!rendered.contains("hi"));

    view.clear_audio_url();
    assert_eq!(view, ViewState::default());
}

#[test]
fn test_default_endpoint_matches_service_contract() {
    let config = Config::default();
    assert_eq!(
        config.transcribe_url(),
        "http://127.0.0.1:8000/api/transcribe/"
    );
}
