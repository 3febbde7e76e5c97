//! Episode assembly integration tests
//!
//! Drives `EpisodeAssembler` end to end with generated WAV clips and checks
//! overlap placement, stereo positioning, path selection and the
//! equivalence of the in-memory and streaming paths.

mod helpers;

use helpers::{frames_for, padded_sine_wav, rms, sine_wav, sine_wav_at, TEST_SAMPLE_RATE};
use podmix_common::MixingSettings;
use podmix_mixer::audio::decoder::decode_audio;
use podmix_mixer::mix::intro_outro::{IntroPhases, IntroStrategy, OutroPhases, OutroStrategy};
use podmix_mixer::mix::OverlapRule;
use podmix_mixer::{
    AssemblyPath, AudioSegment, EpisodeAssembler, Error, MixConfig, Phase, Speaker,
};
use std::sync::{Arc, Mutex};

fn line(speaker: Speaker, text: &str, duration_ms: u64) -> AudioSegment {
    let frequency = match speaker {
        Speaker::Host => 220.0,
        Speaker::Guest => 330.0,
    };
    AudioSegment::new(sine_wav(duration_ms, frequency, 0.5, 1), speaker, text)
}

fn example_episode(guest_text: &str) -> Vec<AudioSegment> {
    vec![
        line(Speaker::Host, "Welcome to the show!", 2000),
        line(Speaker::Guest, guest_text, 1500),
        line(Speaker::Host, "Sure, go ahead", 1000),
    ]
}

/// Alternating lines of varied length and pacing cues
fn conversation(count: usize) -> Vec<AudioSegment> {
    let texts = [
        "So tell me how this whole thing started.",
        "It started with a very small experiment in the garage.",
        "Really? How small are we talking?",
        "[laughs] Smaller than you would believe, honestly...",
        "Okay",
        "[interrupting] And that is when the real trouble began.",
    ];
    (0..count)
        .map(|i| {
            let speaker = if i % 2 == 0 { Speaker::Host } else { Speaker::Guest };
            let duration_ms = 700 + (i as u64 % 4) * 250;
            line(speaker, texts[i % texts.len()], duration_ms).overlapping(i % 7 == 5)
        })
        .collect()
}

fn short_music_config() -> MixConfig {
    let mut config = MixConfig::default();
    config.intro = Some(IntroStrategy::Parametric(IntroPhases {
        music_solo_ms: 500,
        bed_volume: 0.2,
        dialogue_fade_in_ms: 300,
        bed_hold_ms: 600,
        fade_out_ms: 400,
        fade_out_curve: podmix_common::FadeCurve::Exponential,
    }));
    config.outro = Some(OutroStrategy::Parametric(OutroPhases {
        rise_ms: 300,
        rise_curve: podmix_common::FadeCurve::Linear,
        bed_volume: 0.2,
        hold_ms: 400,
        crossfade_ms: 300,
        tail_ms: 800,
        final_fade_ms: 300,
    }));
    config
}

fn music() -> (Vec<u8>, Vec<u8>) {
    (sine_wav(6000, 110.0, 0.6, 2), sine_wav(6000, 165.0, 0.6, 2))
}

#[test]
fn test_example_episode_timing_and_rules() {
    let mut assembler = EpisodeAssembler::new(MixConfig::default());
    let episode = assembler
        .assemble_with_music(example_episode("[interrupting] Wait, actually"), None, None)
        .unwrap();

    let report = &episode.report;
    assert_eq!(report.path, AssemblyPath::InMemory);
    assert_eq!(report.segments, 3);
    assert_eq!(report.overlaps.len(), 2);

    assert_eq!(report.overlaps[0].rule, OverlapRule::Interrupt);
    assert_eq!(report.overlaps[0].frames, 7938);
    assert!(!report.overlaps[0].additive);
    assert_eq!(report.overlaps[1].rule, OverlapRule::SpeakerChange);
    assert_eq!(report.overlaps[1].frames, 2205);

    // 2.0 + 1.5 + 1.0 s minus 180 ms and 50 ms
    assert_eq!(report.total_samples, 88200 + 66150 + 44100 - 7938 - 2205);
    assert!((report.duration_ms - 4270.0).abs() < 1000.0 / 44100.0);
    assert!((report.consumed_overlap_ms - 230.0).abs() < 0.1);
    assert_eq!(report.outro_start_ms, None);
}

#[test]
fn test_example_episode_trail_off_variant() {
    let mut assembler = EpisodeAssembler::new(MixConfig::default());
    let episode = assembler
        .assemble_with_music(example_episode("[interrupting] Wait, actually..."), None, None)
        .unwrap();

    let overlaps = &episode.report.overlaps;
    assert_eq!(overlaps[0].rule, OverlapRule::Interrupt);
    // Trailing ellipsis on the guest line draws the host in early
    assert_eq!(overlaps[1].rule, OverlapRule::TrailOff);
    assert_eq!(overlaps[1].frames, 7938);
    assert_eq!(episode.report.total_samples, 198450 - 7938 - 7938);
}

#[test]
fn test_example_episode_stereo_placement() {
    let config = MixConfig::default();
    let mut assembler = EpisodeAssembler::new(config.clone());
    let episode = assembler
        .assemble_with_music(example_episode("[interrupting] Wait, actually"), None, None)
        .unwrap();

    let decoded = decode_audio(&episode.mp3, &config).unwrap();
    assert!(decoded.frames() >= episode.report.total_samples);

    // Host alone: 0.1 s to 1.6 s
    let host_left = rms(&decoded.left, 4410, 70560);
    let host_right = rms(&decoded.right, 4410, 70560);
    assert!(
        host_left > host_right * 1.3,
        "host should sit left: L={} R={}",
        host_left,
        host_right
    );

    // Guest alone: ~2.1 s to ~3.2 s
    let guest_left = rms(&decoded.left, 92000, 140000);
    let guest_right = rms(&decoded.right, 92000, 140000);
    assert!(
        guest_right > guest_left * 1.3,
        "guest should sit right: L={} R={}",
        guest_left,
        guest_right
    );
}

#[test]
fn test_explicit_overlap_is_additive() {
    let segments = vec![
        line(Speaker::Host, "So here is the thing about all of it", 3000),
        line(Speaker::Guest, "Yeah!", 800).overlapping(true),
    ];
    let mut assembler = EpisodeAssembler::new(MixConfig::default());
    let episode = assembler.assemble_with_music(segments, None, None).unwrap();

    let overlap = &episode.report.overlaps[0];
    assert_eq!(overlap.rule, OverlapRule::Overlapping);
    assert!(overlap.additive);
    // min(600, 40% of 3000, 95% of 800) ms
    assert_eq!(overlap.frames, frames_for(600, TEST_SAMPLE_RATE));
}

#[test]
fn test_report_carries_edge_silence_per_line() {
    let segments = vec![
        AudioSegment::new(padded_sine_wav(200, 1000, 100, 220.0, 0.5), Speaker::Host, "Welcome to the show!"),
        AudioSegment::new(padded_sine_wav(0, 1000, 350, 330.0, 0.5), Speaker::Guest, "Thanks for having me."),
    ];

    let mut assembler = EpisodeAssembler::new(MixConfig::default());
    let report = assembler.assemble_with_music(segments, None, None).unwrap().report;

    // A sine starts at zero, so the first tone frame counts as silence
    let frame_ms = 1000.0 / TEST_SAMPLE_RATE as f64;
    let silences = &report.silences;
    assert_eq!(silences.len(), 2);
    assert_eq!((silences[0].index, silences[1].index), (0, 1));
    assert!((silences[0].leading_ms - (200.0 + frame_ms)).abs() < 0.01, "{:?}", silences[0]);
    assert!((silences[0].trailing_ms - 100.0).abs() < 0.01, "{:?}", silences[0]);
    assert!((silences[1].leading_ms - frame_ms).abs() < 0.01, "{:?}", silences[1]);
    assert!((silences[1].trailing_ms - 350.0).abs() < 0.01, "{:?}", silences[1]);
}

#[test]
fn test_single_segment_passthrough_returns_input_bytes() {
    let audio = sine_wav(1200, 440.0, 0.5, 2);
    let segment = AudioSegment::new(audio.clone(), Speaker::Guest, "Just me today.");

    let mut assembler = EpisodeAssembler::new(MixConfig::default());
    let episode = assembler.assemble_with_music(vec![segment], None, None).unwrap();

    assert_eq!(episode.report.path, AssemblyPath::Passthrough);
    assert!(episode.report.silences.is_empty());
    assert_eq!(episode.mp3, audio);
}

#[test]
fn test_single_segment_with_music_is_mixed() {
    let config = short_music_config();
    let (intro, outro) = music();
    let segment = line(Speaker::Host, "A very short episode today.", 2500);

    let mut assembler = EpisodeAssembler::new(config);
    let episode = assembler
        .assemble_with_music(vec![segment], Some(&intro), Some(&outro))
        .unwrap();

    assert_eq!(episode.report.path, AssemblyPath::InMemory);
    assert!(episode.report.outro_start_ms.is_some());
    // Solo music, all dialogue, outro tail
    assert_eq!(
        episode.report.total_samples,
        frames_for(500, TEST_SAMPLE_RATE)
            + frames_for(2500, TEST_SAMPLE_RATE)
            + frames_for(800, TEST_SAMPLE_RATE)
    );
}

#[test]
fn test_empty_episode_rejected() {
    let mut assembler = EpisodeAssembler::new(MixConfig::default());
    let err = assembler.assemble_with_music(Vec::new(), None, None).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_missing_music_for_enabled_intro() {
    let mut assembler = EpisodeAssembler::new(short_music_config());
    let err = assembler
        .assemble_with_music(example_episode("Hello"), None, None)
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Mix));
    assert!(matches!(err.root(), Error::Config(_)));
}

#[test]
fn test_decode_failure_names_segment() {
    let segments = vec![
        line(Speaker::Host, "Fine line", 1000),
        AudioSegment::new(b"RIFF\x00\x00\x00\x00WAVEjunk".to_vec(), Speaker::Guest, "Broken"),
        line(Speaker::Host, "Never reached", 1000),
    ];

    for path in [AssemblyPath::InMemory, AssemblyPath::Streaming] {
        let mut assembler = EpisodeAssembler::new(MixConfig::default()).with_path(path);
        let err = assembler
            .assemble_with_music(segments.clone(), None, None)
            .unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Decode), "{:?}", path);
        assert!(matches!(err.root(), Error::Decode(_)));
        assert!(err.to_string().contains("segment 1"), "{}", err);
    }
}

#[test]
fn test_segments_resampled_to_working_rate() {
    let segments = vec![
        AudioSegment::new(sine_wav_at(1000, 220.0, 0.5, 1, 22050), Speaker::Host, "First one here."),
        AudioSegment::new(sine_wav_at(1000, 330.0, 0.5, 2, 48000), Speaker::Host, "Second one there."),
    ];

    let mut assembler = EpisodeAssembler::new(MixConfig::default());
    let episode = assembler.assemble_with_music(segments, None, None).unwrap();

    // Same speaker: no overlap
    assert_eq!(episode.report.overlaps[0].rule, OverlapRule::SameSpeaker);
    let total = episode.report.total_samples as i64;
    assert!((total - 88200).abs() <= 2, "total {}", total);
}

#[test]
fn test_large_episode_selects_streaming() {
    let mut config = MixConfig::default();
    config.large_scale_threshold = 4;

    let mut assembler = EpisodeAssembler::new(config);
    let episode = assembler
        .assemble_with_music(conversation(6), None, None)
        .unwrap();

    assert_eq!(episode.report.path, AssemblyPath::Streaming);
    assert_eq!(episode.report.overlaps.len(), 5);
}

#[test]
fn test_in_memory_and_streaming_match_without_music() {
    let segments = conversation(9);

    let mut in_memory = EpisodeAssembler::new(MixConfig::default()).with_path(AssemblyPath::InMemory);
    let mut streaming = EpisodeAssembler::new(MixConfig::default()).with_path(AssemblyPath::Streaming);

    let a = in_memory.assemble_with_music(segments.clone(), None, None).unwrap();
    let b = streaming.assemble_with_music(segments, None, None).unwrap();

    assert_eq!(a.report.path, AssemblyPath::InMemory);
    assert_eq!(b.report.path, AssemblyPath::Streaming);
    assert_eq!(a.report.total_samples, b.report.total_samples);
    assert_eq!(a.report.overlaps, b.report.overlaps);
}

#[test]
fn test_in_memory_and_streaming_match_with_parametric_music() {
    let config = short_music_config();
    let (intro, outro) = music();
    let segments = conversation(8);

    let mut in_memory = EpisodeAssembler::new(config.clone()).with_path(AssemblyPath::InMemory);
    let mut streaming = EpisodeAssembler::new(config).with_path(AssemblyPath::Streaming);

    let a = in_memory
        .assemble_with_music(segments.clone(), Some(&intro), Some(&outro))
        .unwrap();
    let b = streaming
        .assemble_with_music(segments, Some(&intro), Some(&outro))
        .unwrap();

    assert_eq!(a.report.total_samples, b.report.total_samples);
    assert_eq!(a.report.outro_start_ms, b.report.outro_start_ms);
    assert!(a.report.outro_start_ms.is_some());
}

#[test]
fn test_in_memory_and_streaming_match_with_envelope_music() {
    let mut config = short_music_config();
    if let Some(IntroStrategy::Parametric(phases)) = &config.intro {
        config.intro = Some(IntroStrategy::Envelope(phases.to_envelopes().unwrap()));
    }
    if let Some(OutroStrategy::Parametric(phases)) = &config.outro {
        config.outro = Some(OutroStrategy::Envelope(phases.to_envelopes().unwrap()));
    }
    let (intro, outro) = music();
    let segments = conversation(7);

    let mut in_memory = EpisodeAssembler::new(config.clone()).with_path(AssemblyPath::InMemory);
    let mut streaming = EpisodeAssembler::new(config).with_path(AssemblyPath::Streaming);

    let a = in_memory
        .assemble_with_music(segments.clone(), Some(&intro), Some(&outro))
        .unwrap();
    let b = streaming
        .assemble_with_music(segments, Some(&intro), Some(&outro))
        .unwrap();

    assert_eq!(a.report.total_samples, b.report.total_samples);
    assert_eq!(a.report.outro_start_ms, b.report.outro_start_ms);
}

#[test]
fn test_streaming_with_dialogue_shorter_than_intro_window() {
    let config = short_music_config();
    let (intro, outro) = music();
    let segments = vec![
        line(Speaker::Host, "Hi there.", 400),
        line(Speaker::Guest, "Hello!", 400),
    ];

    let mut in_memory = EpisodeAssembler::new(config.clone()).with_path(AssemblyPath::InMemory);
    let mut streaming = EpisodeAssembler::new(config).with_path(AssemblyPath::Streaming);

    let a = in_memory
        .assemble_with_music(segments.clone(), Some(&intro), Some(&outro))
        .unwrap();
    let b = streaming
        .assemble_with_music(segments, Some(&intro), Some(&outro))
        .unwrap();

    assert_eq!(a.report.total_samples, b.report.total_samples);
}

#[test]
fn test_streaming_progress_is_monotonic() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut assembler = EpisodeAssembler::new(short_music_config())
        .with_path(AssemblyPath::Streaming)
        .with_progress(move |percent| sink.lock().unwrap().push(percent));

    let (intro, outro) = music();
    assembler
        .assemble_with_music(conversation(10), Some(&intro), Some(&outro))
        .unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.len() >= 10);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", *seen);
    assert_eq!(seen.last(), Some(&100));
}

#[test]
fn test_settings_drive_overlap_durations() {
    let mut settings = MixingSettings::default();
    settings.overlap.interrupt_ms = 100;
    settings.overlap.speaker_change_ms = 20;
    let config = MixConfig::from_settings(&settings).unwrap();

    let mut assembler = EpisodeAssembler::new(config);
    let episode = assembler
        .assemble_with_music(example_episode("[interrupting] Wait, actually"), None, None)
        .unwrap();

    assert_eq!(episode.report.overlaps[0].frames, 4410);
    assert_eq!(episode.report.overlaps[1].frames, 882);
    assert_eq!(episode.report.total_samples, 198450 - 4410 - 882);
}
