//! Intro/outro asset retrieval tests
//!
//! A local axum server stands in for the asset host. Fetch failures must
//! fail the episode with fetch-phase context instead of dropping the music.

mod helpers;

use helpers::{sine_wav, AssetServer};
use podmix_common::MixingSettings;
use podmix_mixer::assets::{AssetFetcher, AssetSource};
use podmix_mixer::{AssemblyPath, AudioSegment, EpisodeAssembler, Error, MixConfig, Phase, Speaker};
use std::io::Write;
use std::time::Duration;

fn episode() -> Vec<AudioSegment> {
    vec![
        AudioSegment::new(sine_wav(1500, 220.0, 0.5, 1), Speaker::Host, "Welcome back, everyone."),
        AudioSegment::new(sine_wav(1500, 330.0, 0.5, 1), Speaker::Guest, "Great to be here again."),
    ]
}

fn music_settings(intro: &str, outro: &str) -> MixingSettings {
    let mut settings = MixingSettings::default();
    settings.intro.enabled = true;
    settings.intro.source = Some(intro.to_string());
    settings.intro.music_solo_ms = 500;
    settings.intro.dialogue_fade_in_ms = 200;
    settings.intro.bed_hold_ms = 300;
    settings.intro.fade_out_ms = 300;
    settings.outro.enabled = true;
    settings.outro.source = Some(outro.to_string());
    settings.outro.rise_ms = 200;
    settings.outro.hold_ms = 200;
    settings.outro.crossfade_ms = 200;
    settings.outro.tail_ms = 600;
    settings.outro.final_fade_ms = 200;
    settings
}

#[tokio::test]
async fn test_fetch_url_returns_body() {
    let body = sine_wav(500, 440.0, 0.5, 2);
    let server = AssetServer::start(vec![("/audio/intro.wav", body.clone())]).await;

    let fetcher = AssetFetcher::new(Duration::from_secs(5)).unwrap();
    let fetched = fetcher
        .fetch(&AssetSource::parse(&server.url("/audio/intro.wav")))
        .await
        .unwrap();

    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_fetch_non_success_status_is_error() {
    let server = AssetServer::start(vec![("/audio/intro.wav", vec![1, 2, 3])]).await;

    let fetcher = AssetFetcher::new(Duration::from_secs(5)).unwrap();
    let err = fetcher
        .fetch(&AssetSource::parse(&server.url("/audio/missing.wav")))
        .await
        .unwrap_err();

    match err {
        Error::Fetch(message) => assert!(message.contains("404"), "{}", message),
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_empty_body_is_error() {
    let server = AssetServer::start(vec![("/audio/empty.wav", Vec::new())]).await;

    let fetcher = AssetFetcher::new(Duration::from_secs(5)).unwrap();
    let result = fetcher
        .fetch(&AssetSource::parse(&server.url("/audio/empty.wav")))
        .await;

    assert!(matches!(result, Err(Error::Fetch(_))));
}

#[tokio::test]
async fn test_fetch_local_file() {
    let body = sine_wav(300, 440.0, 0.5, 1);
    let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
    file.write_all(&body).unwrap();
    file.flush().unwrap();

    let fetcher = AssetFetcher::new(Duration::from_secs(5)).unwrap();
    let source = AssetSource::parse(&format!("file://{}", file.path().display()));
    assert!(matches!(source, AssetSource::File(_)));

    assert_eq!(fetcher.fetch(&source).await.unwrap(), body);
}

#[tokio::test]
async fn test_assemble_fetches_music_over_http() {
    let server = AssetServer::start(vec![
        ("/audio/intro.wav", sine_wav(3000, 110.0, 0.5, 2)),
        ("/audio/outro.wav", sine_wav(3000, 165.0, 0.5, 2)),
    ])
    .await;

    let settings = music_settings(&server.url("/audio/intro.wav"), &server.url("/audio/outro.wav"));
    let config = MixConfig::from_settings(&settings).unwrap();

    let mut assembler = EpisodeAssembler::new(config);
    let episode = assembler.assemble(episode()).await.unwrap();

    assert_eq!(episode.report.path, AssemblyPath::InMemory);
    assert!(episode.report.outro_start_ms.is_some());
    // Solo intro music and the outro tail extend the dialogue
    let dialogue_ms = 3000.0 - episode.report.consumed_overlap_ms;
    assert!(
        (episode.report.duration_ms - (dialogue_ms + 500.0 + 600.0)).abs() < 0.1,
        "duration {}",
        episode.report.duration_ms
    );
}

#[tokio::test]
async fn test_unreachable_music_fails_episode() {
    let server = AssetServer::start(vec![("/audio/intro.wav", sine_wav(3000, 110.0, 0.5, 2))]).await;

    let settings = music_settings(&server.url("/audio/intro.wav"), &server.url("/audio/gone.wav"));
    let config = MixConfig::from_settings(&settings).unwrap();

    let mut assembler = EpisodeAssembler::new(config);
    let err = assembler.assemble(episode()).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Fetch));
    assert!(matches!(err.root(), Error::Fetch(_)));
    assert!(err.to_string().contains("outro music"), "{}", err);
}

#[tokio::test]
async fn test_passthrough_skips_fetch() {
    // No server running: a fetch would fail
    let mut settings = MixingSettings::default();
    settings.assets.base_url = "http://127.0.0.1:9".to_string();
    let config = MixConfig::from_settings(&settings).unwrap();

    let audio = sine_wav(800, 440.0, 0.5, 1);
    let mut assembler = EpisodeAssembler::new(config);
    let episode = assembler
        .assemble(vec![AudioSegment::new(audio.clone(), Speaker::Host, "Solo")])
        .await
        .unwrap();

    assert_eq!(episode.report.path, AssemblyPath::Passthrough);
    assert_eq!(episode.mp3, audio);
}
