//! Session lifecycle against a real settings file.

use std::sync::{Arc, Mutex};

use barplay_core::indicators::IndicatorKind;
use barplay_core::render::RecordingSink;
use barplay_core::replay::ManualClock;
use barplay_core::settings::keys;
use barplay_core::{
    ChartConfig, ChartSession, JsonFileStore, ReplayStatus, Theme, Timeframe, ViewMode,
};

fn config() -> ChartConfig {
    ChartConfig {
        synthetic_bars: 60,
        default_speed_ms: 100,
        ..ChartConfig::default()
    }
}

#[test]
fn reload_resumes_previous_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("barplay").join("settings.json");
    let mut sink = RecordingSink::new();

    {
        let mut session = ChartSession::new(config(), JsonFileStore::open(&path), ManualClock::new());
        session.start(&mut sink);
        session.set_symbol("ACME", &mut sink);
        session.set_timeframe(Timeframe::Hour4, &mut sink);
        session.toggle_theme();
        session.set_indicator_period(IndicatorKind::MovingAverage, 9, &mut sink);
        session.toggle_indicator(IndicatorKind::MovingAverage, &mut sink);
    }

    let mut sink = RecordingSink::new();
    let mut session = ChartSession::new(config(), JsonFileStore::open(&path), ManualClock::new());
    session.start(&mut sink);
    let s = session.settings();
    assert_eq!(s.symbol, "ACME");
    assert_eq!(s.timeframe, Timeframe::Hour4);
    assert_eq!(s.theme, Theme::Dark);
    assert_eq!(s.moving_average_period, 9);
    assert!(s.moving_average_enabled);
    assert!(!s.oscillator_enabled);
    assert_eq!(sink.overlay(IndicatorKind::MovingAverage).map(|p| p.len()), Some(52));
}

#[test]
fn same_symbol_and_timeframe_reproduce_the_same_bars() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut sink = RecordingSink::new();

    let mut a = ChartSession::new(config(), JsonFileStore::open(&path), ManualClock::new());
    a.start(&mut sink);
    let mut b = ChartSession::new(config(), JsonFileStore::open(&path), ManualClock::new());
    b.start(&mut sink);
    assert_eq!(a.bars().as_slice(), b.bars().as_slice());
}

#[test]
fn subscribers_see_every_write() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let log = Arc::clone(&seen);
    let mut sink = RecordingSink::new();

    let mut session = ChartSession::new(
        config(),
        JsonFileStore::open(dir.path().join("s.json")),
        ManualClock::new(),
    );
    session.subscribe_settings(Box::new(move |key, _| log.lock().unwrap().push(key.to_string())));
    session.start(&mut sink);
    session.toggle_indicator(IndicatorKind::Oscillator, &mut sink);
    session.adjust_indicator_period(IndicatorKind::Oscillator, 1, &mut sink);
    session.cycle_symbol(&mut sink);

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[keys::OSCILLATOR_ENABLED, keys::OSCILLATOR_PERIOD, keys::SYMBOL]
    );
}

#[test]
fn symbol_change_while_playing_leaves_no_orphan_ticks() {
    let clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let dir = tempfile::tempdir().unwrap();
    let mut session =
        ChartSession::new(config(), JsonFileStore::open(dir.path().join("s.json")), clock.clone());
    session.start(&mut sink);
    session.play(&mut sink);
    clock.advance_ms(500);
    assert_eq!(session.poll(&mut sink), 5);
    let appended_before = sink.appended.len();

    session.cycle_symbol(&mut sink);
    assert_eq!(session.replay_state().status, ReplayStatus::Stopped);
    assert_eq!(session.view(), ViewMode::Full);
    assert!(!session.replay().timer_armed());

    clock.advance_ms(60_000);
    assert_eq!(session.poll(&mut sink), 0);
    assert_eq!(sink.appended.len(), appended_before);
    assert_eq!(sink.candles.len(), 60);
}

#[test]
fn replay_runs_to_completion_with_overlays() {
    let clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let dir = tempfile::tempdir().unwrap();
    let mut session =
        ChartSession::new(config(), JsonFileStore::open(dir.path().join("s.json")), clock.clone());
    session.start(&mut sink);
    session.toggle_indicator(IndicatorKind::MovingAverage, &mut sink);
    let full_overlay = sink.overlay(IndicatorKind::MovingAverage).map(|p| p.to_vec());

    session.play(&mut sink);
    let mut revealed = 0;
    while session.replay_state().status == ReplayStatus::Playing {
        clock.advance_ms(100);
        revealed += session.poll(&mut sink);
    }
    assert_eq!(revealed, 60);
    assert_eq!(sink.appended.len(), 60);
    assert_eq!(sink.overlay(IndicatorKind::MovingAverage).map(|p| p.to_vec()), full_overlay);
}
