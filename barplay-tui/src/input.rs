//! Keyboard input dispatch: overlays first, then chart keys.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use barplay_core::indicators::IndicatorKind;
use barplay_core::replay::Clock;
use barplay_core::settings::SettingsStore;
use barplay_core::ViewMode;

use crate::app::{AppState, Overlay};

/// Bars moved per Shift+arrow scroll.
const SCROLL_STEP: usize = 10;

pub fn handle_key<S: SettingsStore, C: Clock>(app: &mut AppState<S, C>, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match &app.overlay {
        Overlay::Help => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ImportPrompt(_) => {
            handle_import_prompt(app, key);
            return;
        }
        Overlay::None => {}
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.running = false;
        return;
    }

    // 2. Chart keys.
    let view = &mut app.view;
    let session = &mut app.session;
    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('?') => app.overlay = Overlay::Help,

        // Replay
        KeyCode::Char(' ') => {
            session.toggle_play(view);
        }
        KeyCode::Left if key.modifiers.contains(KeyModifiers::SHIFT) => {
            view.scroll_back(SCROLL_STEP);
        }
        KeyCode::Right if key.modifiers.contains(KeyModifiers::SHIFT) => {
            view.scroll_forward(SCROLL_STEP);
        }
        KeyCode::Left => {
            session.step_back(view);
        }
        KeyCode::Right => {
            session.step_forward(view);
        }
        KeyCode::Home => session.seek_start(view),
        KeyCode::End => session.seek_end(view),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let ms = session.faster();
            app.set_status(format!("Speed {ms} ms/bar"));
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            let ms = session.slower();
            app.set_status(format!("Speed {ms} ms/bar"));
        }
        KeyCode::Char('x') | KeyCode::Esc => {
            if session.view() == ViewMode::Replay {
                session.exit_replay(view);
                app.set_status("Replay closed");
            }
        }

        // Settings
        KeyCode::Char('t') => {
            let theme = session.toggle_theme();
            app.set_status(format!("Theme: {}", theme.label()));
        }
        KeyCode::Char('m') => app.toggle_indicator(IndicatorKind::MovingAverage),
        KeyCode::Char('[') => app.adjust_period(IndicatorKind::MovingAverage, -1),
        KeyCode::Char(']') => app.adjust_period(IndicatorKind::MovingAverage, 1),
        KeyCode::Char('r') => app.toggle_indicator(IndicatorKind::Oscillator),
        KeyCode::Char('{') => app.adjust_period(IndicatorKind::Oscillator, -1),
        KeyCode::Char('}') => app.adjust_period(IndicatorKind::Oscillator, 1),
        KeyCode::Char('s') => {
            session.cycle_symbol(view);
            let label = app.source_label();
            app.set_status(label);
        }
        KeyCode::Char('f') => {
            let tf = session.cycle_timeframe(view);
            app.set_status(format!("Timeframe {tf}"));
        }
        KeyCode::Char('o') => app.overlay = Overlay::ImportPrompt(String::new()),
        _ => {}
    }
}

fn handle_import_prompt<S: SettingsStore, C: Clock>(app: &mut AppState<S, C>, key: KeyEvent) {
    let Overlay::ImportPrompt(input) = &mut app.overlay else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.overlay = Overlay::None,
        KeyCode::Enter => {
            let path = PathBuf::from(input.trim());
            app.overlay = Overlay::None;
            if path.as_os_str().is_empty() {
                return;
            }
            app.import(&path);
        }
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) => input.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_helpers::app;
    use crate::app::StatusLevel;
    use barplay_core::ReplayStatus;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_quits() {
        let (mut app, _) = app(20);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn space_toggles_replay() {
        let (mut app, clock) = app(20);
        handle_key(&mut app, press(KeyCode::Char(' ')));
        assert_eq!(app.session.replay_state().status, ReplayStatus::Playing);
        assert!(app.view.candles().is_empty());
        clock.advance_ms(200);
        app.tick();
        handle_key(&mut app, press(KeyCode::Char(' ')));
        assert_eq!(app.session.replay_state().status, ReplayStatus::Paused);
        assert_eq!(app.view.candles().len(), 2);
    }

    #[test]
    fn arrows_step_and_x_exits() {
        let (mut app, _) = app(20);
        handle_key(&mut app, press(KeyCode::Right));
        handle_key(&mut app, press(KeyCode::Right));
        handle_key(&mut app, press(KeyCode::Left));
        assert_eq!(app.view.candles().len(), 1);
        handle_key(&mut app, press(KeyCode::End));
        assert_eq!(app.view.candles().len(), 20);
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.session.view(), ViewMode::Full);
    }

    #[test]
    fn indicator_keys_toggle_and_adjust() {
        let (mut app, _) = app(40);
        handle_key(&mut app, press(KeyCode::Char('m')));
        assert_eq!(app.view.overlay(IndicatorKind::MovingAverage).map(|p| p.len()), Some(21));
        handle_key(&mut app, press(KeyCode::Char(']')));
        assert_eq!(app.session.settings().moving_average_period, 21);
        assert_eq!(app.view.overlay(IndicatorKind::MovingAverage).map(|p| p.len()), Some(20));
        handle_key(&mut app, press(KeyCode::Char('r')));
        handle_key(&mut app, press(KeyCode::Char('{')));
        assert_eq!(app.session.settings().oscillator_period, 13);
        assert_eq!(app.view.overlay(IndicatorKind::Oscillator).map(|p| p.len()), Some(27));
    }

    #[test]
    fn import_prompt_collects_path() {
        let (mut app, _) = app(20);
        handle_key(&mut app, press(KeyCode::Char('o')));
        for c in "/no/such.csv".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        // Keys typed into the prompt must not reach the chart.
        assert!(app.running);
        assert_eq!(app.overlay, Overlay::ImportPrompt("/no/such.csv".into()));
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.overlay, Overlay::None);
        assert!(matches!(app.status_message, Some((_, StatusLevel::Error))));
    }

    #[test]
    fn theme_and_speed_keys() {
        let (mut app, _) = app(20);
        handle_key(&mut app, press(KeyCode::Char('t')));
        assert_eq!(app.session.settings().theme, barplay_core::Theme::Dark);
        handle_key(&mut app, press(KeyCode::Char('+')));
        assert_eq!(app.session.replay_state().speed_ms, 50);
        handle_key(&mut app, press(KeyCode::Char('-')));
        assert_eq!(app.session.replay_state().speed_ms, 100);
    }

    #[test]
    fn release_events_are_ignored() {
        let (mut app, _) = app(20);
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        handle_key(&mut app, key);
        assert!(app.running);
    }
}
