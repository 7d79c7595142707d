//! Replay state machine.
//!
//! States are `Stopped`, `Playing` and `Paused`. The cursor is the index of
//! the next bar to reveal: 0 means nothing revealed, `N` means exhausted.
//!
//! The timer is armed only while `Playing`. Every path out of `Playing`
//! (pause, seek, load, exhaustion) cancels it, so a tick can never reveal a
//! bar from a sequence that has since been replaced.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::clock::Clock;
use super::scheduler::TickScheduler;
use crate::domain::{Bar, BarSequence};
use crate::render::{Candle, RenderSink, VolumeBar};

pub const DEFAULT_SPEED_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl ReplayStatus {
    pub fn label(self) -> &'static str {
        match self {
            ReplayStatus::Stopped => "STOPPED",
            ReplayStatus::Playing => "PLAYING",
            ReplayStatus::Paused => "PAUSED",
        }
    }
}

/// The whole replay state as one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayState {
    pub status: ReplayStatus,
    pub cursor: usize,
    pub speed_ms: u64,
}

impl ReplayState {
    pub fn initial(speed_ms: u64) -> Self {
        Self {
            status: ReplayStatus::Stopped,
            cursor: 0,
            speed_ms: speed_ms.max(1),
        }
    }
}

pub struct ReplayController<C: Clock> {
    clock: C,
    bars: BarSequence,
    state: ReplayState,
    default_speed_ms: u64,
    timer: TickScheduler,
}

impl<C: Clock> ReplayController<C> {
    pub fn new(clock: C, default_speed_ms: u64) -> Self {
        let default_speed_ms = default_speed_ms.max(1);
        Self {
            clock,
            bars: BarSequence::empty(),
            state: ReplayState::initial(default_speed_ms),
            default_speed_ms,
            timer: TickScheduler::new(),
        }
    }

    /// Replace the sequence. Any state goes to `Stopped` at cursor 0 with the
    /// default speed, and the running timer is cancelled.
    pub fn load(&mut self, bars: BarSequence) {
        if let Some(token) = self.timer.cancel() {
            debug!(?token, "load cancelled running replay timer");
        }
        self.bars = bars;
        self.state = ReplayState::initial(self.default_speed_ms);
        debug!(bars = self.bars.len(), "replay loaded");
    }

    /// Start or resume. Returns whether the state changed.
    pub fn play(&mut self) -> bool {
        if self.state.status == ReplayStatus::Playing || self.is_exhausted() {
            return false;
        }
        self.state.status = ReplayStatus::Playing;
        let token = self.timer.arm(self.clock.now(), self.interval());
        debug!(?token, cursor = self.state.cursor, speed_ms = self.state.speed_ms, "replay playing");
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state.status != ReplayStatus::Playing {
            return false;
        }
        self.state.status = ReplayStatus::Paused;
        self.timer.cancel();
        debug!(cursor = self.state.cursor, "replay paused");
        true
    }

    /// Play if not playing, pause if playing.
    pub fn toggle(&mut self) -> bool {
        if self.state.status == ReplayStatus::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Move the cursor one bar right. Ignored while playing.
    pub fn step_forward(&mut self) -> bool {
        if self.state.status == ReplayStatus::Playing || self.is_exhausted() {
            return false;
        }
        self.state.cursor += 1;
        true
    }

    /// Move the cursor one bar left. Ignored while playing.
    pub fn step_back(&mut self) -> bool {
        if self.state.status == ReplayStatus::Playing || self.state.cursor == 0 {
            return false;
        }
        self.state.cursor -= 1;
        true
    }

    pub fn seek_start(&mut self) {
        self.stop_if_playing();
        self.state.cursor = 0;
    }

    pub fn seek_end(&mut self) {
        self.stop_if_playing();
        self.state.cursor = self.bars.len();
    }

    /// Change the tick interval. While playing the timer is re-armed so the
    /// next tick already uses the new interval.
    pub fn set_speed(&mut self, speed_ms: u64) {
        let speed_ms = speed_ms.max(1);
        if speed_ms == self.state.speed_ms {
            return;
        }
        self.state.speed_ms = speed_ms;
        if self.state.status == ReplayStatus::Playing {
            let token = self.timer.arm(self.clock.now(), self.interval());
            debug!(?token, speed_ms, "replay timer re-armed");
        }
    }

    /// Deliver every tick that is due now.
    ///
    /// Each tick appends exactly one bar to `sink` and advances the cursor.
    /// Returns the bars revealed by this call, in order.
    pub fn poll(&mut self, sink: &mut dyn RenderSink) -> Vec<Bar> {
        let now = self.clock.now();
        let mut revealed = Vec::new();
        while self.timer.take_due(now).is_some() {
            let Some(&bar) = self.bars.get(self.state.cursor) else {
                self.finish();
                break;
            };
            sink.append_bar(Candle::from(&bar), VolumeBar::from(&bar));
            self.state.cursor += 1;
            revealed.push(bar);
            if self.is_exhausted() {
                self.finish();
                break;
            }
        }
        if !revealed.is_empty() {
            debug!(count = revealed.len(), cursor = self.state.cursor, "replay tick");
        }
        revealed
    }

    fn finish(&mut self) {
        self.state.status = ReplayStatus::Stopped;
        self.timer.cancel();
        debug!(cursor = self.state.cursor, "replay exhausted");
    }

    fn stop_if_playing(&mut self) {
        if self.state.status == ReplayStatus::Playing {
            self.state.status = ReplayStatus::Stopped;
            self.timer.cancel();
        }
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.state.speed_ms)
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn status(&self) -> ReplayStatus {
        self.state.status
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    pub fn speed_ms(&self) -> u64 {
        self.state.speed_ms
    }

    pub fn bars(&self) -> &BarSequence {
        &self.bars
    }

    /// Bars at indices `[0, cursor)`.
    pub fn revealed(&self) -> &[Bar] {
        &self.bars[..self.state.cursor]
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.cursor >= self.bars.len()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// How long a caller may sleep before the next tick is due.
    pub fn time_until_next_tick(&self) -> Option<Duration> {
        self.timer.until_due(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::render::RecordingSink;
    use crate::replay::ManualClock;

    fn controller(n: usize) -> (ReplayController<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut c = ReplayController::new(clock.clone(), 100);
        let closes: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        c.load(BarSequence::new(make_bars(&closes)).unwrap());
        (c, clock)
    }

    #[test]
    fn load_resets_state() {
        let (mut c, clock) = controller(5);
        c.set_speed(40);
        c.play();
        clock.advance_ms(80);
        c.poll(&mut RecordingSink::new());
        c.load(BarSequence::new(make_bars(&[1.0, 2.0])).unwrap());
        assert_eq!(c.state(), ReplayState::initial(100));
        assert!(!c.timer_armed());
    }

    #[test]
    fn play_reveals_one_bar_per_tick() {
        let (mut c, clock) = controller(3);
        let mut sink = RecordingSink::new();
        assert!(c.play());
        clock.advance_ms(99);
        assert!(c.poll(&mut sink).is_empty());
        clock.advance_ms(1);
        assert_eq!(c.poll(&mut sink).len(), 1);
        assert_eq!(c.cursor(), 1);
        assert_eq!(sink.appended.len(), 1);
        assert_eq!(sink.full_redraws, 0);
    }

    #[test]
    fn exhaustion_stops_and_cancels() {
        let (mut c, clock) = controller(3);
        let mut sink = RecordingSink::new();
        c.play();
        clock.advance_ms(1_000);
        assert_eq!(c.poll(&mut sink).len(), 3);
        assert_eq!(c.status(), ReplayStatus::Stopped);
        assert!(!c.timer_armed());
        clock.advance_ms(1_000);
        assert!(c.poll(&mut sink).is_empty());
    }

    #[test]
    fn play_on_exhausted_sequence_is_noop() {
        let (mut c, _) = controller(3);
        c.seek_end();
        assert!(!c.play());
        assert_eq!(c.status(), ReplayStatus::Stopped);
        assert!(!c.timer_armed());
    }

    #[test]
    fn play_on_empty_sequence_is_noop() {
        let mut c = ReplayController::new(ManualClock::new(), 100);
        assert!(!c.play());
    }

    #[test]
    fn play_while_playing_is_noop() {
        let (mut c, clock) = controller(5);
        c.play();
        clock.advance_ms(60);
        // A second play must not restart the interval.
        assert!(!c.play());
        clock.advance_ms(40);
        assert_eq!(c.poll(&mut RecordingSink::new()).len(), 1);
    }

    #[test]
    fn pause_only_from_playing() {
        let (mut c, _) = controller(5);
        assert!(!c.pause());
        c.play();
        assert!(c.pause());
        assert_eq!(c.status(), ReplayStatus::Paused);
        assert!(!c.timer_armed());
    }

    #[test]
    fn steps_are_clamped_and_ignored_while_playing() {
        let (mut c, _) = controller(2);
        assert!(!c.step_back());
        assert!(c.step_forward());
        assert!(c.step_forward());
        assert!(!c.step_forward());
        assert_eq!(c.cursor(), 2);
        assert!(c.step_back());
        assert_eq!(c.status(), ReplayStatus::Stopped);
        c.play();
        assert!(!c.step_forward());
        assert!(!c.step_back());
        assert_eq!(c.cursor(), 1);
    }

    #[test]
    fn step_keeps_paused_status() {
        let (mut c, _) = controller(4);
        c.play();
        c.pause();
        c.step_forward();
        assert_eq!(c.status(), ReplayStatus::Paused);
        assert_eq!(c.cursor(), 1);
    }

    #[test]
    fn seek_while_playing_stops() {
        let (mut c, clock) = controller(5);
        c.play();
        c.seek_end();
        assert_eq!(c.status(), ReplayStatus::Stopped);
        assert_eq!(c.cursor(), 5);
        assert!(!c.timer_armed());
        c.seek_start();
        assert_eq!(c.cursor(), 0);
        clock.advance_ms(1_000);
        assert!(c.poll(&mut RecordingSink::new()).is_empty());
    }

    #[test]
    fn seek_while_paused_keeps_paused() {
        let (mut c, _) = controller(5);
        c.play();
        c.pause();
        c.seek_end();
        assert_eq!(c.status(), ReplayStatus::Paused);
    }

    #[test]
    fn speed_change_applies_on_next_tick() {
        let (mut c, clock) = controller(10);
        let mut sink = RecordingSink::new();
        c.set_speed(1_000);
        c.play();
        clock.advance_ms(500);
        c.set_speed(100);
        assert_eq!(c.cursor(), 0);
        clock.advance_ms(100);
        assert_eq!(c.poll(&mut sink).len(), 1);
        assert_eq!(c.status(), ReplayStatus::Playing);
    }

    #[test]
    fn set_speed_clamps_to_one() {
        let (mut c, _) = controller(1);
        c.set_speed(0);
        assert_eq!(c.speed_ms(), 1);
    }

    #[test]
    fn revealed_tracks_cursor() {
        let (mut c, _) = controller(4);
        c.step_forward();
        c.step_forward();
        assert_eq!(c.revealed().len(), 2);
        assert_eq!(c.revealed()[1].time, c.bars()[1].time);
    }

    #[test]
    fn time_until_next_tick_only_while_playing() {
        let (mut c, clock) = controller(4);
        assert_eq!(c.time_until_next_tick(), None);
        c.play();
        clock.advance_ms(30);
        assert_eq!(c.time_until_next_tick(), Some(Duration::from_millis(70)));
    }
}
