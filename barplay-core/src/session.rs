//! Session wiring.
//!
//! A [`ChartSession`] owns the active bar sequence, the replay controller and
//! the settings, and keeps a [`RenderSink`] in step with them:
//!
//! - symbol or timeframe changes reload data, reset replay and recompute overlays
//! - period and enable changes recompute only the affected overlay
//! - replay commands switch to the replay view, where the chart shows only the
//!   revealed prefix and overlays grow one point per revealed bar

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::config::ChartConfig;
use crate::data::{
    self, import_str, BarSource, DataError, DataOrigin, ImportReport, LoadedBars, SyntheticSource,
    SyntheticSpec,
};
use crate::domain::{Bar, BarSequence, Timeframe};
use crate::indicators::{self, IndicatorKind, IndicatorPoint, IndicatorStream};
use crate::render::{draw_bars, RenderSink};
use crate::replay::{Clock, ReplayController, ReplayState};
use crate::rng::SeedHierarchy;
use crate::settings::{Listener, SessionSettings, SettingsError, SettingsHandle, SettingsStore, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Every bar drawn, overlays computed in batch.
    #[default]
    Full,
    /// Only bars before the replay cursor drawn.
    Replay,
}

/// Result of an import request.
#[derive(Debug)]
pub enum ImportOutcome {
    Imported(ImportReport),
    /// Nothing usable was imported; synthetic bars were loaded instead.
    FellBack(DataError),
}

/// Delimited text already in memory, e.g. pasted or uploaded.
struct TextSource<'a> {
    label: &'a str,
    text: &'a str,
}

impl BarSource for TextSource<'_> {
    fn load(&self) -> Result<LoadedBars, DataError> {
        let imported = import_str(self.text)?;
        Ok(LoadedBars {
            bars: imported.bars,
            origin: DataOrigin::Import {
                label: self.label.to_string(),
                report: imported.report,
            },
        })
    }
}

fn log_persist_failure(result: Result<(), SettingsError>) {
    if let Err(err) = result {
        warn!(error = %err, "failed to persist setting");
    }
}

pub struct ChartSession<S: SettingsStore, C: Clock> {
    config: ChartConfig,
    settings: SettingsHandle<S>,
    seeds: SeedHierarchy,
    bars: BarSequence,
    origin: DataOrigin,
    replay: ReplayController<C>,
    view: ViewMode,
    overlays: BTreeMap<IndicatorKind, Vec<IndicatorPoint>>,
    /// Live calculators, present only in the replay view.
    streams: BTreeMap<IndicatorKind, Box<dyn IndicatorStream>>,
}

impl<S: SettingsStore, C: Clock> ChartSession<S, C> {
    /// Read settings from `store`. Nothing is loaded until [`start`](Self::start).
    pub fn new(config: ChartConfig, store: S, clock: C) -> Self {
        let settings = SettingsHandle::open(store);
        let seeds = SeedHierarchy::new(config.master_seed());
        let replay = ReplayController::new(clock, config.clamp_speed(config.default_speed_ms));
        Self {
            config,
            settings,
            seeds,
            bars: BarSequence::empty(),
            origin: DataOrigin::Synthetic { seed: 0 },
            replay,
            view: ViewMode::Full,
            overlays: BTreeMap::new(),
            streams: BTreeMap::new(),
        }
    }

    /// Load data for the persisted symbol and timeframe and draw it.
    pub fn start(&mut self, sink: &mut dyn RenderSink) {
        self.load_synthetic(sink);
    }

    fn synthetic_source(&self) -> SyntheticSource {
        let s = self.settings.get();
        SyntheticSource::new(SyntheticSpec {
            symbol: s.symbol.clone(),
            timeframe: s.timeframe,
            count: self.config.synthetic_bars,
            start_time: self.config.synthetic_start_time(),
            seed: self.seeds.dataset_seed(&s.symbol, s.timeframe),
        })
    }

    pub fn load_synthetic(&mut self, sink: &mut dyn RenderSink) {
        let loaded = self.synthetic_source().generate();
        self.install(loaded, sink);
    }

    fn install(&mut self, loaded: LoadedBars, sink: &mut dyn RenderSink) {
        info!(
            bars = loaded.bars.len(),
            synthetic = loaded.origin.is_synthetic(),
            "session data replaced"
        );
        self.bars = loaded.bars;
        self.origin = loaded.origin;
        self.replay.load(self.bars.clone());
        self.view = ViewMode::Full;
        self.streams.clear();
        draw_bars(sink, &self.bars);
        self.refresh_overlays(sink);
    }

    fn import_from(&mut self, source: &dyn BarSource, sink: &mut dyn RenderSink) -> ImportOutcome {
        let (loaded, err) = data::load_with_fallback(source, &self.synthetic_source());
        let report = match &loaded.origin {
            DataOrigin::Import { report, .. } => Some(report.clone()),
            DataOrigin::Synthetic { .. } => None,
        };
        self.install(loaded, sink);
        match (err, report) {
            (Some(err), _) => ImportOutcome::FellBack(err),
            (None, Some(report)) => ImportOutcome::Imported(report),
            (None, None) => ImportOutcome::Imported(ImportReport::default()),
        }
    }

    /// Import a delimited file. If nothing usable comes out of it, synthetic
    /// bars for the current symbol are shown instead.
    pub fn import_path(&mut self, path: &Path, sink: &mut dyn RenderSink) -> ImportOutcome {
        self.import_from(&data::CsvFileSource::new(path), sink)
    }

    pub fn import_text(&mut self, label: &str, text: &str, sink: &mut dyn RenderSink) -> ImportOutcome {
        self.import_from(&TextSource { label, text }, sink)
    }

    // ---- settings ----

    /// Switch symbol. Reloads data only if the symbol actually changed.
    pub fn set_symbol(&mut self, symbol: &str, sink: &mut dyn RenderSink) -> bool {
        let changed = match self.settings.set_symbol(symbol) {
            Ok(changed) => changed,
            Err(SettingsError::InvalidValue { .. }) => return false,
            Err(err) => {
                warn!(error = %err, "failed to persist setting");
                true
            }
        };
        if changed {
            self.load_synthetic(sink);
        }
        changed
    }

    /// Move to the next configured symbol. Blank entries are skipped.
    pub fn cycle_symbol(&mut self, sink: &mut dyn RenderSink) -> bool {
        let symbols: Vec<&str> = self
            .config
            .symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        let current = self.settings.get().symbol.as_str();
        let next = match symbols.iter().position(|&s| s == current) {
            Some(i) => symbols[(i + 1) % symbols.len()],
            None => match symbols.first() {
                Some(&first) => first,
                None => return false,
            },
        }
        .to_string();
        self.set_symbol(&next, sink)
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe, sink: &mut dyn RenderSink) -> bool {
        let changed = match self.settings.set_timeframe(timeframe) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(error = %err, "failed to persist setting");
                true
            }
        };
        if changed {
            self.load_synthetic(sink);
        }
        changed
    }

    pub fn cycle_timeframe(&mut self, sink: &mut dyn RenderSink) -> Timeframe {
        let next = self.settings.get().timeframe.next();
        self.set_timeframe(next, sink);
        next
    }

    pub fn set_theme(&mut self, theme: Theme) {
        log_persist_failure(self.settings.set_theme(theme));
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.settings.get().theme.toggled();
        self.set_theme(theme);
        theme
    }

    /// Store a new period (clamped to at least 1) and recompute that overlay
    /// if it is shown. Returns the stored period.
    pub fn set_indicator_period(
        &mut self,
        kind: IndicatorKind,
        period: i64,
        sink: &mut dyn RenderSink,
    ) -> usize {
        let period = match self.settings.set_period(kind, period) {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, "failed to persist setting");
                self.settings.get().period(kind)
            }
        };
        if self.settings.get().enabled(kind) {
            self.refresh_overlay(kind, sink);
        }
        period
    }

    pub fn adjust_indicator_period(
        &mut self,
        kind: IndicatorKind,
        delta: i64,
        sink: &mut dyn RenderSink,
    ) -> usize {
        let current = self.settings.get().period(kind) as i64;
        self.set_indicator_period(kind, current.saturating_add(delta), sink)
    }

    pub fn set_indicator_enabled(
        &mut self,
        kind: IndicatorKind,
        enabled: bool,
        sink: &mut dyn RenderSink,
    ) {
        log_persist_failure(self.settings.set_enabled(kind, enabled));
        self.refresh_overlay(kind, sink);
    }

    pub fn toggle_indicator(&mut self, kind: IndicatorKind, sink: &mut dyn RenderSink) -> bool {
        let enabled = !self.settings.get().enabled(kind);
        self.set_indicator_enabled(kind, enabled, sink);
        enabled
    }

    pub fn subscribe_settings(&mut self, listener: Listener) {
        self.settings.subscribe(listener);
    }

    // ---- overlays ----

    fn refresh_overlays(&mut self, sink: &mut dyn RenderSink) {
        for kind in IndicatorKind::all() {
            self.refresh_overlay(kind, sink);
        }
    }

    /// Recompute one overlay from scratch for the current view, or clear it
    /// if disabled.
    fn refresh_overlay(&mut self, kind: IndicatorKind, sink: &mut dyn RenderSink) {
        self.streams.remove(&kind);
        let settings = self.settings.get();
        if !settings.enabled(kind) {
            if self.overlays.remove(&kind).is_some() {
                sink.clear_overlay(kind);
            }
            return;
        }
        let period = settings.period(kind);

        let points = match self.view {
            ViewMode::Full => indicators::compute(kind, period, &self.bars).map(|s| s.points),
            ViewMode::Replay => indicators::stream(kind, period).map(|mut stream| {
                let points: Vec<IndicatorPoint> = self
                    .replay
                    .revealed()
                    .iter()
                    .filter_map(|bar| push_point(stream.as_mut(), bar))
                    .collect();
                self.streams.insert(kind, stream);
                points
            }),
        };

        match points {
            Ok(points) => {
                sink.set_overlay_series(kind, &points);
                self.overlays.insert(kind, points);
            }
            Err(err) => {
                warn!(error = %err, indicator = kind.label(), "indicator not computed");
                self.overlays.remove(&kind);
                sink.clear_overlay(kind);
            }
        }
    }

    // ---- replay ----

    fn enter_replay(&mut self, sink: &mut dyn RenderSink) {
        if self.view == ViewMode::Replay {
            return;
        }
        self.view = ViewMode::Replay;
        self.redraw_revealed(sink);
    }

    fn redraw_revealed(&mut self, sink: &mut dyn RenderSink) {
        draw_bars(sink, self.replay.revealed());
        self.refresh_overlays(sink);
    }

    pub fn play(&mut self, sink: &mut dyn RenderSink) -> bool {
        self.enter_replay(sink);
        self.replay.play()
    }

    pub fn pause(&mut self) -> bool {
        self.replay.pause()
    }

    pub fn toggle_play(&mut self, sink: &mut dyn RenderSink) -> bool {
        self.enter_replay(sink);
        self.replay.toggle()
    }

    pub fn step_forward(&mut self, sink: &mut dyn RenderSink) -> bool {
        self.enter_replay(sink);
        let moved = self.replay.step_forward();
        if moved {
            self.redraw_revealed(sink);
        }
        moved
    }

    pub fn step_back(&mut self, sink: &mut dyn RenderSink) -> bool {
        self.enter_replay(sink);
        let moved = self.replay.step_back();
        if moved {
            self.redraw_revealed(sink);
        }
        moved
    }

    pub fn seek_start(&mut self, sink: &mut dyn RenderSink) {
        self.enter_replay(sink);
        self.replay.seek_start();
        self.redraw_revealed(sink);
    }

    pub fn seek_end(&mut self, sink: &mut dyn RenderSink) {
        self.enter_replay(sink);
        self.replay.seek_end();
        self.redraw_revealed(sink);
    }

    /// Set the tick interval, clamped to the configured bounds.
    pub fn set_speed(&mut self, speed_ms: u64) -> u64 {
        let speed_ms = self.config.clamp_speed(speed_ms);
        self.replay.set_speed(speed_ms);
        speed_ms
    }

    /// Halve the tick interval.
    pub fn faster(&mut self) -> u64 {
        self.set_speed(self.replay.speed_ms() / 2)
    }

    /// Double the tick interval.
    pub fn slower(&mut self) -> u64 {
        self.set_speed(self.replay.speed_ms().saturating_mul(2))
    }

    /// Leave replay: stop the timer, reset the cursor, show every bar again.
    pub fn exit_replay(&mut self, sink: &mut dyn RenderSink) {
        if self.view == ViewMode::Full {
            return;
        }
        let speed = self.replay.speed_ms();
        self.replay.load(self.bars.clone());
        self.replay.set_speed(speed);
        self.view = ViewMode::Full;
        draw_bars(sink, &self.bars);
        self.refresh_overlays(sink);
    }

    /// Deliver due replay ticks. Returns how many bars were revealed.
    pub fn poll(&mut self, sink: &mut dyn RenderSink) -> usize {
        if self.view != ViewMode::Replay {
            return 0;
        }
        let revealed = self.replay.poll(sink);
        if revealed.is_empty() {
            return 0;
        }

        for (kind, stream) in self.streams.iter_mut() {
            let points = self.overlays.entry(*kind).or_default();
            let before = points.len();
            points.extend(revealed.iter().filter_map(|bar| push_point(stream.as_mut(), bar)));
            if points.len() > before {
                sink.set_overlay_series(*kind, points);
            }
        }
        revealed.len()
    }

    // ---- accessors ----

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn settings(&self) -> &SessionSettings {
        self.settings.get()
    }

    pub fn store(&self) -> &S {
        self.settings.store()
    }

    pub fn bars(&self) -> &BarSequence {
        &self.bars
    }

    pub fn origin(&self) -> &DataOrigin {
        &self.origin
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn replay(&self) -> &ReplayController<C> {
        &self.replay
    }

    pub fn replay_state(&self) -> ReplayState {
        self.replay.state()
    }

    /// Bars currently on the chart.
    pub fn visible_bars(&self) -> &[Bar] {
        match self.view {
            ViewMode::Full => &self.bars,
            ViewMode::Replay => self.replay.revealed(),
        }
    }

    /// Points currently drawn for `kind`, if the overlay is shown.
    pub fn overlay(&self, kind: IndicatorKind) -> Option<&[IndicatorPoint]> {
        self.overlays.get(&kind).map(|p| p.as_slice())
    }
}

fn push_point(stream: &mut dyn IndicatorStream, bar: &Bar) -> Option<IndicatorPoint> {
    stream
        .push(bar)
        .filter(|v| v.is_finite())
        .map(|value| IndicatorPoint {
            time: bar.time,
            value,
        })
}
