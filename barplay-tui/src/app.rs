//! Application state: the chart session, its render sink, and UI chrome.

use std::path::Path;

use barplay_core::data::DataOrigin;
use barplay_core::indicators::IndicatorKind;
use barplay_core::replay::Clock;
use barplay_core::session::{ChartSession, ImportOutcome};
use barplay_core::settings::SettingsStore;

use crate::chart_view::ChartView;
use crate::theme::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// What is drawn on top of the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
    /// File path being typed.
    ImportPrompt(String),
}

pub struct AppState<S: SettingsStore, C: Clock> {
    pub session: ChartSession<S, C>,
    pub view: ChartView,
    pub running: bool,
    pub overlay: Overlay,
    pub status_message: Option<(String, StatusLevel)>,
}

impl<S: SettingsStore, C: Clock> AppState<S, C> {
    /// Wrap a session and draw its initial data.
    pub fn new(session: ChartSession<S, C>) -> Self {
        let mut app = Self {
            session,
            view: ChartView::new(),
            running: true,
            overlay: Overlay::None,
            status_message: None,
        };
        app.session.start(&mut app.view);
        app
    }

    pub fn palette(&self) -> Palette {
        Palette::for_theme(self.session.settings().theme)
    }

    /// Advance replay. Returns whether anything new was revealed.
    pub fn tick(&mut self) -> bool {
        self.session.poll(&mut self.view) > 0
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Error));
    }

    pub fn import(&mut self, path: &Path) {
        match self.session.import_path(path, &mut self.view) {
            ImportOutcome::Imported(report) => {
                let kept = self.session.bars().len();
                if report.dropped() > 0 || report.duplicates_removed > 0 {
                    self.set_warning(format!(
                        "Imported {kept} bars ({} rows dropped, {} duplicates)",
                        report.dropped(),
                        report.duplicates_removed
                    ));
                } else {
                    self.set_status(format!("Imported {kept} bars from {}", path.display()));
                }
            }
            ImportOutcome::FellBack(err) => {
                self.set_error(format!("Import failed ({err}); showing sample data"));
            }
        }
    }

    pub fn toggle_indicator(&mut self, kind: IndicatorKind) {
        let on = self.session.toggle_indicator(kind, &mut self.view);
        let period = self.session.settings().period(kind);
        self.set_status(format!(
            "{}({period}) {}",
            kind.label(),
            if on { "on" } else { "off" }
        ));
    }

    pub fn adjust_period(&mut self, kind: IndicatorKind, delta: i64) {
        let period = self.session.adjust_indicator_period(kind, delta, &mut self.view);
        self.set_status(format!("{} period {period}", kind.label()));
    }

    /// Label for the data currently shown.
    pub fn source_label(&self) -> String {
        match self.session.origin() {
            DataOrigin::Synthetic { .. } => {
                let s = self.session.settings();
                format!("{} {} (sample)", s.symbol, s.timeframe)
            }
            DataOrigin::Import { label, .. } => {
                let name = Path::new(label)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| label.clone());
                format!("{name} (imported)")
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_helpers::app;
    use super::*;

    #[test]
    fn new_app_draws_data() {
        let (app, _) = app(30);
        assert_eq!(app.view.candles().len(), 30);
        assert!(app.running);
        assert_eq!(app.source_label(), "DEMO 1D (sample)");
    }

    #[test]
    fn failed_import_reports_error_and_keeps_chart() {
        let (mut app, _) = app(30);
        app.import(Path::new("/nonexistent/bars.csv"));
        assert!(matches!(app.status_message, Some((_, StatusLevel::Error))));
        assert_eq!(app.view.candles().len(), 30);
    }

    #[test]
    fn tick_reveals_bars_while_playing() {
        let (mut app, clock) = app(30);
        app.session.play(&mut app.view);
        clock.advance_ms(300);
        assert!(app.tick());
        assert_eq!(app.view.candles().len(), 3);
        assert!(!app.tick());
    }
}
