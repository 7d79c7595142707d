//! barplay: terminal candle chart with bar-by-bar replay.
//!
//! One screen: candles with a moving average, a volume histogram, an optional
//! oscillator pane and a status bar. Press `?` for keys.

mod app;
mod chart_view;
mod input;
mod theme;
mod ui;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use barplay_core::config::{default_config_path, ChartConfig};
use barplay_core::{ChartSession, JsonFileStore, MonotonicClock};

use crate::app::AppState;

/// Upper bound on one input wait, so the screen keeps refreshing.
const FRAME: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "barplay", version, about = "Terminal candle chart with replay")]
struct Args {
    /// TOML config file (defaults to the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Settings file; overrides `settings_path` from the config.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// CSV file to open instead of sample data.
    #[arg(long)]
    import: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let config_path = args.config.clone().or_else(default_config_path);
    let config = ChartConfig::load_or_default(config_path.as_deref())
        .context("failed to load config")?;

    let settings_path = args
        .settings
        .clone()
        .or_else(|| config.settings_path())
        .unwrap_or_else(|| PathBuf::from("barplay-settings.json"));

    init_logging(&settings_path, &config.log_filter);
    info!(settings = %settings_path.display(), "starting barplay");

    let store = JsonFileStore::open(&settings_path);
    let session = ChartSession::new(config, store, MonotonicClock::new());
    let mut app = AppState::new(session);
    if let Some(path) = &args.import {
        app.import(path);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState<JsonFileStore, MonotonicClock>,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Reveal any bars whose tick has come due
        app.tick();

        // 3. Wait for input, but no longer than the next tick
        let timeout = app
            .session
            .replay()
            .time_until_next_tick()
            .map_or(FRAME, |due| due.min(FRAME));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

/// Log to a file beside the settings: the terminal belongs to the UI.
fn init_logging(settings_path: &Path, default_filter: &str) {
    let dir = settings_path.parent().unwrap_or_else(|| Path::new("."));
    let _ = fs::create_dir_all(dir);
    let log_path = dir.join("barplay.log");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match File::create(&log_path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        Err(err) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .init();
            warn!(path = %log_path.display(), %err, "could not open log file");
        }
    }
}
