//! barplay CLI: sample data, indicator dumps, headless replay, settings.
//!
//! Commands:
//! - `generate` writes seeded synthetic bars as CSV
//! - `indicators` prints moving average and oscillator values for a dataset
//! - `replay` plays a dataset bar by bar against the wall clock
//! - `settings show` / `settings set` inspect and edit the persisted settings

mod output;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use barplay_core::config::{default_config_path, ChartConfig};
use barplay_core::data::{import_path, SyntheticSource, SyntheticSpec};
use barplay_core::indicators::{self, IndicatorKind};
use barplay_core::rng::SeedHierarchy;
use barplay_core::settings::{keys, DEFAULT_MOVING_AVERAGE_PERIOD, DEFAULT_OSCILLATOR_PERIOD};
use barplay_core::{
    Bar, BarSequence, ChartSession, ImportOutcome, JsonFileStore, MemoryStore, MonotonicClock,
    SessionSettings, SettingsHandle, Timeframe,
};

use crate::output::PrintSink;

#[derive(Parser)]
#[command(name = "barplay-cli", about = "barplay CLI: OHLCV sample data, indicators and replay")]
struct Cli {
    /// TOML config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where bars come from when no file is given.
#[derive(clap::Args, Clone, Debug)]
struct DatasetArgs {
    /// CSV file with time, open, high, low, close[, volume] columns.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Symbol for synthetic bars.
    #[arg(long, default_value = "DEMO")]
    symbol: String,

    /// Timeframe for synthetic bars: 1m, 5m, 15m, 1h, 4h, 1D, 1W.
    #[arg(long, default_value = "1D")]
    timeframe: Timeframe,

    /// Number of synthetic bars. Defaults to the config value.
    #[arg(long)]
    bars: Option<usize>,

    /// Master seed. Defaults to the config value.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write synthetic bars as CSV.
    Generate {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output file. Defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print moving average and oscillator values.
    Indicators {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(long, default_value_t = DEFAULT_MOVING_AVERAGE_PERIOD)]
        ma_period: usize,

        #[arg(long, default_value_t = DEFAULT_OSCILLATOR_PERIOD)]
        rsi_period: usize,

        /// Only print the last N rows.
        #[arg(long)]
        tail: Option<usize>,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Replay bars one at a time at a fixed cadence.
    Replay {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Milliseconds between bars.
        #[arg(long)]
        speed_ms: Option<u64>,

        /// Stop after this many bars.
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = DEFAULT_MOVING_AVERAGE_PERIOD)]
        ma_period: usize,

        #[arg(long, default_value_t = DEFAULT_OSCILLATOR_PERIOD)]
        rsi_period: usize,
    },
    /// Inspect or edit persisted session settings.
    Settings {
        /// Settings file. Defaults to the config value or platform location.
        #[arg(long)]
        file: Option<PathBuf>,

        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print every key with its effective value.
    Show {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Set one key from its text form.
    Set { key: String, value: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let config = ChartConfig::load_or_default(config_path.as_deref())
        .context("failed to load config")?;
    init_logging(&config.log_filter);

    match cli.command {
        Commands::Generate { dataset, output } => run_generate(&config, &dataset, output.as_deref()),
        Commands::Indicators {
            dataset,
            ma_period,
            rsi_period,
            tail,
            format,
        } => run_indicators(&config, &dataset, ma_period, rsi_period, tail, format),
        Commands::Replay {
            dataset,
            speed_ms,
            limit,
            ma_period,
            rsi_period,
        } => run_replay(config, &dataset, speed_ms, limit, ma_period, rsi_period),
        Commands::Settings { file, action } => {
            let path = file
                .or_else(|| config.settings_path())
                .context("no settings location; pass --file")?;
            run_settings(&path, action, &mut io::stdout())
        }
    }
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();
}

fn synthetic_spec(config: &ChartConfig, dataset: &DatasetArgs) -> SyntheticSpec {
    let seeds = SeedHierarchy::new(dataset.seed.unwrap_or_else(|| config.master_seed()));
    SyntheticSpec {
        symbol: dataset.symbol.clone(),
        timeframe: dataset.timeframe,
        count: dataset.bars.unwrap_or(config.synthetic_bars),
        start_time: config.synthetic_start_time(),
        seed: seeds.dataset_seed(&dataset.symbol, dataset.timeframe),
    }
}

/// Bars from `--input`, or synthetic ones. An unreadable file is an error here.
fn load_dataset(config: &ChartConfig, dataset: &DatasetArgs) -> Result<BarSequence> {
    match &dataset.input {
        Some(path) => {
            let imported = import_path(path)
                .with_context(|| format!("failed to import {}", path.display()))?;
            let report = &imported.report;
            if report.dropped() > 0 || report.duplicates_removed > 0 {
                eprintln!(
                    "{}: {} rows read, {} dropped, {} duplicates removed",
                    path.display(),
                    report.rows_read,
                    report.dropped(),
                    report.duplicates_removed
                );
            }
            Ok(imported.bars)
        }
        None => Ok(SyntheticSource::new(synthetic_spec(config, dataset)).generate().bars),
    }
}

fn write_csv<W: Write>(bars: &[Bar], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_generate(config: &ChartConfig, dataset: &DatasetArgs, output: Option<&Path>) -> Result<()> {
    let bars = load_dataset(config, dataset)?;
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_csv(&bars, file)?;
            info!(bars = bars.len(), path = %path.display(), "wrote bars");
        }
        None => write_csv(&bars, io::stdout().lock())?,
    }
    Ok(())
}

fn run_indicators(
    config: &ChartConfig,
    dataset: &DatasetArgs,
    ma_period: usize,
    rsi_period: usize,
    tail: Option<usize>,
    format: Format,
) -> Result<()> {
    let bars = load_dataset(config, dataset)?;
    let ma = indicators::compute(IndicatorKind::MovingAverage, ma_period, &bars)?;
    let rsi = indicators::compute(IndicatorKind::Oscillator, rsi_period, &bars)?;

    let skip = tail.map_or(0, |n| bars.len().saturating_sub(n));
    match format {
        Format::Table => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", output::header())?;
            for line in output::indicator_table(&bars, &ma.points, &rsi.points)
                .into_iter()
                .skip(skip)
            {
                writeln!(stdout, "{line}")?;
            }
        }
        Format::Json => {
            let first_time = bars.get(skip).map(|b| b.time).unwrap_or(i64::MAX);
            let keep = |series: &indicators::IndicatorSeries| -> Value {
                json!({
                    "kind": series.kind.label(),
                    "period": series.period,
                    "points": series.points.iter().filter(|p| p.time >= first_time).collect::<Vec<_>>(),
                })
            };
            let doc = json!({
                "bars": bars.len(),
                "movingAverage": keep(&ma),
                "oscillator": keep(&rsi),
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}

fn run_replay(
    config: ChartConfig,
    dataset: &DatasetArgs,
    speed_ms: Option<u64>,
    limit: Option<usize>,
    ma_period: usize,
    rsi_period: usize,
) -> Result<()> {
    let store = MemoryStore::with_values([
        (keys::SYMBOL, json!(dataset.symbol)),
        (keys::TIMEFRAME, json!(dataset.timeframe.label())),
        (keys::MOVING_AVERAGE_PERIOD, json!(ma_period)),
        (keys::MOVING_AVERAGE_ENABLED, json!(true)),
        (keys::OSCILLATOR_PERIOD, json!(rsi_period)),
        (keys::OSCILLATOR_ENABLED, json!(true)),
    ]);
    let config = ChartConfig {
        synthetic_bars: dataset.bars.unwrap_or(config.synthetic_bars),
        synthetic_seed: dataset.seed.or(config.synthetic_seed),
        ..config
    };

    let mut sink = PrintSink::new(io::stdout().lock());
    let mut session = ChartSession::new(config, store, MonotonicClock::new());
    session.start(&mut sink);
    if let Some(path) = &dataset.input {
        if let ImportOutcome::FellBack(err) = session.import_path(path, &mut sink) {
            bail!("failed to import {}: {err}", path.display());
        }
    }
    if let Some(ms) = speed_ms {
        session.set_speed(ms);
    }

    let total = session.bars().len();
    let limit = limit.unwrap_or(total).min(total);
    info!(bars = total, limit, speed_ms = session.replay_state().speed_ms, "replay starting");
    println!("{}", output::header());

    session.play(&mut sink);
    while sink.printed() < limit {
        if session.poll(&mut sink) > 0 {
            sink.flush()?;
        }
        match session.replay().time_until_next_tick() {
            Some(wait) if sink.printed() < limit => thread::sleep(wait),
            _ => break,
        }
    }
    session.pause();
    info!(revealed = session.replay_state().cursor, "replay finished");
    Ok(())
}

fn run_settings<W: Write>(path: &Path, action: SettingsAction, out: &mut W) -> Result<()> {
    let mut handle = SettingsHandle::open(JsonFileStore::open(path));
    match action {
        SettingsAction::Show { json } => {
            print_settings(handle.get(), json, out)?;
        }
        SettingsAction::Set { key, value } => {
            handle
                .set_from_str(&key, &value)
                .with_context(|| format!("cannot set {key}"))?;
            let stored = handle.get().value_of(&key).unwrap_or(Value::Null);
            writeln!(out, "{key} = {stored}")?;
        }
    }
    Ok(())
}

fn print_settings<W: Write>(settings: &SessionSettings, as_json: bool, out: &mut W) -> Result<()> {
    if as_json {
        writeln!(out, "{}", serde_json::to_string_pretty(settings)?)?;
        return Ok(());
    }
    for key in keys::ALL {
        let value = settings.value_of(key).unwrap_or(Value::Null);
        writeln!(out, "{key:<22} {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use barplay_core::Theme;

    fn dataset(bars: usize) -> DatasetArgs {
        DatasetArgs {
            input: None,
            symbol: "DEMO".into(),
            timeframe: Timeframe::Day1,
            bars: Some(bars),
            seed: Some(7),
        }
    }

    #[test]
    fn generated_csv_imports_cleanly() {
        let config = ChartConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        run_generate(&config, &dataset(50), Some(&path)).unwrap();

        let imported = import_path(&path).unwrap();
        assert_eq!(imported.bars.len(), 50);
        assert_eq!(imported.report.dropped(), 0);
        let again = load_dataset(&config, &dataset(50)).unwrap();
        assert_eq!(imported.bars.as_slice(), again.as_slice());
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let config = ChartConfig::default();
        let args = DatasetArgs {
            input: Some(PathBuf::from("/no/such/bars.csv")),
            ..dataset(10)
        };
        assert!(load_dataset(&config, &args).is_err());
    }

    #[test]
    fn settings_set_persists_and_show_lists_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut out = Vec::new();
        run_settings(
            &path,
            SettingsAction::Set {
                key: "theme".into(),
                value: "dark".into(),
            },
            &mut out,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "theme = \"dark\"");

        let handle = SettingsHandle::open(JsonFileStore::open(&path));
        assert_eq!(handle.get().theme, Theme::Dark);

        let mut out = Vec::new();
        run_settings(&path, SettingsAction::Show { json: false }, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), keys::ALL.len());
        assert!(text.contains("\"dark\""));
    }

    #[test]
    fn settings_set_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let result = run_settings(
            &path,
            SettingsAction::Set {
                key: "timeframe".into(),
                value: "2h".into(),
            },
            &mut Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "barplay-cli",
            "indicators",
            "--timeframe",
            "4h",
            "--ma-period",
            "5",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Indicators {
                dataset,
                ma_period,
                format,
                ..
            } => {
                assert_eq!(dataset.timeframe, Timeframe::Hour4);
                assert_eq!(ma_period, 5);
                assert_eq!(format, Format::Json);
            }
            _ => panic!("expected indicators"),
        }
    }
}
