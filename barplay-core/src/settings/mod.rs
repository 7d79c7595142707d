//! Session settings lifecycle.
//!
//! Settings are read once at session start, one key at a time, so a record
//! written by an older build (or hand-edited) loses only the keys that are
//! missing or unreadable. Every change is written back immediately.

pub mod store;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::Timeframe;
use crate::indicators::IndicatorKind;

pub use store::{JsonFileStore, Listener, MemoryStore, SettingsError, SettingsStore};

pub mod keys {
    pub const SYMBOL: &str = "symbol";
    pub const TIMEFRAME: &str = "timeframe";
    pub const THEME: &str = "theme";
    pub const MOVING_AVERAGE_PERIOD: &str = "movingAveragePeriod";
    pub const MOVING_AVERAGE_ENABLED: &str = "movingAverageEnabled";
    pub const OSCILLATOR_PERIOD: &str = "oscillatorPeriod";
    pub const OSCILLATOR_ENABLED: &str = "oscillatorEnabled";

    pub const ALL: [&str; 7] = [
        SYMBOL,
        TIMEFRAME,
        THEME,
        MOVING_AVERAGE_PERIOD,
        MOVING_AVERAGE_ENABLED,
        OSCILLATOR_PERIOD,
        OSCILLATOR_ENABLED,
    ];
}

pub const DEFAULT_SYMBOL: &str = "DEMO";
pub const DEFAULT_MOVING_AVERAGE_PERIOD: usize = 20;
pub const DEFAULT_OSCILLATOR_PERIOD: usize = 14;
/// Upper bound for user-entered periods.
pub const MAX_PERIOD: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Clamp a user-entered period into `[1, MAX_PERIOD]`.
pub fn clamp_period(period: i64) -> usize {
    period.clamp(1, MAX_PERIOD as i64) as usize
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub theme: Theme,
    pub moving_average_period: usize,
    pub moving_average_enabled: bool,
    pub oscillator_period: usize,
    pub oscillator_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            timeframe: Timeframe::default(),
            theme: Theme::Light,
            moving_average_period: DEFAULT_MOVING_AVERAGE_PERIOD,
            moving_average_enabled: false,
            oscillator_period: DEFAULT_OSCILLATOR_PERIOD,
            oscillator_enabled: false,
        }
    }
}

fn read_key<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str, default: T) -> T {
    match store.get(key) {
        None => default,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(v) => v,
            Err(err) => {
                warn!(key, %value, error = %err, "ignoring unreadable setting");
                default
            }
        },
    }
}

fn read_period(store: &dyn SettingsStore, key: &str, default: usize) -> usize {
    clamp_period(read_key(store, key, default as i64))
}

impl SessionSettings {
    /// Read every key from `store`, falling back to the default per key.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let d = Self::default();
        let symbol: String = read_key(store, keys::SYMBOL, d.symbol.clone());
        Self {
            symbol: if symbol.trim().is_empty() { d.symbol } else { symbol },
            timeframe: read_key(store, keys::TIMEFRAME, d.timeframe),
            theme: read_key(store, keys::THEME, d.theme),
            moving_average_period: read_period(
                store,
                keys::MOVING_AVERAGE_PERIOD,
                d.moving_average_period,
            ),
            moving_average_enabled: read_key(
                store,
                keys::MOVING_AVERAGE_ENABLED,
                d.moving_average_enabled,
            ),
            oscillator_period: read_period(store, keys::OSCILLATOR_PERIOD, d.oscillator_period),
            oscillator_enabled: read_key(store, keys::OSCILLATOR_ENABLED, d.oscillator_enabled),
        }
    }

    pub fn period(&self, kind: IndicatorKind) -> usize {
        match kind {
            IndicatorKind::MovingAverage => self.moving_average_period,
            IndicatorKind::Oscillator => self.oscillator_period,
        }
    }

    pub fn enabled(&self, kind: IndicatorKind) -> bool {
        match kind {
            IndicatorKind::MovingAverage => self.moving_average_enabled,
            IndicatorKind::Oscillator => self.oscillator_enabled,
        }
    }

    /// The stored value for one key.
    pub fn value_of(&self, key: &str) -> Option<Value> {
        let value = match key {
            keys::SYMBOL => Value::from(self.symbol.clone()),
            keys::TIMEFRAME => Value::from(self.timeframe.label()),
            keys::THEME => Value::from(self.theme.label()),
            keys::MOVING_AVERAGE_PERIOD => Value::from(self.moving_average_period),
            keys::MOVING_AVERAGE_ENABLED => Value::from(self.moving_average_enabled),
            keys::OSCILLATOR_PERIOD => Value::from(self.oscillator_period),
            keys::OSCILLATOR_ENABLED => Value::from(self.oscillator_enabled),
            _ => return None,
        };
        Some(value)
    }
}

fn period_key(kind: IndicatorKind) -> &'static str {
    match kind {
        IndicatorKind::MovingAverage => keys::MOVING_AVERAGE_PERIOD,
        IndicatorKind::Oscillator => keys::OSCILLATOR_PERIOD,
    }
}

fn enabled_key(kind: IndicatorKind) -> &'static str {
    match kind {
        IndicatorKind::MovingAverage => keys::MOVING_AVERAGE_ENABLED,
        IndicatorKind::Oscillator => keys::OSCILLATOR_ENABLED,
    }
}

/// Current settings plus the store they write through to.
///
/// Setters update memory first, then persist. A failed write leaves the new
/// value in effect for this session and returns the error.
pub struct SettingsHandle<S: SettingsStore> {
    store: S,
    current: SessionSettings,
}

impl<S: SettingsStore> SettingsHandle<S> {
    pub fn open(store: S) -> Self {
        let current = SessionSettings::load(&store);
        Self { store, current }
    }

    pub fn get(&self) -> &SessionSettings {
        &self.current
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.store.subscribe(listener);
    }

    fn persist(&mut self, key: &str) -> Result<(), SettingsError> {
        match self.current.value_of(key) {
            Some(value) => self.store.set(key, value),
            None => Err(SettingsError::UnknownKey(key.to_string())),
        }
    }

    /// Returns whether the symbol changed.
    pub fn set_symbol(&mut self, symbol: &str) -> Result<bool, SettingsError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(SettingsError::InvalidValue {
                key: keys::SYMBOL.to_string(),
                value: symbol.to_string(),
            });
        }
        if symbol == self.current.symbol {
            return Ok(false);
        }
        self.current.symbol = symbol.to_string();
        self.persist(keys::SYMBOL)?;
        Ok(true)
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) -> Result<bool, SettingsError> {
        if timeframe == self.current.timeframe {
            return Ok(false);
        }
        self.current.timeframe = timeframe;
        self.persist(keys::TIMEFRAME)?;
        Ok(true)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), SettingsError> {
        self.current.theme = theme;
        self.persist(keys::THEME)
    }

    /// Clamp and store a period. Returns the value actually stored.
    pub fn set_period(&mut self, kind: IndicatorKind, period: i64) -> Result<usize, SettingsError> {
        let period = clamp_period(period);
        match kind {
            IndicatorKind::MovingAverage => self.current.moving_average_period = period,
            IndicatorKind::Oscillator => self.current.oscillator_period = period,
        }
        self.persist(period_key(kind))?;
        Ok(period)
    }

    pub fn set_enabled(&mut self, kind: IndicatorKind, enabled: bool) -> Result<(), SettingsError> {
        match kind {
            IndicatorKind::MovingAverage => self.current.moving_average_enabled = enabled,
            IndicatorKind::Oscillator => self.current.oscillator_enabled = enabled,
        }
        self.persist(enabled_key(kind))
    }

    /// Set a key from its textual form, as typed on a command line.
    pub fn set_from_str(&mut self, key: &str, raw: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        };
        match key {
            keys::SYMBOL => self.set_symbol(raw).map(drop),
            keys::TIMEFRAME => {
                let tf = raw.parse::<Timeframe>().map_err(|_| invalid())?;
                self.set_timeframe(tf).map(drop)
            }
            keys::THEME => {
                let theme = match raw.trim().to_ascii_lowercase().as_str() {
                    "light" => Theme::Light,
                    "dark" => Theme::Dark,
                    _ => return Err(invalid()),
                };
                self.set_theme(theme)
            }
            keys::MOVING_AVERAGE_PERIOD | keys::OSCILLATOR_PERIOD => {
                let period = raw.trim().parse::<i64>().map_err(|_| invalid())?;
                let kind = if key == keys::MOVING_AVERAGE_PERIOD {
                    IndicatorKind::MovingAverage
                } else {
                    IndicatorKind::Oscillator
                };
                self.set_period(kind, period).map(drop)
            }
            keys::MOVING_AVERAGE_ENABLED | keys::OSCILLATOR_ENABLED => {
                let enabled = raw.trim().parse::<bool>().map_err(|_| invalid())?;
                let kind = if key == keys::MOVING_AVERAGE_ENABLED {
                    IndicatorKind::MovingAverage
                } else {
                    IndicatorKind::Oscillator
                };
                self.set_enabled(kind, enabled)
            }
            _ => Err(SettingsError::UnknownKey(key.to_string())),
        }
    }
}
