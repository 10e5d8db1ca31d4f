//! Application-level configuration loading: countdown cues, settings defaults and storage.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    speech::Utterance,
    state::{
        countdown::CueSchedule,
        settings::{CountdownSettings, MolkkySettings, SettingsDefaults},
    },
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PARTY_GAMES_CONFIG_PATH";
/// Interval between two countdown ticks.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);
/// Shortest tick interval accepted from the configuration file.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    tick_interval: Duration,
    cues: CueSchedule,
    defaults: SettingsDefaults,
    data_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        tick_ms = app_config.tick_interval.as_millis() as u64,
                        cues = app_config.cues.thresholds.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Interval between two countdown ticks.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Spoken cue schedule used by every countdown.
    pub fn cues(&self) -> &CueSchedule {
        &self.cues
    }

    /// Defaults merged under every stored settings record.
    pub fn defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    /// File the store snapshots its content to, if persistence is enabled.
    pub fn data_path(&self) -> Option<&PathBuf> {
        self.data_path.as_ref()
    }

    /// Override the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Override the cue schedule.
    pub fn with_cues(mut self, cues: CueSchedule) -> Self {
        self.cues = cues;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            cues: CueSchedule::default(),
            defaults: SettingsDefaults::default(),
            data_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    tick_interval_ms: Option<u64>,
    #[serde(default)]
    cues: Option<RawCues>,
    #[serde(default)]
    countdown: Option<RawCountdown>,
    #[serde(default)]
    molkky: Option<RawMolkky>,
    #[serde(default)]
    data_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
/// Cue schedule overrides.
struct RawCues {
    thresholds: Option<Vec<u32>>,
    sarcasm_at: Option<u32>,
    lead_ms: Option<u64>,
    remarks: Option<Vec<RawRemark>>,
}

#[derive(Debug, Deserialize)]
/// A sarcastic remark with optional voice tuning.
struct RawRemark {
    text: String,
    pitch: Option<f32>,
    rate: Option<f32>,
}

#[derive(Debug, Deserialize)]
/// Default countdown settings overrides.
struct RawCountdown {
    countdown: Option<u32>,
    speech: Option<bool>,
    sarcasm: Option<f64>,
}

#[derive(Debug, Deserialize)]
/// Default Mölkky rules overrides.
struct RawMolkky {
    target: Option<u32>,
    reset: Option<u32>,
    max_misses: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let base = AppConfig::default();

        let tick_interval = value
            .tick_interval_ms
            .map(Duration::from_millis)
            .map(|interval| interval.max(MIN_TICK_INTERVAL))
            .unwrap_or(base.tick_interval);

        let cues = value
            .cues
            .map(|raw| raw.merge(base.cues.clone()))
            .unwrap_or(base.cues);

        let countdown = value
            .countdown
            .map(|raw| CountdownSettings {
                countdown: raw.countdown.unwrap_or(base.defaults.countdown.countdown),
                speech: raw.speech.unwrap_or(base.defaults.countdown.speech),
                sarcasm: raw
                    .sarcasm
                    .map(|sarcasm| sarcasm.clamp(0.0, 1.0))
                    .unwrap_or(base.defaults.countdown.sarcasm),
            })
            .unwrap_or(base.defaults.countdown);

        let molkky = value
            .molkky
            .map(|raw| MolkkySettings {
                target: raw.target.unwrap_or(base.defaults.molkky.target),
                reset: raw.reset.or(base.defaults.molkky.reset),
                max_misses: raw.max_misses.or(base.defaults.molkky.max_misses),
            })
            .unwrap_or(base.defaults.molkky);

        Self {
            tick_interval,
            cues,
            defaults: SettingsDefaults { countdown, molkky },
            data_path: value.data_path,
        }
    }
}

impl RawCues {
    fn merge(self, base: CueSchedule) -> CueSchedule {
        let mut thresholds = self.thresholds.unwrap_or(base.thresholds);
        thresholds.sort_unstable_by(|a, b| b.cmp(a));
        thresholds.dedup();

        CueSchedule {
            thresholds,
            sarcasm_at: self.sarcasm_at.or(base.sarcasm_at),
            lead: self
                .lead_ms
                .map(|ms| Duration::from_millis(ms).as_secs_f64())
                .unwrap_or(base.lead),
            remarks: self
                .remarks
                .map(|remarks| remarks.into_iter().map(Into::into).collect())
                .unwrap_or(base.remarks),
        }
    }
}

impl From<RawRemark> for Utterance {
    fn from(value: RawRemark) -> Self {
        Self {
            text: value.text,
            pitch: value.pitch,
            rate: value.rate,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_built_in_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.tick_interval(), DEFAULT_TICK_INTERVAL);
        assert_eq!(config.cues(), &CueSchedule::default());
        assert_eq!(config.defaults(), &SettingsDefaults::default());
        assert!(config.data_path().is_none());
    }

    #[test]
    fn overrides_are_merged_field_by_field() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "tick_interval_ms": 1,
                "cues": { "thresholds": [1, 20, 5, 20], "lead_ms": 500 },
                "countdown": { "countdown": 120, "sarcasm": 3.0 },
                "molkky": { "target": 40 },
                "data_path": "data/store.json"
            }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.tick_interval(), MIN_TICK_INTERVAL);
        assert_eq!(config.cues().thresholds, vec![20, 5, 1]);
        assert_eq!(config.cues().lead, 0.5);
        assert_eq!(config.cues().sarcasm_at, Some(15));
        assert_eq!(config.defaults().countdown.countdown, 120);
        assert_eq!(config.defaults().countdown.sarcasm, 1.0);
        assert!(config.defaults().countdown.speech);
        assert_eq!(config.defaults().molkky.target, 40);
        assert_eq!(config.defaults().molkky.reset, Some(25));
        assert_eq!(
            config.data_path(),
            Some(&PathBuf::from("data/store.json"))
        );
    }
}
