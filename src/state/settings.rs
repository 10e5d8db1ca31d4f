//! Per-user game settings: typed defaults merged field by field with stored records.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::state::rules::ScoreRules;

/// Game helpers that own a settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Mölkky score tracker.
    Molkky,
    /// Rummikub turn timer.
    Rummikub,
    /// General purpose countdown timer.
    Timer,
}

impl GameKind {
    /// Whether this helper is driven by a countdown.
    pub fn has_countdown(self) -> bool {
        matches!(self, GameKind::Rummikub | GameKind::Timer)
    }

    /// Name under which the settings record is stored.
    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::Molkky => "molkky",
            GameKind::Rummikub => "rummikub",
            GameKind::Timer => "timer",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings of countdown driven helpers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountdownSettings {
    /// Countdown length in seconds.
    pub countdown: u32,
    /// Whether remaining seconds are read out.
    pub speech: bool,
    /// Probability (0 to 1) of a sarcastic remark at the sarcasm threshold.
    pub sarcasm: f64,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            countdown: 60,
            speech: true,
            sarcasm: 0.0,
        }
    }
}

/// Default rules applied to new Mölkky games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolkkySettings {
    /// Winning score.
    pub target: u32,
    /// Score to fall back to when exceeding the target.
    pub reset: Option<u32>,
    /// Consecutive misses tolerated before elimination.
    pub max_misses: Option<u32>,
}

impl Default for MolkkySettings {
    fn default() -> Self {
        Self {
            target: 50,
            reset: Some(25),
            max_misses: Some(3),
        }
    }
}

impl From<MolkkySettings> for ScoreRules {
    fn from(value: MolkkySettings) -> Self {
        Self {
            target: value.target,
            reset: value.reset,
            max_misses: value.max_misses,
        }
    }
}

/// Settings of any helper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Settings {
    /// Timer and Rummikub settings.
    Countdown(CountdownSettings),
    /// Mölkky settings.
    Molkky(MolkkySettings),
}

/// Built-in defaults for every kind, usually coming from the application config.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsDefaults {
    /// Defaults of countdown driven helpers.
    pub countdown: CountdownSettings,
    /// Defaults of the Mölkky helper.
    pub molkky: MolkkySettings,
}

impl SettingsDefaults {
    /// Defaults for `kind`.
    pub fn for_kind(&self, kind: GameKind) -> Settings {
        match kind {
            GameKind::Molkky => Settings::Molkky(self.molkky),
            GameKind::Rummikub | GameKind::Timer => Settings::Countdown(self.countdown),
        }
    }

    /// Merge a stored flat record over the defaults of `kind`. Unknown or missing keys
    /// keep their default; a record that cannot be read at all yields the defaults.
    pub fn merge(&self, kind: GameKind, record: Option<&serde_json::Value>) -> Settings {
        let Some(record) = record else {
            return self.for_kind(kind);
        };

        match kind {
            GameKind::Molkky => {
                let patch = MolkkyPatch::deserialize(record).unwrap_or_default();
                Settings::Molkky(patch.apply(self.molkky))
            }
            GameKind::Rummikub | GameKind::Timer => {
                let patch = CountdownPatch::deserialize(record).unwrap_or_default();
                Settings::Countdown(patch.apply(self.countdown))
            }
        }
    }
}

impl Settings {
    /// Flat key/value record persisted by the settings store.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Countdown settings, when this record belongs to a countdown helper.
    pub fn countdown(&self) -> Option<CountdownSettings> {
        match self {
            Settings::Countdown(settings) => Some(*settings),
            Settings::Molkky(_) => None,
        }
    }

    /// Mölkky settings, when this record belongs to the Mölkky helper.
    pub fn molkky(&self) -> Option<MolkkySettings> {
        match self {
            Settings::Molkky(settings) => Some(*settings),
            Settings::Countdown(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CountdownPatch {
    countdown: Option<u32>,
    speech: Option<bool>,
    sarcasm: Option<f64>,
}

impl CountdownPatch {
    fn apply(self, defaults: CountdownSettings) -> CountdownSettings {
        CountdownSettings {
            countdown: self.countdown.unwrap_or(defaults.countdown),
            speech: self.speech.unwrap_or(defaults.speech),
            sarcasm: self.sarcasm.unwrap_or(defaults.sarcasm),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MolkkyPatch {
    target: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    reset: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    max_misses: Option<Option<u32>>,
}

impl MolkkyPatch {
    fn apply(self, defaults: MolkkySettings) -> MolkkySettings {
        MolkkySettings {
            target: self.target.unwrap_or(defaults.target),
            reset: self.reset.unwrap_or(defaults.reset),
            max_misses: self.max_misses.unwrap_or(defaults.max_misses),
        }
    }
}

/// Distinguish an explicit `null` (present, cleared) from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_record_yields_defaults() {
        let defaults = SettingsDefaults::default();
        assert_eq!(
            defaults.merge(GameKind::Timer, None),
            Settings::Countdown(CountdownSettings::default())
        );
        assert_eq!(
            defaults.merge(GameKind::Molkky, None),
            Settings::Molkky(MolkkySettings::default())
        );
    }

    #[test]
    fn stored_keys_override_defaults_one_by_one() {
        let defaults = SettingsDefaults::default();
        let record = json!({ "countdown": 90, "sarcasm": 0.5 });

        let settings = defaults.merge(GameKind::Rummikub, Some(&record));
        assert_eq!(
            settings.countdown(),
            Some(CountdownSettings {
                countdown: 90,
                speech: true,
                sarcasm: 0.5,
            })
        );
    }

    #[test]
    fn explicit_null_clears_optional_molkky_rules() {
        let defaults = SettingsDefaults::default();
        let record = json!({ "reset": null, "target": 40 });

        let settings = defaults.merge(GameKind::Molkky, Some(&record)).molkky().unwrap();
        assert_eq!(settings.target, 40);
        assert_eq!(settings.reset, None);
        assert_eq!(settings.max_misses, Some(3));
    }

    #[test]
    fn unreadable_record_falls_back_to_defaults() {
        let defaults = SettingsDefaults::default();
        let record = json!({ "countdown": "soon" });

        assert_eq!(
            defaults.merge(GameKind::Timer, Some(&record)),
            defaults.for_kind(GameKind::Timer)
        );
    }

    #[test]
    fn record_round_trips_through_merge() {
        let defaults = SettingsDefaults::default();
        let settings = Settings::Countdown(CountdownSettings {
            countdown: 45,
            speech: false,
            sarcasm: 0.25,
        });

        let record = settings.to_record();
        assert_eq!(defaults.merge(GameKind::Timer, Some(&record)), settings);
    }
}
