use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::validation::validate_reset_below_target,
    state::settings::{CountdownSettings, MolkkySettings, Settings},
};

/// Settings of the timer and Rummikub helpers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct CountdownSettingsDto {
    /// Countdown length in seconds.
    #[validate(range(min = 1, max = 3600))]
    pub countdown: u32,
    /// Whether remaining seconds are read out.
    pub speech: bool,
    /// Probability of a sarcastic remark at the sarcasm threshold.
    #[validate(range(min = 0.0, max = 1.0))]
    pub sarcasm: f64,
}

/// Default rules of new Mölkky games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_molkky_settings"))]
pub struct MolkkySettingsDto {
    /// Winning score.
    #[validate(range(min = 1))]
    pub target: u32,
    /// Score to fall back to when overshooting the target; `null` disables the rule.
    pub reset: Option<u32>,
    /// Consecutive misses tolerated; `null` disables elimination.
    pub max_misses: Option<u32>,
}

/// Settings of any helper, as exchanged over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SettingsDto {
    /// Timer and Rummikub settings.
    Countdown(CountdownSettingsDto),
    /// Mölkky settings.
    Molkky(MolkkySettingsDto),
}

impl Validate for SettingsDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            SettingsDto::Countdown(settings) => settings.validate(),
            SettingsDto::Molkky(settings) => settings.validate(),
        }
    }
}

fn validate_molkky_settings(settings: &MolkkySettingsDto) -> Result<(), ValidationError> {
    validate_reset_below_target(settings.target, settings.reset)
}

impl From<CountdownSettings> for CountdownSettingsDto {
    fn from(value: CountdownSettings) -> Self {
        Self {
            countdown: value.countdown,
            speech: value.speech,
            sarcasm: value.sarcasm,
        }
    }
}

impl From<CountdownSettingsDto> for CountdownSettings {
    fn from(value: CountdownSettingsDto) -> Self {
        Self {
            countdown: value.countdown,
            speech: value.speech,
            sarcasm: value.sarcasm,
        }
    }
}

impl From<MolkkySettings> for MolkkySettingsDto {
    fn from(value: MolkkySettings) -> Self {
        Self {
            target: value.target,
            reset: value.reset,
            max_misses: value.max_misses,
        }
    }
}

impl From<MolkkySettingsDto> for MolkkySettings {
    fn from(value: MolkkySettingsDto) -> Self {
        Self {
            target: value.target,
            reset: value.reset,
            max_misses: value.max_misses,
        }
    }
}

impl From<Settings> for SettingsDto {
    fn from(value: Settings) -> Self {
        match value {
            Settings::Countdown(settings) => SettingsDto::Countdown(settings.into()),
            Settings::Molkky(settings) => SettingsDto::Molkky(settings.into()),
        }
    }
}

impl From<SettingsDto> for Settings {
    fn from(value: SettingsDto) -> Self {
        match value {
            SettingsDto::Countdown(settings) => Settings::Countdown(settings.into()),
            SettingsDto::Molkky(settings) => Settings::Molkky(settings.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_shape_selects_the_variant() {
        let countdown: SettingsDto =
            serde_json::from_value(json!({ "countdown": 90, "speech": false, "sarcasm": 0.3 }))
                .unwrap();
        assert!(matches!(countdown, SettingsDto::Countdown(_)));

        let molkky: SettingsDto =
            serde_json::from_value(json!({ "target": 40, "reset": null, "max_misses": 2 }))
                .unwrap();
        assert!(matches!(molkky, SettingsDto::Molkky(_)));
    }

    #[test]
    fn countdown_bounds_are_enforced() {
        let mut settings = CountdownSettingsDto {
            countdown: 0,
            speech: true,
            sarcasm: 0.0,
        };
        assert!(settings.validate().is_err());

        settings.countdown = 3600;
        assert!(settings.validate().is_ok());

        settings.sarcasm = 1.5;
        assert!(SettingsDto::Countdown(settings).validate().is_err());
    }

    #[test]
    fn reset_must_stay_below_target() {
        let settings = MolkkySettingsDto {
            target: 30,
            reset: Some(30),
            max_misses: Some(3),
        };
        assert!(SettingsDto::Molkky(settings).validate().is_err());

        let settings = MolkkySettingsDto {
            reset: None,
            ..settings
        };
        assert!(settings.validate().is_ok());
    }
}
