//! Runtime sensor settings and their recovery from persisted raw values.

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::detector::DetectionMode;
use crate::weapons::WeaponKind;
use crate::weapons::timing::DEFAULT_LIGHTS_DURATION;

/// Settings the sensor starts with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SensorSettings {
    pub default_weapon: WeaponKind,
    pub detection_mode: DetectionMode,
    /// Time lights stay up after a touch.
    pub lights_duration: Duration,
    /// Sets the mirrored display bit on every published light state.
    pub mirrored: bool,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            default_weapon: WeaponKind::Foil,
            detection_mode: DetectionMode::Auto,
            lights_duration: DEFAULT_LIGHTS_DURATION,
            mirrored: false,
        }
    }
}

/// Raw values as a settings store hands them over.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PersistedSettings {
    pub start_weapon: Option<u8>,
    pub lights_ms: u32,
    pub detection_mode: Option<u8>,
    pub mirrored: bool,
}

/// A persisted value that could not be used as stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigFallback {
    UnknownWeapon(u8),
    MissingWeapon,
    ZeroLightsDuration,
    UnknownDetectionMode(u8),
}

impl fmt::Display for ConfigFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFallback::UnknownWeapon(code) => {
                write!(f, "unknown weapon code {code}, using epee")
            }
            ConfigFallback::MissingWeapon => f.write_str("no stored weapon, using foil"),
            ConfigFallback::ZeroLightsDuration => {
                write!(f, "lights duration 0 ms, using {} ms", DEFAULT_LIGHTS_DURATION.as_millis())
            }
            ConfigFallback::UnknownDetectionMode(code) => {
                write!(f, "unknown detection mode {code}, using auto")
            }
        }
    }
}

/// Every fallback [`SensorSettings::from_persisted`] can report at once.
pub type ConfigFallbacks = Vec<ConfigFallback, 4>;

impl SensorSettings {
    /// Builds settings from stored values. Never fails: each unusable value
    /// is replaced by its documented default and reported.
    #[must_use]
    pub fn from_persisted(persisted: PersistedSettings) -> (Self, ConfigFallbacks) {
        let mut settings = Self::default();
        let mut fallbacks = ConfigFallbacks::new();

        // At most one entry per field, so the four slots always suffice.
        match persisted.start_weapon {
            Some(code) => {
                settings.default_weapon = WeaponKind::from_code(code).unwrap_or_else(|| {
                    let _ = fallbacks.push(ConfigFallback::UnknownWeapon(code));
                    WeaponKind::Epee
                });
            }
            None => {
                let _ = fallbacks.push(ConfigFallback::MissingWeapon);
            }
        }

        if persisted.lights_ms == 0 {
            let _ = fallbacks.push(ConfigFallback::ZeroLightsDuration);
        } else {
            settings.lights_duration = Duration::from_millis(u64::from(persisted.lights_ms));
        }

        if let Some(code) = persisted.detection_mode {
            settings.detection_mode = DetectionMode::from_code(code).unwrap_or_else(|| {
                let _ = fallbacks.push(ConfigFallback::UnknownDetectionMode(code));
                DetectionMode::Auto
            });
        }

        settings.mirrored = persisted.mirrored;
        (settings, fallbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_are_used_when_valid() {
        let (settings, fallbacks) = SensorSettings::from_persisted(PersistedSettings {
            start_weapon: Some(WeaponKind::Sabre.code()),
            lights_ms: 3_000,
            detection_mode: Some(DetectionMode::Hybrid.code()),
            mirrored: true,
        });
        assert!(fallbacks.is_empty());
        assert_eq!(settings.default_weapon, WeaponKind::Sabre);
        assert_eq!(settings.lights_duration, Duration::from_millis(3_000));
        assert_eq!(settings.detection_mode, DetectionMode::Hybrid);
        assert!(settings.mirrored);
    }

    #[test]
    fn unknown_weapon_code_falls_back_to_epee() {
        let (settings, fallbacks) = SensorSettings::from_persisted(PersistedSettings {
            start_weapon: Some(9),
            lights_ms: 0,
            detection_mode: Some(5),
            mirrored: false,
        });
        assert_eq!(settings.default_weapon, WeaponKind::Epee);
        assert_eq!(settings.lights_duration, DEFAULT_LIGHTS_DURATION);
        assert_eq!(settings.detection_mode, DetectionMode::Auto);
        assert_eq!(
            fallbacks.as_slice(),
            &[
                ConfigFallback::UnknownWeapon(9),
                ConfigFallback::ZeroLightsDuration,
                ConfigFallback::UnknownDetectionMode(5),
            ]
        );
    }

    #[test]
    fn missing_weapon_starts_in_foil() {
        let (settings, fallbacks) = SensorSettings::from_persisted(PersistedSettings {
            lights_ms: 2_000,
            ..PersistedSettings::default()
        });
        assert_eq!(settings.default_weapon, WeaponKind::Foil);
        assert_eq!(fallbacks.as_slice(), &[ConfigFallback::MissingWeapon]);
    }
}
