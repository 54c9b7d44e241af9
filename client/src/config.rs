//! Settings file location and command-line overrides.

use std::path::PathBuf;

use bevy::prelude::*;
use shared::{water::UpdateRule, WaterSettings};

/// Directory holding `water.ron`.
#[derive(Resource, Debug, Clone)]
pub struct ConfigDir(pub PathBuf);

impl ConfigDir {
    pub fn settings_path(&self) -> PathBuf {
        WaterSettings::path_in(&self.0)
    }
}

#[cfg(not(target_os = "windows"))]
pub fn default_config_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config").join("ripple"),
        None => PathBuf::from("config"),
    }
}

#[cfg(target_os = "windows")]
pub fn default_config_dir() -> PathBuf {
    match std::env::var_os("APPDATA") {
        Some(app_data) => PathBuf::from(app_data).join("ripple"),
        None => PathBuf::from("config"),
    }
}

/// Values given on the command line take precedence over the file.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub resolution: Option<u32>,
    pub extent: Option<f32>,
    pub seed: Option<u32>,
    pub rule: Option<UpdateRule>,
    pub half_precision: bool,
}

impl SettingsOverrides {
    pub fn apply(&self, settings: &mut WaterSettings) {
        if let Some(resolution) = self.resolution {
            settings.resolution = resolution;
        }
        if let Some(extent) = self.extent {
            settings.extent = extent;
        }
        if let Some(seed) = self.seed {
            settings.seed = settings.seed.with_seed(seed);
        }
        if let Some(rule) = self.rule {
            settings.rule = rule;
        }
        if self.half_precision {
            settings.half_precision = true;
        }
    }
}

/// Loads `water.ron` and layers the command-line overrides on top.
pub fn load_settings(
    mut commands: Commands,
    config_dir: Res<ConfigDir>,
    overrides: Res<SettingsOverrides>,
) {
    let mut settings = WaterSettings::load_or_create(&config_dir.0);
    overrides.apply(&mut settings);
    debug!("Effective water settings: {:?}", settings);
    commands.insert_resource(settings);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_overrides_keep_file_values() {
        let mut settings = WaterSettings {
            resolution: 64,
            half_precision: true,
            ..Default::default()
        };
        let before = settings.clone();
        SettingsOverrides::default().apply(&mut settings);
        assert_eq!(settings, before);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut settings = WaterSettings::default();
        let overrides = SettingsOverrides {
            resolution: Some(256),
            extent: Some(100.0),
            seed: Some(42),
            rule: Some(UpdateRule::Wave),
            half_precision: true,
        };
        overrides.apply(&mut settings);

        assert_eq!(settings.resolution, 256);
        assert_eq!(settings.extent, 100.0);
        assert_eq!(settings.seed.seed, 42);
        assert_eq!(settings.rule, UpdateRule::Wave);
        assert!(settings.half_precision);
    }

    #[test]
    fn test_settings_path_is_inside_config_dir() {
        let dir = ConfigDir(PathBuf::from("some/dir"));
        assert_eq!(dir.settings_path(), PathBuf::from("some/dir/water.ron"));
    }
}
