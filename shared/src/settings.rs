use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use bevy::prelude::Resource;
use bevy_log::{error, info, warn};
use ron::{from_str, ser::PrettyConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::water::{GridConfig, GridError, ParamError, SeedConfig, SimulationParams, UpdateRule};
use crate::{
    DEFAULT_DISTURBANCE_RADIUS, DEFAULT_DISTURBANCE_STRENGTH, DEFAULT_RELAXATION,
    DEFAULT_VISCOSITY, FIELD_RESOLUTION, SETTINGS_FILE_NAME, WORLD_EXTENT,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Parse(String),
    #[error("cannot serialize settings: {0}")]
    Serialize(String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Everything persisted in `water.ron`.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    pub resolution: u32,
    pub extent: f32,
    pub seed: SeedConfig,
    pub rule: UpdateRule,
    pub viscosity: f32,
    pub disturbance_radius: f32,
    pub disturbance_strength: f32,
    pub relaxation: f32,
    pub height_compensation: f32,
    /// Start from the 16-bit field format instead of the 32-bit one.
    pub half_precision: bool,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            resolution: FIELD_RESOLUTION,
            extent: WORLD_EXTENT,
            seed: SeedConfig::default(),
            rule: UpdateRule::default(),
            viscosity: DEFAULT_VISCOSITY,
            disturbance_radius: DEFAULT_DISTURBANCE_RADIUS,
            disturbance_strength: DEFAULT_DISTURBANCE_STRENGTH,
            relaxation: DEFAULT_RELAXATION,
            height_compensation: 0.0,
            half_precision: false,
        }
    }
}

impl WaterSettings {
    pub fn grid(&self) -> Result<GridConfig, GridError> {
        GridConfig::new(self.resolution, self.extent)
    }

    /// Builds parameters through the validated setters.
    pub fn params(&self) -> Result<SimulationParams, ParamError> {
        let mut params = SimulationParams::default()
            .with_viscosity(self.viscosity)?
            .with_disturbance(self.disturbance_radius, self.disturbance_strength)?
            .with_rule(self.rule);
        params.set_relaxation(self.relaxation)?;
        params.set_height_compensation(self.height_compensation)?;
        Ok(params)
    }

    /// Fails if either the grid or the parameters would be rejected.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.grid()?;
        self.params()?;
        Ok(())
    }

    /// Resets every tunable its setter rejects to the default, logging each
    /// rejection. Grid values are left to [`WaterSettings::grid`].
    pub fn repair_params(&mut self) -> Vec<ParamError> {
        let mut params = SimulationParams::default();
        let mut rejected = Vec::new();

        let result = params.set_viscosity(self.viscosity);
        keep_valid("viscosity", &mut self.viscosity, DEFAULT_VISCOSITY, result, &mut rejected);
        let result = params.set_disturbance_radius(self.disturbance_radius);
        keep_valid(
            "disturbance_radius",
            &mut self.disturbance_radius,
            DEFAULT_DISTURBANCE_RADIUS,
            result,
            &mut rejected,
        );
        let result = params.set_disturbance_strength(self.disturbance_strength);
        keep_valid(
            "disturbance_strength",
            &mut self.disturbance_strength,
            DEFAULT_DISTURBANCE_STRENGTH,
            result,
            &mut rejected,
        );
        let result = params.set_relaxation(self.relaxation);
        keep_valid("relaxation", &mut self.relaxation, DEFAULT_RELAXATION, result, &mut rejected);
        let result = params.set_height_compensation(self.height_compensation);
        keep_valid(
            "height_compensation",
            &mut self.height_compensation,
            0.0,
            result,
            &mut rejected,
        );

        rejected
    }

    /// Copies the live-tunable values back so they can be saved.
    pub fn capture(&mut self, params: &SimulationParams) {
        self.rule = params.rule();
        self.viscosity = params.viscosity();
        self.disturbance_radius = params.disturbance_radius();
        self.disturbance_strength = params.disturbance_strength();
        self.relaxation = params.relaxation();
        self.height_compensation = params.height_compensation();
    }

    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let pretty_config = PrettyConfig::new()
            .with_depth_limit(3)
            .with_separate_tuple_members(true);

        let serialized = ron::ser::to_string_pretty(self, pretty_config)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(serialized.as_bytes())?;
        Ok(())
    }

    /// Reads `<config_dir>/water.ron`.
    ///
    /// A missing file is written out with defaults; an unreadable one is
    /// reported and replaced by defaults in memory only.
    pub fn load_or_create(config_dir: &Path) -> Self {
        let path = Self::path_in(config_dir);
        if !path.exists() {
            let settings = Self::default();
            match settings.save(&path) {
                Ok(()) => info!("Created default water settings at {}", path.display()),
                Err(e) => warn!("Could not write {}: {}", path.display(), e),
            }
            return settings;
        }

        match Self::load(&path) {
            Ok(mut settings) => {
                info!("Loaded water settings from {}", path.display());
                settings.repair_params();
                settings
            }
            Err(e) => {
                error!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

fn keep_valid(
    name: &str,
    value: &mut f32,
    default: f32,
    result: Result<(), ParamError>,
    rejected: &mut Vec<ParamError>,
) {
    if let Err(e) = result {
        warn!("Ignoring {} from water settings, using {}: {}", name, default, e);
        *value = default;
        rejected.push(e);
    }
}
