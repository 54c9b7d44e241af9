mod camera;
mod config;
mod shaders;
mod ui;
mod water;

use std::path::PathBuf;

use bevy::{prelude::*, window::PresentMode};
use bevy_inspector_egui::bevy_egui::EguiPlugin;
use clap::{Parser, ValueEnum};
use config::{default_config_dir, load_settings, ConfigDir, SettingsOverrides};
use shared::water::UpdateRule;
use ui::TuningUiPlugin;
use water::{simulation::SimulationBackend, WaterPlugin};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        help = "Directory holding water.ron, defaults to the user config directory"
    )]
    config_dir: Option<PathBuf>,

    #[arg(short, long, help = "Field texture width in texels")]
    resolution: Option<u32>,

    #[arg(short, long, help = "Side length of the surface in world units")]
    extent: Option<f32>,

    #[arg(short, long, help = "Noise seed for the initial field")]
    seed: Option<u32>,

    #[arg(long, conflicts_with = "seed", help = "Pick a random noise seed")]
    random_seed: bool,

    #[arg(short, long, value_enum, default_value_t = SimulationBackend::Gpu)]
    backend: SimulationBackend,

    #[arg(long, value_enum)]
    rule: Option<RuleArg>,

    /// Start from the 16-bit field texture format
    #[arg(long)]
    half_precision: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RuleArg {
    Relaxation,
    Wave,
}

impl From<RuleArg> for UpdateRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Relaxation => UpdateRule::Relaxation,
            RuleArg::Wave => UpdateRule::Wave,
        }
    }
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        let seed = if self.random_seed {
            Some(rand::random::<u32>())
        } else {
            self.seed
        };

        SettingsOverrides {
            resolution: self.resolution,
            extent: self.extent,
            seed,
            rule: self.rule.map(UpdateRule::from),
            half_precision: self.half_precision,
        }
    }
}

fn main() {
    // Parse command-line arguments
    let args = Args::parse();
    let config_dir = args.config_dir.clone().unwrap_or_else(default_config_dir);

    println!(
        "Starting ripple with config folder: {}",
        config_dir.display()
    );

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Ripple".to_string(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }));

    app.add_plugins(EguiPlugin {
        enable_multipass_for_primary_context: false,
    });

    app.insert_resource(args.backend)
        .insert_resource(ConfigDir(config_dir))
        .insert_resource(args.overrides())
        .add_systems(PreStartup, load_settings)
        .add_systems(Startup, camera::spawn_camera)
        .add_plugins((WaterPlugin, TuningUiPlugin))
        .run();
}
