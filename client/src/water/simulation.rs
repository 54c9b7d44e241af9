//! Field storage setup for both backends.
//!
//! The GPU backend keeps the two field buffers as storage textures owned by
//! a [`PingPong`] of image handles; the CPU backend keeps a [`FieldStore`].
//! Exactly one of the two exists after startup.

use bevy::{
    asset::RenderAssetUsages,
    prelude::*,
    render::{
        extract_resource::ExtractResource,
        render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages},
        renderer::{RenderAdapter, RenderDevice},
    },
};
use clap::ValueEnum;
use shared::{
    water::{
        check_texture_resolution, generate_field, negotiate_format, FieldFormat, FieldStore,
        GridConfig, PendingDisturbance, PingPong,
    },
    WaterSettings,
};

use crate::shaders::uniforms::FieldUniforms;

/// Where the field update kernel runs.
#[derive(Resource, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationBackend {
    /// Compute shader over two storage textures.
    #[default]
    Gpu,
    /// In-memory store, displacement applied to the mesh each frame.
    Cpu,
}

/// The immutable grid the whole simulation runs on.
#[derive(Resource, Debug, Clone, Copy, Deref)]
pub struct SurfaceGrid(pub GridConfig);

/// The two field textures and their negotiated format.
#[derive(Resource, ExtractResource, Debug, Clone)]
pub struct FieldTextures {
    pub buffers: PingPong<Handle<Image>>,
    pub format: FieldFormat,
}

/// Initial field texels, uploaded once into both textures.
#[derive(Resource, ExtractResource, Debug, Clone)]
pub struct FieldSeed {
    pub texels: Vec<Vec4>,
}

pub fn texture_format(format: FieldFormat) -> TextureFormat {
    match format {
        FieldFormat::Rgba32Float => TextureFormat::Rgba32Float,
        FieldFormat::Rgba16Float => TextureFormat::Rgba16Float,
    }
}

/// A zero-filled field texture usable as storage target and sampled input.
pub fn field_image(resolution: u32, format: FieldFormat) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &vec![0u8; format.bytes_per_texel()],
        texture_format(format),
        RenderAssetUsages::RENDER_WORLD,
    );
    image.texture_descriptor.usage =
        TextureUsages::COPY_DST | TextureUsages::STORAGE_BINDING | TextureUsages::TEXTURE_BINDING;
    image
}

fn requested_format(settings: &WaterSettings) -> FieldFormat {
    if settings.half_precision {
        FieldFormat::Rgba16Float
    } else {
        FieldFormat::PREFERRED
    }
}

/// Builds the grid, parameters and seed, then allocates the backend's
/// field storage.
///
/// Rejected tunables fall back to their defaults. An invalid grid, a
/// resolution beyond the device limit or an unsupported format aborts
/// startup.
pub fn setup_field_simulation(
    mut commands: Commands,
    mut settings: ResMut<WaterSettings>,
    backend: Res<SimulationBackend>,
    adapter: Option<Res<RenderAdapter>>,
    device: Option<Res<RenderDevice>>,
    mut images: ResMut<Assets<Image>>,
) -> Result {
    let grid = settings.grid()?;
    settings.repair_params();
    let params = settings.params()?;
    let seed = generate_field(&grid, &settings.seed);

    info!(
        "Water grid {}x{} over {} units, seed {}, rule {}",
        grid.resolution(),
        grid.resolution(),
        grid.extent(),
        settings.seed.seed,
        params.rule().label()
    );

    commands.insert_resource(FieldUniforms::at_rest(&params, grid.resolution()));
    commands.insert_resource(params);
    commands.insert_resource(PendingDisturbance::default());
    commands.insert_resource(SurfaceGrid(grid));

    match *backend {
        SimulationBackend::Cpu => {
            info!("Simulating on the CPU");
            commands.insert_resource(FieldStore::new(grid, seed)?);
        }
        SimulationBackend::Gpu => {
            let (Some(adapter), Some(device)) = (adapter, device) else {
                return Err("no render device available for the GPU backend".into());
            };
            check_texture_resolution(grid.resolution(), device.limits().max_texture_dimension_2d)?;
            let format = negotiate_format(requested_format(&settings), |format| {
                adapter
                    .get_texture_format_features(texture_format(format))
                    .allowed_usages
                    .contains(TextureUsages::STORAGE_BINDING)
            })?;
            info!("Simulating on the GPU with {:?} field textures", format);

            let buffers = PingPong::new(
                images.add(field_image(grid.resolution(), format)),
                images.add(field_image(grid.resolution(), format)),
            );
            commands.insert_resource(FieldTextures { buffers, format });
            commands.insert_resource(FieldSeed {
                texels: seed.texels().into_iter().map(Vec4::from_array).collect(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use shared::{water::SimulationParams, DEFAULT_VISCOSITY};

    fn setup_world(settings: WaterSettings, backend: SimulationBackend) -> World {
        let mut world = World::new();
        world.insert_resource(settings);
        world.insert_resource(backend);
        world.init_resource::<Assets<Image>>();
        world
    }

    #[test]
    fn test_rejected_viscosity_starts_with_default() {
        let mut world = setup_world(
            WaterSettings {
                resolution: 16,
                viscosity: 1.0,
                ..Default::default()
            },
            SimulationBackend::Cpu,
        );

        let result = world.run_system_once(setup_field_simulation).unwrap();
        assert!(result.is_ok());
        assert_eq!(
            world.resource::<SimulationParams>().viscosity(),
            DEFAULT_VISCOSITY
        );
        assert_eq!(world.resource::<WaterSettings>().viscosity, DEFAULT_VISCOSITY);
        assert!(world.contains_resource::<FieldStore>());
    }

    #[test]
    fn test_invalid_grid_aborts_setup() {
        let mut world = setup_world(
            WaterSettings {
                extent: -1.0,
                ..Default::default()
            },
            SimulationBackend::Cpu,
        );

        let result = world.run_system_once(setup_field_simulation).unwrap();
        assert!(result.is_err());
        assert!(!world.contains_resource::<FieldStore>());
    }

    #[test]
    fn test_gpu_backend_without_device_aborts_setup() {
        let mut world = setup_world(WaterSettings::default(), SimulationBackend::Gpu);
        let result = world.run_system_once(setup_field_simulation).unwrap();
        assert!(result.is_err());
        assert!(!world.contains_resource::<FieldTextures>());
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(
            texture_format(FieldFormat::Rgba32Float),
            TextureFormat::Rgba32Float
        );
        assert_eq!(
            texture_format(FieldFormat::Rgba16Float),
            TextureFormat::Rgba16Float
        );
    }

    #[test]
    fn test_field_image_layout() {
        for format in [FieldFormat::Rgba32Float, FieldFormat::Rgba16Float] {
            let image = field_image(32, format);
            assert_eq!(image.texture_descriptor.format, texture_format(format));
            assert_eq!(image.texture_descriptor.size.width, 32);
            assert_eq!(
                image.data.as_ref().map(Vec::len),
                Some(32 * 32 * format.bytes_per_texel())
            );
            assert!(image
                .texture_descriptor
                .usage
                .contains(TextureUsages::STORAGE_BINDING | TextureUsages::TEXTURE_BINDING));
        }
    }

    #[test]
    fn test_half_precision_requests_fallback_format() {
        let settings = WaterSettings {
            half_precision: true,
            ..Default::default()
        };
        assert_eq!(requested_format(&settings), FieldFormat::Rgba16Float);
        assert_eq!(
            requested_format(&WaterSettings::default()),
            FieldFormat::Rgba32Float
        );
    }
}
