//! Render-world side of the GPU field store.
//!
//! The main world swaps the [`PingPong`](shared::water::PingPong) of field
//! textures and extracts it every frame. Here, bind group `k` reads the
//! texture in the other slot and writes slot `k`, so dispatching the group of
//! the current slot performs exactly the step the main world scheduled. The
//! node runs before the camera driver, so the surface always samples the
//! texture written this frame.

use std::borrow::Cow;

use bevy::{
    prelude::*,
    render::{
        extract_resource::ExtractResourcePlugin,
        graph::CameraDriverLabel,
        render_asset::RenderAssets,
        render_graph::{Node, NodeRunError, RenderGraph, RenderGraphContext, RenderLabel},
        render_resource::{
            binding_types::{
                storage_buffer_read_only_sized, texture_2d, texture_storage_2d, uniform_buffer,
            },
            *,
        },
        renderer::{RenderContext, RenderDevice, RenderQueue},
        texture::GpuImage,
        Render, RenderApp, RenderSet,
    },
};
use shared::water::{FieldFormat, Slot};

use super::simulation::{texture_format, FieldSeed, FieldTextures};
use crate::shaders::{entry_points, paths, uniforms::FieldUniforms, FIELD_HALF_DEF};

pub struct FieldComputePlugin;

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
struct FieldUpdateLabel;

impl Plugin for FieldComputePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ExtractResourcePlugin::<FieldTextures>::default(),
            ExtractResourcePlugin::<FieldSeed>::default(),
            ExtractResourcePlugin::<FieldUniforms>::default(),
        ));

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };
        render_app.add_systems(
            Render,
            (
                (prepare_field_pipeline, prepare_field_buffers)
                    .chain()
                    .in_set(RenderSet::PrepareResources),
                prepare_field_bind_groups.in_set(RenderSet::PrepareBindGroups),
            ),
        );

        let mut render_graph = render_app.world_mut().resource_mut::<RenderGraph>();
        render_graph.add_node(FieldUpdateLabel, FieldUpdateNode::default());
        render_graph.add_node_edge(FieldUpdateLabel, CameraDriverLabel);
    }
}

#[derive(Resource)]
struct FieldPipeline {
    layout: BindGroupLayout,
    seed: CachedComputePipelineId,
    update: CachedComputePipelineId,
}

#[derive(Resource)]
struct FieldBuffers {
    uniform: UniformBuffer<FieldUniforms>,
    seed: StorageBuffer<Vec<Vec4>>,
}

/// One bind group per write slot.
#[derive(Resource)]
struct FieldBindGroups([BindGroup; 2]);

impl FieldBindGroups {
    fn writing(&self, slot: Slot) -> &BindGroup {
        &self.0[slot.index()]
    }
}

/// `(read, write)` slots of the bind group that writes `write`.
pub fn step_slots(write: Slot) -> (Slot, Slot) {
    (write.other(), write)
}

pub fn shader_defs(format: FieldFormat) -> Vec<ShaderDefVal> {
    match format {
        FieldFormat::Rgba16Float => vec![FIELD_HALF_DEF.into()],
        FieldFormat::Rgba32Float => Vec::new(),
    }
}

/// Queues both compute pipelines once the field format is known.
fn prepare_field_pipeline(
    mut commands: Commands,
    pipeline: Option<Res<FieldPipeline>>,
    textures: Option<Res<FieldTextures>>,
    render_device: Res<RenderDevice>,
    asset_server: Res<AssetServer>,
    pipeline_cache: Res<PipelineCache>,
) {
    if pipeline.is_some() {
        return;
    }
    let Some(textures) = textures else {
        return;
    };

    let layout = render_device.create_bind_group_layout(
        "field_update_layout",
        &BindGroupLayoutEntries::sequential(
            ShaderStages::COMPUTE,
            (
                uniform_buffer::<FieldUniforms>(false),
                texture_2d(TextureSampleType::Float { filterable: false }),
                texture_storage_2d(
                    texture_format(textures.format),
                    StorageTextureAccess::WriteOnly,
                ),
                storage_buffer_read_only_sized(false, None),
            ),
        ),
    );
    let shader: Handle<Shader> = asset_server.load(paths::FIELD_UPDATE_SHADER);

    let queue = |entry_point: &'static str| {
        pipeline_cache.queue_compute_pipeline(ComputePipelineDescriptor {
            label: Some(format!("field_{}", entry_point).into()),
            layout: vec![layout.clone()],
            push_constant_ranges: Vec::new(),
            shader: shader.clone(),
            shader_defs: shader_defs(textures.format),
            entry_point: Cow::from(entry_point),
            zero_initialize_workgroup_memory: false,
        })
    };
    let seed = queue(entry_points::SEED);
    let update = queue(entry_points::UPDATE);

    commands.insert_resource(FieldPipeline {
        layout,
        seed,
        update,
    });
}

/// Uploads the seed once and the step uniforms every frame.
fn prepare_field_buffers(
    mut commands: Commands,
    buffers: Option<ResMut<FieldBuffers>>,
    seed: Option<Res<FieldSeed>>,
    uniforms: Option<Res<FieldUniforms>>,
    render_device: Res<RenderDevice>,
    render_queue: Res<RenderQueue>,
) {
    let Some(uniforms) = uniforms else {
        return;
    };

    match buffers {
        Some(mut buffers) => {
            buffers.uniform.set(*uniforms);
            buffers.uniform.write_buffer(&render_device, &render_queue);
        }
        None => {
            let Some(seed) = seed else {
                return;
            };
            let mut uniform = UniformBuffer::from(*uniforms);
            uniform.set_label(Some("field_uniforms"));
            uniform.write_buffer(&render_device, &render_queue);

            let mut seed = StorageBuffer::from(seed.texels.clone());
            seed.set_label(Some("field_seed"));
            seed.write_buffer(&render_device, &render_queue);

            commands.insert_resource(FieldBuffers { uniform, seed });
        }
    }
}

fn prepare_field_bind_groups(
    mut commands: Commands,
    pipeline: Option<Res<FieldPipeline>>,
    buffers: Option<Res<FieldBuffers>>,
    textures: Option<Res<FieldTextures>>,
    gpu_images: Res<RenderAssets<GpuImage>>,
    render_device: Res<RenderDevice>,
) {
    let (Some(pipeline), Some(buffers), Some(textures)) = (pipeline, buffers, textures) else {
        return;
    };
    let (Some(uniform), Some(seed)) = (buffers.uniform.binding(), buffers.seed.binding()) else {
        return;
    };

    let view = |slot: Slot| gpu_images.get(textures.buffers.get(slot));
    let (Some(a), Some(b)) = (view(Slot::A), view(Slot::B)) else {
        return;
    };

    let group = |write: Slot| {
        let (read, write) = step_slots(write);
        let image = |slot: Slot| match slot {
            Slot::A => a,
            Slot::B => b,
        };
        render_device.create_bind_group(
            "field_update_bind_group",
            &pipeline.layout,
            &BindGroupEntries::sequential((
                uniform.clone(),
                &image(read).texture_view,
                &image(write).texture_view,
                seed.clone(),
            )),
        )
    };

    commands.insert_resource(FieldBindGroups([group(Slot::A), group(Slot::B)]));
}

enum FieldNodeState {
    Loading,
    Seeding,
    Running,
}

struct FieldUpdateNode {
    state: FieldNodeState,
}

impl Default for FieldUpdateNode {
    fn default() -> Self {
        Self {
            state: FieldNodeState::Loading,
        }
    }
}

impl Node for FieldUpdateNode {
    fn update(&mut self, world: &mut World) {
        let Some(pipeline) = world.get_resource::<FieldPipeline>() else {
            return;
        };
        let cache = world.resource::<PipelineCache>();

        match self.state {
            FieldNodeState::Loading => {
                for id in [pipeline.seed, pipeline.update] {
                    match cache.get_compute_pipeline_state(id) {
                        CachedPipelineState::Ok(_) => {}
                        CachedPipelineState::Err(PipelineCacheError::ShaderNotLoaded(_)) => return,
                        CachedPipelineState::Err(err) => {
                            panic!("Initializing {}:\n{err}", paths::FIELD_UPDATE_SHADER)
                        }
                        _ => return,
                    }
                }
                if world.contains_resource::<FieldBindGroups>() {
                    self.state = FieldNodeState::Seeding;
                }
            }
            FieldNodeState::Seeding => {
                debug!("Field textures seeded");
                self.state = FieldNodeState::Running;
            }
            FieldNodeState::Running => {}
        }
    }

    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let (Some(pipeline), Some(groups)) = (
            world.get_resource::<FieldPipeline>(),
            world.get_resource::<FieldBindGroups>(),
        ) else {
            return Ok(());
        };
        let cache = world.resource::<PipelineCache>();
        let textures = world.resource::<FieldTextures>();
        let workgroups = world.resource::<FieldUniforms>().workgroups();

        match self.state {
            FieldNodeState::Loading => {}
            FieldNodeState::Seeding => {
                let Some(seed) = cache.get_compute_pipeline(pipeline.seed) else {
                    return Ok(());
                };
                let mut pass = render_context
                    .command_encoder()
                    .begin_compute_pass(&ComputePassDescriptor::default());
                pass.set_pipeline(seed);
                // Both slots start from the same state.
                for slot in [Slot::A, Slot::B] {
                    pass.set_bind_group(0, groups.writing(slot), &[]);
                    pass.dispatch_workgroups(workgroups, workgroups, 1);
                }
            }
            FieldNodeState::Running => {
                let Some(update) = cache.get_compute_pipeline(pipeline.update) else {
                    return Ok(());
                };
                let mut pass = render_context
                    .command_encoder()
                    .begin_compute_pass(&ComputePassDescriptor::default());
                pass.set_pipeline(update);
                pass.set_bind_group(0, groups.writing(textures.buffers.current_slot()), &[]);
                pass.dispatch_workgroups(workgroups, workgroups, 1);
            }
        }

        Ok(())
    }
}
