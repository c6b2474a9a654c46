use crate::camera::FollowCamera;
use crate::shaders::{self, MAX_SPOTS};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use tumbler_assets::AssetId;
use tumbler_common::rgb_hex;
use tumbler_render::{SceneLighting, SpotLight};
use tumbler_rig::{PLACEHOLDER_COLOR, PLACEHOLDER_SIZE, Visual};
use tumbler_scene::Scene;
use wgpu::util::DeviceExt;

/// Drum surface colour.
pub const SURFACE_COLOR: u32 = 0x1ff11f;
/// Drum surface alpha.
pub const SURFACE_OPACITY: f32 = 0.6;
/// Tint applied to a loaded character mesh.
const MODEL_COLOR: u32 = 0xcccccc;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuSpot {
    position: [f32; 4],
    direction: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

impl GpuSpot {
    fn from_light(light: &SpotLight) -> Self {
        let p = light.position;
        let d = light.direction;
        let [r, g, b] = light.color;
        Self {
            position: [p.x, p.y, p.z, light.distance],
            direction: [d.x, d.y, d.z, light.cos_outer],
            color: [r, g, b, light.intensity],
            params: [light.cos_inner, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    ambient: [f32; 4],
    spots: [GpuSpot; MAX_SPOTS],
}

impl Uniforms {
    /// Lights past `MAX_SPOTS` are dropped; missing ones stay zeroed and
    /// contribute nothing.
    fn new(camera: &FollowCamera, lighting: &SceneLighting) -> Self {
        let mut spots = [GpuSpot::zeroed(); MAX_SPOTS];
        for (slot, light) in spots.iter_mut().zip(&lighting.spots) {
            *slot = GpuSpot::from_light(light);
        }
        let eye = camera.eye();
        let [r, g, b] = lighting.ambient;
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            eye: [eye.x, eye.y, eye.z, 1.0],
            ambient: [r, g, b, 1.0],
            spots,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: [f32; 4]) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

/// What the rig pipeline should draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RigDraw {
    Nothing,
    Placeholder(InstanceData),
    Model(AssetId, InstanceData),
}

fn rig_draw(scene: &Scene) -> RigDraw {
    let rig = scene.rig();
    let base = rig.transform().matrix();
    match rig.visual() {
        Visual::Absent => RigDraw::Nothing,
        Visual::Placeholder => {
            // Unit box centred on the rig origin.
            let model = base * Mat4::from_scale(PLACEHOLDER_SIZE);
            RigDraw::Placeholder(InstanceData::new(model, rgb_hex(PLACEHOLDER_COLOR, 1.0)))
        }
        Visual::Model(bundle) => {
            RigDraw::Model(bundle.id, InstanceData::new(base, rgb_hex(MODEL_COLOR, 1.0)))
        }
    }
}

fn surface_instance(scene: &Scene) -> InstanceData {
    InstanceData::new(
        scene.surface().model_matrix(),
        rgb_hex(SURFACE_COLOR, SURFACE_OPACITY),
    )
}

/// Unit cube centred on the origin.
fn unit_box() -> (Vec<Vec3>, Vec<u32>) {
    let p = 0.5_f32;
    let positions = vec![
        Vec3::new(-p, -p, -p),
        Vec3::new(p, -p, -p),
        Vec3::new(p, p, -p),
        Vec3::new(-p, p, -p),
        Vec3::new(-p, -p, p),
        Vec3::new(p, -p, p),
        Vec3::new(p, p, p),
        Vec3::new(-p, p, p),
    ];
    #[rustfmt::skip]
    let indices = vec![
        4,5,6, 6,7,4, // +Z
        1,0,3, 3,2,1, // -Z
        5,1,2, 2,6,5, // +X
        0,4,7, 7,3,0, // -X
        7,6,2, 2,3,7, // +Y
        0,1,5, 5,4,0, // -Y
    ];
    (positions, indices)
}

/// Position and index buffers for one mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: usize,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(
        device: &wgpu::Device,
        label: &str,
        positions: &[Vec3],
        indices: &[u32],
        dynamic: bool,
    ) -> Self {
        let mut usage = wgpu::BufferUsages::VERTEX;
        if dynamic {
            usage |= wgpu::BufferUsages::COPY_DST;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertices")),
            contents: bytemuck::cast_slice(positions),
            usage,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            vertex_count: positions.len(),
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instance: u32) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, instance..instance + 1);
    }
}

const RIG_INSTANCE: u32 = 0;
const SURFACE_INSTANCE: u32 = 1;

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    surface_mesh: GpuMesh,
    placeholder_mesh: GpuMesh,
    model_mesh: Option<(AssetId, GpuMesh)>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &Scene,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("world_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::WORLD_SHADER.into()),
        });

        let opaque_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            "opaque_pipeline",
            false,
        );
        let translucent_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            "translucent_pipeline",
            true,
        );

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: 2 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let surface = scene.surface();
        let surface_mesh = GpuMesh::upload(
            device,
            "surface",
            surface.positions(),
            surface.indices(),
            true,
        );
        let (box_positions, box_indices) = unit_box();
        let placeholder_mesh =
            GpuMesh::upload(device, "placeholder", &box_positions, &box_indices, false);

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::debug!(
            vertices = surface.vertex_count(),
            indices = surface.indices().len(),
            "renderer created"
        );

        Self {
            opaque_pipeline,
            translucent_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            surface_mesh,
            placeholder_mesh,
            model_mesh: None,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Upload the rig's loaded mesh the first frame it is seen.
    fn sync_model(&mut self, device: &wgpu::Device, scene: &Scene, id: AssetId) {
        if matches!(&self.model_mesh, Some((current, _)) if *current == id) {
            return;
        }
        if let Some(mesh) = scene.rig().model_mesh() {
            let _span = tracing::debug_span!("upload_model", vertices = mesh.positions.len())
                .entered();
            let gpu = GpuMesh::upload(device, "model", &mesh.positions, &mesh.indices, false);
            self.model_mesh = Some((id, gpu));
        }
    }

    /// Render one frame: opaque rig first, then the translucent drum.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &FollowCamera,
        scene: &Scene,
        lighting: &SceneLighting,
    ) {
        let _span = tracing::trace_span!("render_frame", frame = scene.frame()).entered();

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::new(camera, lighting)),
        );

        let positions = scene.surface().positions();
        if positions.len() == self.surface_mesh.vertex_count {
            queue.write_buffer(
                &self.surface_mesh.vertex_buffer,
                0,
                bytemuck::cast_slice(positions),
            );
        } else {
            self.surface_mesh = GpuMesh::upload(
                device,
                "surface",
                positions,
                scene.surface().indices(),
                true,
            );
        }

        let rig = rig_draw(scene);
        let rig_instance = match rig {
            RigDraw::Nothing => InstanceData::zeroed(),
            RigDraw::Placeholder(instance) => instance,
            RigDraw::Model(id, instance) => {
                self.sync_model(device, scene, id);
                instance
            }
        };
        let mut instances = [InstanceData::zeroed(); 2];
        instances[RIG_INSTANCE as usize] = rig_instance;
        instances[SURFACE_INSTANCE as usize] = surface_instance(scene);
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            let rig_mesh = match rig {
                RigDraw::Nothing => None,
                RigDraw::Placeholder(_) => Some(&self.placeholder_mesh),
                RigDraw::Model(..) => self.model_mesh.as_ref().map(|(_, mesh)| mesh),
            };
            if let Some(mesh) = rig_mesh {
                pass.set_pipeline(&self.opaque_pipeline);
                mesh.draw(&mut pass, RIG_INSTANCE);
            }

            pass.set_pipeline(&self.translucent_pipeline);
            self.surface_mesh.draw(&mut pass, SURFACE_INSTANCE);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// Both pipelines share the shader and vertex layout. The translucent one
/// blends and tests depth without writing it; neither culls, so the drum's
/// inner faces stay visible through its outer ones.
fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    translucent: bool,
) -> wgpu::RenderPipeline {
    let blend = if translucent {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vec3>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        1 => Float32x4,
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: !translucent,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}
