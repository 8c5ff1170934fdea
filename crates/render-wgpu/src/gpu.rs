use crate::shaders;
use atrium_assets::{CubeMap, MeshVertex};
use atrium_render::{DrawItem, PerspectiveCamera, Scene};
use bytemuck::{Pod, Zeroable};
use std::collections::BTreeMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const ENV_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
    fog_color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl From<&MeshVertex> for Vertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    base_color: [f32; 4],
    surface: [f32; 4],
}

impl From<&DrawItem> for InstanceData {
    fn from(item: &DrawItem) -> Self {
        let cols = item.world.to_cols_array_2d();
        let m = &item.material;
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            base_color: m.base_color,
            surface: [m.metalness, m.roughness, m.opacity, 0.0],
        }
    }
}

/// Key of an uploaded primitive: model, mesh, primitive index.
type PrimitiveKey = (usize, usize, usize);

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct Environment {
    source: Option<Arc<CubeMap>>,
    view: wgpu::TextureView,
}

/// wgpu scene renderer: lit opaque meshes, blended glass, and the loading
/// overlay, all in one multisampled pass.
pub struct WgpuRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    glass_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    env_sampler: wgpu::Sampler,
    environment: Environment,
    primitives: BTreeMap<PrimitiveKey, GpuPrimitive>,
    uploaded_revision: Option<u64>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    depth_texture: wgpu::TextureView,
    msaa_texture: Option<wgpu::TextureView>,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let env_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("env_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Grey 1x1 cube until the real environment arrives.
        let environment = Environment {
            source: None,
            view: create_cube_texture(device, queue, 1, |_| vec![128, 128, 128, 255]),
        };
        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &globals_buffer,
            &environment.view,
            &env_sampler,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::OVERLAY_SHADER.into()),
        });

        let multisample = wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        };

        let mesh_pipeline = |label: &str, blend: wgpu::BlendState, glass: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &scene_shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<Vertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![
                                0 => Float32x3,
                                1 => Float32x3,
                            ],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<InstanceData>() as u64,
                            step_mode: wgpu::VertexStepMode::Instance,
                            attributes: &wgpu::vertex_attr_array![
                                2 => Float32x4,
                                3 => Float32x4,
                                4 => Float32x4,
                                5 => Float32x4,
                                6 => Float32x4,
                                7 => Float32x4,
                            ],
                        },
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &scene_shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    // glTF models are authored single-sided; glass is seen from both sides.
                    cull_mode: if glass { None } else { Some(wgpu::Face::Back) },
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: !glass,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample,
                multiview: None,
                cache: None,
            })
        };
        let opaque_pipeline = mesh_pipeline("opaque_pipeline", wgpu::BlendState::REPLACE, false);
        let glass_pipeline = mesh_pipeline("glass_pipeline", wgpu::BlendState::ALPHA_BLENDING, true);

        let overlay_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &overlay_shader,
                entry_point: Some("vs_overlay"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &overlay_shader,
                entry_point: Some("fs_overlay"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample,
            multiview: None,
            cache: None,
        });

        let instance_capacity = 256;
        let instance_buffer = create_instance_buffer(device, instance_capacity);

        let depth_texture = create_depth_texture(device, sample_count, width, height);
        let msaa_texture = create_msaa_texture(device, surface_format, sample_count, width, height);

        tracing::debug!(sample_count, ?surface_format, "scene renderer created");

        Self {
            opaque_pipeline,
            glass_pipeline,
            overlay_pipeline,
            globals_buffer,
            bind_group_layout,
            bind_group,
            env_sampler,
            environment,
            primitives: BTreeMap::new(),
            uploaded_revision: None,
            instance_buffer,
            instance_capacity,
            depth_texture,
            msaa_texture,
            surface_format,
            sample_count,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = create_depth_texture(device, self.sample_count, width, height);
        self.msaa_texture =
            create_msaa_texture(device, self.surface_format, self.sample_count, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Upload meshes and the environment when the scene's content changed.
    fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        if self.uploaded_revision == Some(scene.revision()) {
            return;
        }

        for (model_index, placed) in scene.models().iter().enumerate() {
            for (mesh_index, mesh) in placed.model.meshes.iter().enumerate() {
                for (prim_index, prim) in mesh.primitives.iter().enumerate() {
                    let key = (model_index, mesh_index, prim_index);
                    if self.primitives.contains_key(&key) || prim.indices.is_empty() {
                        continue;
                    }
                    let vertices: Vec<Vertex> = prim.vertices.iter().map(Vertex::from).collect();
                    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("mesh_vertex_buffer"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("mesh_index_buffer"),
                        contents: bytemuck::cast_slice(&prim.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    });
                    self.primitives.insert(
                        key,
                        GpuPrimitive {
                            vertex_buffer,
                            index_buffer,
                            index_count: prim.indices.len() as u32,
                        },
                    );
                }
            }
        }

        let env_changed = match (scene.environment(), &self.environment.source) {
            (Some(new), Some(old)) => !Arc::ptr_eq(new, old),
            (Some(_), None) => true,
            _ => false,
        };
        if let Some(cube) = scene.environment().filter(|_| env_changed) {
            let view = create_cube_texture(device, queue, cube.size(), |layer| {
                cube.faces()[layer].rgba.clone()
            });
            self.environment = Environment {
                source: Some(cube.clone()),
                view,
            };
            self.bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.globals_buffer,
                &self.environment.view,
                &self.env_sampler,
            );
            tracing::info!(size = cube.size(), "environment map uploaded");
        }

        tracing::debug!(
            revision = scene.revision(),
            primitives = self.primitives.len(),
            "scene resources synced"
        );
        self.uploaded_revision = Some(scene.revision());
    }

    /// Render one frame of `scene` into `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        self.sync(device, queue, scene);

        let fog = scene.fog.as_ref();
        let sun = &scene.sun;
        let sun_color = sun.color.to_linear();
        let globals = Globals {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            sun_dir: sun.direction().extend(0.0).to_array(),
            sun_color: [
                sun_color[0] * sun.intensity,
                sun_color[1] * sun.intensity,
                sun_color[2] * sun.intensity,
                1.0,
            ],
            fog_color: match fog {
                Some(f) => {
                    let c = f.color.to_linear();
                    [c[0], c[1], c[2], 1.0]
                }
                None => [0.0; 4],
            },
            params: [
                fog.map_or(0.0, |f| f.near),
                fog.map_or(0.0, |f| f.far),
                if self.environment.source.is_some() { 1.0 } else { 0.0 },
                scene.overlay_alpha.clamp(0.0, 1.0),
            ],
        };
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let items: Vec<DrawItem> = scene
            .draw_items()
            .into_iter()
            .filter(|i| self.primitives.contains_key(&(i.model, i.mesh, i.primitive)))
            .collect();
        let instances: Vec<InstanceData> = items.iter().map(InstanceData::from).collect();
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let clear = scene.clear_color.to_linear();
        let (color_view, resolve_target) = match &self.msaa_texture {
            Some(msaa) => (msaa, Some(view)),
            None => (view, None),
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: clear[3] as f64,
                        }),
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

            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            // Draw items arrive opaque first, then transparent.
            let mut glass = false;
            pass.set_pipeline(&self.opaque_pipeline);
            for (i, item) in items.iter().enumerate() {
                if item.is_transparent() && !glass {
                    glass = true;
                    pass.set_pipeline(&self.glass_pipeline);
                }
                let Some(prim) = self.primitives.get(&(item.model, item.mesh, item.primitive)) else {
                    continue;
                };
                let instance = i as u32;
                pass.set_vertex_buffer(0, prim.vertex_buffer.slice(..));
                pass.set_index_buffer(prim.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..prim.index_count, 0, instance..instance + 1);
            }

            if scene.overlay_alpha > 0.0 {
                pass.set_pipeline(&self.overlay_pipeline);
                pass.draw(0..3, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    globals: &wgpu::Buffer,
    env_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("globals_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(env_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Create a six-layer cube texture of `size`, filling layer `i` with `face(i)`.
fn create_cube_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    size: u32,
    face: impl Fn(usize) -> Vec<u8>,
) -> wgpu::TextureView {
    let extent = wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: 6,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("env_cube_texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ENV_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for layer in 0..6 {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer as u32,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &face(layer),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
    }
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("env_cube_view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    sample_count: u32,
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
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

/// Multisampled color target, or `None` when rendering without MSAA.
fn create_msaa_texture(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    sample_count: u32,
    width: u32,
    height: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_color_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&Default::default()))
}
