use std::borrow::Cow;

use glam::Mat4;
use log::debug;
use wgpu::{util::DeviceExt, BindGroupLayoutEntry};

use crate::{
    material::{Blending, SnowMaterial},
    snowfall::SnowfallEffect,
    texture::SnowflakeTexture,
};

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniforms {
    model_view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    screen_size: [f32; 2],
    _padding: [f32; 2],
}

/// Sampled as linear data, like the sprite was authored.
const SPRITE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Quad corners, drawn as a triangle strip once per particle.
const CORNERS: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Draws a [`SnowfallEffect`] as instanced camera-facing quads.
pub struct SnowRenderer {
    snow_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    position_buffer: wgpu::Buffer,
    uniqueness_buffer: wgpu::Buffer,
    corner_buffer: wgpu::Buffer,
    num_particles: u32,

    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    texture_bound: bool,
    pipeline: wgpu::RenderPipeline,
}

impl SnowRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        swapchain_format: wgpu::TextureFormat,
        effect: &SnowfallEffect,
    ) -> Self {
        let system = effect.system();
        let material = &system.material;

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("snow"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(material.shader_source())),
        });

        let snow_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Snow Uniform Buffer"),
            contents: bytemuck::bytes_of(&material.uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snow Camera Buffer"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Snow Position Buffer"),
            contents: bytemuck::cast_slice(system.geometry.positions()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniqueness_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Snow Uniqueness Buffer"),
            contents: bytemuck::cast_slice(system.geometry.uniqueness()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let corner_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: None,
            contents: bytemuck::cast_slice(&CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: None,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // A single transparent texel adds nothing under additive blending
        let placeholder = SnowflakeTexture {
            width: 1,
            height: 1,
            rgba: vec![0; 4],
        };
        let texture_view = upload_texture(
            device,
            queue,
            material.texture.as_deref().unwrap_or(&placeholder),
        );
        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &snow_buffer,
            &camera_buffer,
            &texture_view,
            &sampler,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("snow"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("snow"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: 3 * 4,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 4,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![1 => Float32],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 2 * 4,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![2 => Float32x2],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment",
                targets: &[Some(wgpu::ColorTargetState {
                    format: swapchain_format,
                    blend: blend_state(material),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            // No depth test: flakes never occlude each other or the scene
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            snow_buffer,
            camera_buffer,
            position_buffer,
            uniqueness_buffer,
            corner_buffer,
            num_particles: system.geometry.len() as u32,

            sampler,
            bind_group_layout,
            bind_group,
            texture_bound: material.texture.is_some(),
            pipeline,
        }
    }

    /// Uploads this frame's uniforms, and the texture once it has arrived.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        effect: &SnowfallEffect,
        view: Mat4,
        projection: Mat4,
        [width, height]: [u32; 2],
    ) {
        let system = effect.system();

        if !self.texture_bound {
            if let Some(texture) = &system.material.texture {
                let texture_view = upload_texture(device, queue, texture);
                self.bind_group = create_bind_group(
                    device,
                    &self.bind_group_layout,
                    &self.snow_buffer,
                    &self.camera_buffer,
                    &texture_view,
                    &self.sampler,
                );
                self.texture_bound = true;
                debug!("Uploaded snowflake texture to the GPU");
            }
        }

        queue.write_buffer(
            &self.snow_buffer,
            0,
            bytemuck::bytes_of(&system.material.uniforms),
        );
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniforms {
                model_view: (view * system.transform).to_cols_array_2d(),
                projection: projection.to_cols_array_2d(),
                screen_size: [width as f32, height as f32],
                _padding: [0.0; 2],
            }),
        );
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.position_buffer.slice(..));
        rpass.set_vertex_buffer(1, self.uniqueness_buffer.slice(..));
        rpass.set_vertex_buffer(2, self.corner_buffer.slice(..));
        rpass.draw(0..4, 0..self.num_particles);
    }
}

fn blend_state(material: &SnowMaterial) -> Option<wgpu::BlendState> {
    if !material.transparent {
        return None;
    }

    Some(match material.blending {
        Blending::Normal => wgpu::BlendState::ALPHA_BLENDING,
        Blending::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
    })
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &SnowflakeTexture,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: texture.width,
        height: texture.height,
        depth_or_array_layers: 1,
    };

    let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Snowflake Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SPRITE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        gpu_texture.as_image_copy(),
        &texture.rgba,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * texture.width),
            rows_per_image: Some(texture.height),
        },
        size,
    );

    gpu_texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    snow_buffer: &wgpu::Buffer,
    camera_buffer: &wgpu::Buffer,
    texture_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: snow_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: camera_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::SnowUniforms;

    #[test]
    fn uniform_blocks_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SnowUniforms>(), 48);
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 144);
    }

    #[test]
    fn additive_blending_sums_onto_target() {
        let material = SnowMaterial::new(bytemuck::Zeroable::zeroed());
        let blend = blend_state(&material).unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.operation, wgpu::BlendOperation::Add);
    }

    #[test]
    fn sprite_is_sampled_linearly() {
        assert!(!SPRITE_FORMAT.is_srgb());
    }

    fn validated_shader() -> naga::Module {
        let module = naga::front::wgsl::parse_str(crate::material::SNOW_SHADER).unwrap();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap();
        module
    }

    #[test]
    fn shader_entry_points_match_pipeline() {
        let module = validated_shader();

        let stages: Vec<_> = module
            .entry_points
            .iter()
            .map(|entry| (entry.name.as_str(), entry.stage))
            .collect();
        assert_eq!(
            stages,
            [
                ("vertex", naga::ShaderStage::Vertex),
                ("fragment", naga::ShaderStage::Fragment)
            ]
        );

        // position, uniqueness, corner
        let locations: Vec<u32> = module.entry_points[0]
            .function
            .arguments
            .iter()
            .filter_map(|arg| match arg.binding {
                Some(naga::Binding::Location { location, .. }) => Some(location),
                _ => None,
            })
            .collect();
        assert_eq!(locations, [0, 1, 2]);
    }

    #[test]
    fn shader_bindings_match_bind_group_layout() {
        let module = validated_shader();

        let mut bindings: Vec<(u32, &naga::TypeInner)> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| {
                let binding = var.binding.as_ref()?;
                assert_eq!(binding.group, 0);
                Some((binding.binding, &module.types[var.ty].inner))
            })
            .collect();
        bindings.sort_by_key(|(binding, _)| *binding);

        let spans: Vec<_> = bindings
            .iter()
            .filter_map(|(binding, inner)| match inner {
                naga::TypeInner::Struct { span, .. } => Some((*binding, *span as usize)),
                _ => None,
            })
            .collect();
        assert_eq!(
            spans,
            [
                (0, std::mem::size_of::<SnowUniforms>()),
                (1, std::mem::size_of::<CameraUniforms>())
            ]
        );

        match &bindings[2..] {
            [(
                2,
                naga::TypeInner::Image {
                    dim: naga::ImageDimension::D2,
                    arrayed: false,
                    ..
                },
            ), (3, naga::TypeInner::Sampler { comparison: false })] => (),
            other => panic!("unexpected bindings: {other:?}"),
        }
    }
}
