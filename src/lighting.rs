//! Spotlights, the staged lighting cues, and their GPU resources.
//!
//! The stage carries up to [`MAX_SPOT_LIGHTS`] spotlights. Lights are
//! append-only: once added they are never removed or dimmed. Each light can
//! render a shadow map layer; the main pass samples all of them through one
//! bind group.

use instant::Duration;

use bytemuck::Zeroable;
use cgmath::{Matrix4, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;

use crate::{camera::OPENGL_TO_WGPU_MATRIX, data_structures::texture::Texture};

/// Time until the lighting sequence starts after the model has loaded.
pub const BASE_TIMEOUT: Duration = Duration::from_millis(2000);

pub const MAX_SPOT_LIGHTS: usize = 3;

/// Square shadow map resolution per light.
pub const SHADOW_MAP_SIZE: u32 = 1024;

const SHADOW_NEAR: f32 = 0.1;
const SHADOW_FAR: f32 = 50.0;

/// Per-light slot stride in the shadow-pass uniform buffer. Slots are bound
/// with dynamic offsets, which must be aligned to 256 bytes.
pub const SHADOW_UNIFORM_STRIDE: u64 = 256;

/// A cone of light aimed at a target point.
#[derive(Clone, Debug)]
pub struct SpotLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    /// Half-angle of the cone, in radians.
    pub angle: f32,
    /// Fraction of the cone over which the light fades out, 0..1.
    pub penumbra: f32,
    pub casts_shadow: bool,
}

impl SpotLight {
    pub fn new<P: Into<Point3<f32>>>(
        color: [f32; 3],
        intensity: f32,
        position: P,
        angle: f32,
        penumbra: f32,
    ) -> Self {
        Self {
            color,
            intensity,
            position: position.into(),
            target: Point3::new(0.0, 0.0, 0.0),
            angle,
            penumbra,
            casts_shadow: false,
        }
    }

    pub fn direction(&self) -> Vector3<f32> {
        use cgmath::InnerSpace;
        (self.target - self.position).normalize()
    }

    /// The light's view-projection matrix, used both to render its shadow
    /// map and to project fragments onto it.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let proj = cgmath::perspective(Rad(self.angle * 2.0), 1.0, SHADOW_NEAR, SHADOW_FAR);
        let view = Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y());
        OPENGL_TO_WGPU_MATRIX * proj * view
    }

    pub fn to_raw(&self) -> SpotLightRaw {
        // The fade starts at the penumbra-scaled inner cone and ends at the
        // outer cone edge.
        let cos_outer = self.angle.cos();
        let cos_inner = (self.angle * (1.0 - self.penumbra)).cos();
        SpotLightRaw {
            view_proj: self.view_proj().into(),
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            direction: {
                let d = self.direction();
                [d.x, d.y, d.z, 0.0]
            },
            color: [self.color[0], self.color[1], self.color[2], self.intensity],
            params: [
                cos_outer,
                cos_inner,
                if self.casts_shadow { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// A scheduled lighting change: one spotlight and its delay after load.
pub struct LightCue {
    pub delay: Duration,
    pub light: SpotLight,
}

/// The fixed cue sheet: warm red and blue rim lights, then a soft green fill,
/// half a second apart, all shadow casting.
pub fn stage_cues() -> [LightCue; MAX_SPOT_LIGHTS] {
    use std::f32::consts::PI;

    let mut red = SpotLight::new(
        [1.0, 0.2, 0.2],
        16.0,
        [-0.5, 1.0, -1.0],
        PI / 16.0,
        0.9,
    );
    red.casts_shadow = true;
    let mut blue = SpotLight::new([0.2, 0.2, 1.0], 16.0, [-0.5, 1.0, 1.0], PI / 16.0, 0.9);
    blue.casts_shadow = true;
    let mut green = SpotLight::new([0.53, 1.0, 0.53], 2.0, [0.5, 1.0, 0.0], PI / 6.0, 0.5);
    green.casts_shadow = true;

    [
        LightCue {
            delay: BASE_TIMEOUT,
            light: red,
        },
        LightCue {
            delay: BASE_TIMEOUT + Duration::from_millis(500),
            light: blue,
        },
        LightCue {
            delay: BASE_TIMEOUT + Duration::from_millis(1000),
            light: green,
        },
    ]
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightRaw {
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
    direction: [f32; 4],
    // rgb plus intensity in w
    color: [f32; 4],
    // cos of the outer cone, cos of the inner cone, shadow flag
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    lights: [SpotLightRaw; MAX_SPOT_LIGHTS],
    // Only x is meaningful; uniform blocks round up to 16 bytes anyway.
    count: [u32; 4],
}

/// Everything the renderer needs for lighting: the appended lights, their
/// uniform block, and the shadow map array with its per-layer views.
pub struct LightingResources {
    lights: Vec<SpotLight>,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub shadow_map: Texture,
    layer_views: Vec<wgpu::TextureView>,
    pub shadow_uniform_buffer: wgpu::Buffer,
    pub shadow_bind_group: wgpu::BindGroup,
    pub shadow_bind_group_layout: wgpu::BindGroupLayout,
}

impl LightingResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightsUniform {
            lights: [SpotLightRaw::zeroed(); MAX_SPOT_LIGHTS],
            count: [0; 4],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow_map = Texture::create_shadow_map(
            device,
            SHADOW_MAP_SIZE,
            MAX_SPOT_LIGHTS as u32,
            "shadow_map",
        );
        let layer_views = (0..MAX_SPOT_LIGHTS as u32)
            .map(|layer| {
                shadow_map.texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("shadow_map_layer"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
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
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("lights_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(
                        shadow_map.sampler.as_ref().unwrap(),
                    ),
                },
            ],
            label: Some("lights_bind_group"),
        });

        let shadow_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Pass Uniform Buffer"),
            size: SHADOW_UNIFORM_STRIDE * MAX_SPOT_LIGHTS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shadow_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<
                            [[f32; 4]; 4],
                        >() as u64),
                    },
                    count: None,
                }],
                label: Some("shadow_bind_group_layout"),
            });

        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &shadow_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &shadow_uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<[[f32; 4]; 4]>() as u64),
                }),
            }],
            label: Some("shadow_bind_group"),
        });

        Self {
            lights: Vec::new(),
            uniform_buffer,
            bind_group,
            bind_group_layout,
            shadow_map,
            layer_views,
            shadow_uniform_buffer,
            shadow_bind_group,
            shadow_bind_group_layout,
        }
    }

    /// Append a light to the stage and refresh the GPU copies. Lights beyond
    /// the fixed capacity are dropped with a warning.
    pub fn add_light(&mut self, light: SpotLight, queue: &wgpu::Queue) {
        if self.lights.len() >= MAX_SPOT_LIGHTS {
            log::warn!(
                "light limit of {} reached, ignoring additional light",
                MAX_SPOT_LIGHTS
            );
            return;
        }
        let index = self.lights.len();
        let view_proj: [[f32; 4]; 4] = light.view_proj().into();
        queue.write_buffer(
            &self.shadow_uniform_buffer,
            index as u64 * SHADOW_UNIFORM_STRIDE,
            bytemuck::cast_slice(&[view_proj]),
        );
        self.lights.push(light);

        let uniform = self.build_uniform();
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn lights(&self) -> &[SpotLight] {
        &self.lights
    }

    pub fn count(&self) -> usize {
        self.lights.len()
    }

    pub fn layer_view(&self, index: usize) -> &wgpu::TextureView {
        &self.layer_views[index]
    }

    fn build_uniform(&self) -> LightsUniform {
        let mut lights = [SpotLightRaw::zeroed(); MAX_SPOT_LIGHTS];
        for (raw, light) in lights.iter_mut().zip(self.lights.iter()) {
            *raw = light.to_raw();
        }
        LightsUniform {
            lights,
            count: [self.lights.len() as u32, 0, 0, 0],
        }
    }
}
