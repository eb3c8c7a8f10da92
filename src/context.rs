//! Central GPU and window context.
//!
//! [`Context`] owns the surface, device, queue, camera, lighting and
//! pipelines, and handles viewport resizes. It is constructed once at
//! startup and passed by reference into every component; there is no global
//! state and no teardown beyond process exit.

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::{self, CameraResources, CameraUniform},
    data_structures::texture::Texture,
    lighting::LightingResources,
    pipelines::{Pipelines, basic::mk_basic_pipeline, shadow::mk_shadow_pipeline},
};

/// Device pixel ratios above this are clamped to bound GPU fill-rate cost
/// on high-density displays.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

pub fn clamped_pixel_ratio(scale_factor: f64) -> f64 {
    scale_factor.min(MAX_PIXEL_RATIO)
}

/// The surface size for a window whose contents were scaled by
/// `scale_factor`: the window's logical size times the clamped ratio.
pub fn surface_extent(size: PhysicalSize<u32>, scale_factor: f64) -> PhysicalSize<u32> {
    if scale_factor <= 0.0 {
        return size;
    }
    let factor = clamped_pixel_ratio(scale_factor) / scale_factor;
    PhysicalSize::new(
        (size.width as f64 * factor).round() as u32,
        (size.height as f64 * factor).round() as u32,
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MouseButtonState {
    Left,
    Right,
    None,
}

/// Which pointer button is currently held, for routing motion deltas to the
/// orbit controller.
#[derive(Debug)]
pub struct MouseState {
    pub pressed: MouseButtonState,
}

pub struct Context {
    pub window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: camera::Projection,
    pub lighting: LightingResources,
    pub pipelines: Pipelines,
    pub mouse: MouseState,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders assume an Srgb surface texture; picking a non-Srgb
        // format here would darken all colours.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let extent = surface_extent(size, window.scale_factor());
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: extent.width.max(1),
            height: extent.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        // Slightly above the ground, one unit to the side, orbiting the
        // model's chest height.
        let camera = camera::Camera::new((1.0, 0.3, 0.0), (0.0, 0.3, 0.0));
        let projection = camera::Projection::new(
            config.width,
            config.height,
            cgmath::Deg(75.0),
            0.1,
            1000.0,
        );
        let camera_controller = camera::OrbitControls::new(camera.target, camera.position);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let lighting = LightingResources::new(&device);

        let pipelines = Pipelines {
            basic: mk_basic_pipeline(
                &device,
                &config,
                &camera_bind_group_layout,
                &lighting.bind_group_layout,
            ),
            shadow: mk_shadow_pipeline(&device, &lighting.shadow_bind_group_layout),
        };

        let camera = CameraResources {
            camera,
            controller: camera_controller,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            lighting,
            pipelines,
            mouse: MouseState {
                pressed: MouseButtonState::None,
            },
        })
    }

    /// Apply a viewport change: recompute the camera aspect, reconfigure the
    /// surface at the clamped pixel ratio, and rebuild the depth buffer.
    /// Safe to call any number of times with the same dimensions.
    pub fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        let extent = surface_extent(size, scale_factor);
        if extent.width == 0 || extent.height == 0 {
            return;
        }
        self.config.width = extent.width;
        self.config.height = extent.height;
        self.projection.resize(extent.width, extent.height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
    }
}
