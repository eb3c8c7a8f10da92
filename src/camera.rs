//! Camera types, orbit controller and uniforms for view/projection.
//!
//! The camera orbits a target point: pointer drags rotate around it, the
//! wheel zooms, and right-drags pan the target. [`CameraUniform`] packs the
//! view/projection data for the shaders.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector2, Vector3};
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

/// Perspective projection. The aspect ratio is recomputed from the viewport
/// on every resize rather than cached anywhere else.
#[derive(Debug)]
pub struct Projection {
    pub aspect: f32,
    pub height: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            height: height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
        self.height = height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbit controller: spherical coordinates around a movable center.
///
/// Pointer deltas are accumulated by the event handlers and applied (with
/// damping for rotation) in [`update`](Self::update), once per frame.
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub center: Point3<f32>,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vector2<f32>,
    pan_delta: Vector2<f32>,
    scroll_delta: f32,
}

impl OrbitControls {
    /// Build a controller orbiting `center`, starting from the given eye
    /// position (the spherical state is derived from the offset).
    pub fn new(center: Point3<f32>, eye: Point3<f32>) -> Self {
        let offset = eye - center;
        let radius = offset.magnitude().max(0.001);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let theta = offset.x.atan2(offset.z);

        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            min_distance: 0.1,
            max_distance: 1000.0,

            center,
            radius,
            theta,
            phi,

            rotate_delta: Vector2::new(0.0, 0.0),
            pan_delta: Vector2::new(0.0, 0.0),
            scroll_delta: 0.0,
        }
    }

    /// Feed a raw pointer delta while the orbit button is held.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_delta.x -= dx as f32;
        self.rotate_delta.y -= dy as f32;
    }

    /// Feed a raw pointer delta while the pan button is held.
    pub fn handle_pan(&mut self, dx: f64, dy: f64) {
        self.pan_delta.x += dx as f32;
        self.pan_delta.y += dy as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.scroll_delta += match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
            };
        }
    }

    /// Apply the accumulated input and write the resulting pose to `camera`.
    pub fn update(&mut self, camera: &mut Camera, projection: &Projection, dt: f32) {
        let screen_height = projection.height.max(1.0);
        let rotate_per_pixel = 2.0 * std::f32::consts::PI / screen_height;

        if self.enable_damping {
            let target_fps = 60.0;
            let retention = (1.0 - self.damping_factor).powf(dt * target_fps);
            let applied = self.rotate_delta * (1.0 - retention);

            self.theta += applied.x * rotate_per_pixel * self.rotate_speed;
            self.phi += applied.y * rotate_per_pixel * self.rotate_speed;

            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x * rotate_per_pixel * self.rotate_speed;
            self.phi += self.rotate_delta.y * rotate_per_pixel * self.rotate_speed;
            self.rotate_delta = Vector2::new(0.0, 0.0);
        }

        const EPS: f32 = 0.0001;
        self.phi = self.phi.clamp(EPS, std::f32::consts::PI - EPS);

        if self.scroll_delta != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(self.scroll_delta.abs());
            if self.scroll_delta > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
            self.radius = self.radius.clamp(self.min_distance, self.max_distance);
            self.scroll_delta = 0.0;
        }

        if self.pan_delta != Vector2::new(0.0, 0.0) {
            let half_fov = projection.fovy.0 / 2.0;
            let target_world_height = 2.0 * self.radius * half_fov.tan();
            let pixels_to_world = target_world_height / screen_height;

            let offset = self.offset(1.0);
            let forward = -offset.normalize();
            let right = forward.cross(Vector3::unit_y()).normalize();
            let up = right.cross(forward).normalize();

            self.center += (right * -self.pan_delta.x + up * self.pan_delta.y)
                * pixels_to_world
                * self.pan_speed;
            self.pan_delta = Vector2::new(0.0, 0.0);
        }

        camera.position = self.center + self.offset(self.radius);
        camera.target = self.center;
    }

    fn offset(&self, radius: f32) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            radius * sin_phi * self.theta.sin(),
            radius * self.phi.cos(),
            radius * sin_phi * self.theta.cos(),
        )
    }
}

/// The camera and everything the GPU needs to consume it.
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}
