//! limelight
//!
//! A small staged-model viewer built on wgpu: one animated glTF model on a
//! ground plane, an orbiting camera, and three spotlights that come up in
//! sequence before the model's animation clips play once. Cross-platform,
//! native and WASM.
//!
//! High-level modules
//! - `animation`: playback actions and the per-model mixer
//! - `camera`: camera types, orbit controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, scene graph, textures)
//! - `flow`: the viewer application and its event loop
//! - `lighting`: spotlights, the staged cues and their GPU resources
//! - `pipelines`: definitions for the render pipelines (lit pass, shadow pass)
//! - `render`: per-frame pass composition
//! - `resources`: asset loading, the decode codec and animation clip data
//! - `timer`: one-shot timers and the frame clock
//!

pub mod animation;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod lighting;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod timer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
