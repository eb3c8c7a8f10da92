//! Definitions for the render pipelines: the lit forward pass and the
//! depth-only shadow pass.

pub mod basic;
pub mod shadow;

pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
}
