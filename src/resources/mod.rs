//! Loading of scene assets from external files.
//!
//! The [`Loader`] acquires raw bytes (with fractional progress for
//! observability), hands them to the registered [`SceneCodec`], and uploads
//! the decoded scene to the GPU as a ready-to-draw subgraph plus its
//! animation clips.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, Mesh, Model},
        scene_graph::{ContainerNode, ModelNode, SceneNode},
        texture::Texture,
    },
    resources::codec::{NodeData, SceneCodec, SceneData},
};

pub mod animation;
pub mod bytes;
pub mod codec;

pub use animation::AnimationClip;

/// A loaded model: the scene subgraph and the clips that animate it.
pub struct DecodedModel {
    pub root: Box<dyn SceneNode>,
    pub clips: Vec<Arc<AnimationClip>>,
}

/// Asynchronous one-shot asset loader.
///
/// A codec has to be registered before [`load`](Self::load) is called; the
/// loader itself never interprets asset bytes.
#[derive(Default)]
pub struct Loader {
    codec: Option<Box<dyn SceneCodec>>,
}

impl Loader {
    pub fn new() -> Self {
        Self { codec: None }
    }

    /// Register the decode capability used by subsequent loads.
    pub fn set_codec(&mut self, codec: impl SceneCodec + 'static) {
        self.codec = Some(Box::new(codec));
    }

    /// Load and decode one asset. Returns the decoded subgraph and clips, or
    /// the terminal error; there is no retry.
    pub async fn load(
        &self,
        file_name: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<DecodedModel> {
        let codec = self
            .codec
            .as_ref()
            .context("no scene codec registered, call set_codec before load")?;
        let data = bytes::load_binary(file_name, &mut on_progress).await?;
        let scene = codec.decode(&data)?;
        instantiate(scene, device, queue)
    }
}

/// Upload a decoded scene to the GPU and build the node tree.
fn instantiate(
    scene: SceneData,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<DecodedModel> {
    let layout = Material::layout(device);

    let mut materials = Vec::new();
    for data in &scene.materials {
        let texture = match &data.base_color_image {
            Some(image) => Texture::from_bytes(
                device,
                queue,
                &image.bytes,
                &data.name,
                image.mime_type.as_deref().and_then(|mt| mt.split('/').next_back()),
            )?,
            None => Texture::solid_color(data.base_color_factor, device, queue, &data.name),
        };
        materials.push(Material::new(device, &data.name, texture, &layout));
    }
    // Primitives without a material fall back to plain white.
    let default_index = materials.len();
    materials.push(Material::new(
        device,
        "default",
        Texture::solid_color([1.0, 1.0, 1.0, 1.0], device, queue, "default"),
        &layout,
    ));

    let mut roots: Vec<Box<dyn SceneNode>> = scene
        .nodes
        .into_iter()
        .map(|node| build_node(node, &materials, default_index, device))
        .collect();

    let root = if roots.len() == 1 {
        roots.pop().unwrap()
    } else {
        let mut container = ContainerNode::new(None, Instance::default());
        for node in roots {
            container.add_child(node);
        }
        Box::new(container) as Box<dyn SceneNode>
    };

    let clips = scene.clips.into_iter().map(Arc::new).collect();

    Ok(DecodedModel { root, clips })
}

fn build_node(
    data: NodeData,
    materials: &[Material],
    default_index: usize,
    device: &wgpu::Device,
) -> Box<dyn SceneNode> {
    let mut node: Box<dyn SceneNode> = if data.primitives.is_empty() {
        Box::new(ContainerNode::new(Some(data.source_index), data.transform))
    } else {
        let meshes = data
            .primitives
            .iter()
            .map(|prim| {
                Mesh::new(
                    device,
                    &prim.name,
                    &prim.vertices,
                    &prim.indices,
                    prim.material.unwrap_or(default_index),
                )
            })
            .collect();
        let model = Model {
            meshes,
            materials: materials.to_vec(),
        };
        Box::new(ModelNode::new(
            Some(data.source_index),
            data.transform,
            model,
            false,
            device,
        ))
    };

    for child in data.children {
        node.add_child(build_node(child, materials, default_index, device));
    }

    node
}
