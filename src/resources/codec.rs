//! The scene decode capability.
//!
//! The loader never parses asset bytes itself: a [`SceneCodec`] has to be
//! registered first and turns the raw file into [`SceneData`] — a CPU-side
//! node hierarchy, materials and animation clips. [`GltfCodec`] is the
//! production codec for binary glTF containers.

use std::io::{BufReader, Cursor};

use anyhow::{Context, Result, bail};

use crate::{
    data_structures::{instance::Instance, model::ModelVertex},
    resources::animation::{
        AnimationClip, Interpolation, KeyframeTrack, Track, TrackData,
    },
};

/// Decodes one scene asset: `bytes -> geometry + clips`.
pub trait SceneCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<SceneData>;
}

/// A decoded scene, not yet uploaded to the GPU.
pub struct SceneData {
    pub nodes: Vec<NodeData>,
    pub materials: Vec<MaterialData>,
    pub clips: Vec<AnimationClip>,
}

pub struct NodeData {
    pub name: String,
    /// Index of the node in the source file, referenced by animation tracks.
    pub source_index: usize,
    pub transform: Instance,
    pub primitives: Vec<PrimitiveData>,
    pub children: Vec<NodeData>,
}

pub struct PrimitiveData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

pub struct MaterialData {
    pub name: String,
    pub base_color_factor: [f32; 4],
    pub base_color_image: Option<ImageData>,
}

pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Binary glTF (.glb) decoder built on the `gltf` crate.
pub struct GltfCodec;

impl SceneCodec for GltfCodec {
    fn decode(&self, bytes: &[u8]) -> Result<SceneData> {
        let gltf_cursor = Cursor::new(bytes);
        let gltf_reader = BufReader::new(gltf_cursor);
        let gltf = gltf::Gltf::from_reader(gltf_reader)?;

        // Load buffers
        let mut buffer_data: Vec<Vec<u8>> = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => {
                    if let Some(blob) = gltf.blob.as_deref() {
                        buffer_data.push(blob.into());
                    }
                }
                gltf::buffer::Source::Uri(uri) => {
                    bail!("buffer {uri:?} is external; only self-contained .glb assets are supported");
                }
            }
        }

        let clips = read_clips(&gltf, &buffer_data);
        let materials = read_materials(&gltf, &buffer_data)?;

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .context("asset contains no scene")?;
        let nodes = scene
            .nodes()
            .map(|node| read_node(node, &buffer_data))
            .collect();

        Ok(SceneData {
            nodes,
            materials,
            clips,
        })
    }
}

fn read_clips(gltf: &gltf::Gltf, buffer_data: &[Vec<u8>]) -> Vec<AnimationClip> {
    let mut clips = Vec::new();
    for animation in gltf.animations() {
        let mut tracks = Vec::new();
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let timestamps: Vec<f32> = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                Some(gltf::accessor::Iter::Sparse(_)) => {
                    log::warn!(
                        "sparse animation input in channel {} is not supported",
                        channel.index()
                    );
                    continue;
                }
                None => {
                    log::warn!("no animation input found in channel {}", channel.index());
                    continue;
                }
            };
            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => Interpolation::Step,
                gltf::animation::Interpolation::Linear => Interpolation::Linear,
                // Cubic tangents are dropped; the key values still play back
                // linearly.
                gltf::animation::Interpolation::CubicSpline => Interpolation::Linear,
            };
            let cubic = matches!(
                channel.sampler().interpolation(),
                gltf::animation::Interpolation::CubicSpline
            );

            let data = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    let values = keep_key_values(
                        translations.map(|tr| tr.into()).collect(),
                        cubic,
                    );
                    TrackData::Translation(KeyframeTrack::new(timestamps, values, interpolation))
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    let values = keep_key_values(
                        rotations.into_f32().map(|quat| quat.into()).collect(),
                        cubic,
                    );
                    TrackData::Rotation(KeyframeTrack::new(timestamps, values, interpolation))
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    let values =
                        keep_key_values(scales.map(|sc| sc.into()).collect(), cubic);
                    TrackData::Scale(KeyframeTrack::new(timestamps, values, interpolation))
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => {
                    log::warn!(
                        "morph target weights in channel {} are not supported",
                        channel.index()
                    );
                    continue;
                }
                None => {
                    log::warn!("no keyframes found in channel {}", channel.index());
                    continue;
                }
            };

            tracks.push(Track {
                node_index: channel.target().node().index(),
                data,
            });
        }
        let name = animation.name().unwrap_or("Default").to_string();
        clips.push(AnimationClip::new(name, tracks));
    }
    clips
}

/// Cubic-spline samplers store `[in_tangent, value, out_tangent]` triplets;
/// keep the middle element of each.
fn keep_key_values<T>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if !cubic {
        return values;
    }
    values
        .into_iter()
        .skip(1)
        .step_by(3)
        .collect()
}

fn read_materials(gltf: &gltf::Gltf, buffer_data: &[Vec<u8>]) -> Result<Vec<MaterialData>> {
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let base_color_image = match pbr.base_color_texture() {
            Some(tex) => match tex.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => Some(ImageData {
                    bytes: buffer_data[view.buffer().index()]
                        [view.offset()..view.offset() + view.length()]
                        .to_vec(),
                    mime_type: Some(mime_type.to_string()),
                }),
                gltf::image::Source::Uri { uri, .. } => {
                    log::warn!(
                        "image {uri:?} is external; falling back to the base colour factor"
                    );
                    None
                }
            },
            None => None,
        };
        materials.push(MaterialData {
            name: material.name().unwrap_or("unnamed").to_string(),
            base_color_factor: pbr.base_color_factor(),
            base_color_image,
        });
    }
    Ok(materials)
}

fn read_node(node: gltf::scene::Node, buffer_data: &[Vec<u8>]) -> NodeData {
    let mut primitives = Vec::new();
    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("unknown_mesh").to_string();
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

            let mut vertices: Vec<ModelVertex> = Vec::new();
            if let Some(positions) = reader.read_positions() {
                vertices = positions
                    .map(|position| ModelVertex {
                        position,
                        ..Default::default()
                    })
                    .collect();
            }
            if let Some(normals) = reader.read_normals() {
                for (vertex, normal) in vertices.iter_mut().zip(normals) {
                    vertex.normal = normal;
                }
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|tc| tc.into_f32()) {
                for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
                    vertex.tex_coords = tex_coord;
                }
            }

            let indices = match reader.read_indices() {
                Some(raw) => raw.into_u32().collect(),
                // Non-indexed geometry draws its vertices in order.
                None => (0..vertices.len() as u32).collect(),
            };

            primitives.push(PrimitiveData {
                name: mesh_name.clone(),
                vertices,
                indices,
                material: primitive.material().index(),
            });
        }
    }

    let decomposed = node.transform().decomposed();
    let transform = Instance {
        position: decomposed.0.into(),
        rotation: decomposed.1.into(),
        scale: decomposed.2.into(),
    };

    let children = node
        .children()
        .map(|child| read_node(child, buffer_data))
        .collect();

    NodeData {
        name: node.name().unwrap_or("unnamed").to_string(),
        source_index: node.index(),
        transform,
        primitives,
        children,
    }
}
