//! Codec tests
//!
//! Feeds the glb codec a small hand-assembled binary glTF (one mesh under a
//! transform node, one translation animation) and checks the decoded scene
//! data, plus the terminal failure path for unreadable bytes.

use limelight::resources::animation::TrackData;
use limelight::resources::codec::{GltfCodec, SceneCodec};

const GLB_MAGIC: u32 = 0x46546C67;
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

fn chunk(chunk_type: u32, mut data: Vec<u8>, pad: u8) -> Vec<u8> {
    while data.len() % 4 != 0 {
        data.push(pad);
    }
    let mut out = (data.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(&chunk_type.to_le_bytes());
    out.extend(data);
    out
}

/// A triangle mesh node under a translated parent, animated by one
/// two-keyframe translation channel.
fn synthetic_glb() -> Vec<u8> {
    let mut bin = Vec::new();
    // positions, 3 x vec3<f32> at offset 0
    for vertex in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for component in vertex {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    // indices, 3 x u16 at offset 36
    for index in [0u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    // two bytes of padding so the float views stay 4-byte aligned
    bin.extend_from_slice(&[0u8; 2]);
    // animation input times, 2 x f32 at offset 44
    for time in [0.0f32, 1.0] {
        bin.extend_from_slice(&time.to_le_bytes());
    }
    // animation output translations, 2 x vec3<f32> at offset 52
    for value in [[0.0f32, 0.0, 0.0], [3.0, 0.0, 0.0]] {
        for component in value {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    assert_eq!(bin.len(), 76);

    let json = r#"{
        "asset":{"version":"2.0"},
        "buffers":[{"byteLength":76}],
        "bufferViews":[
            {"buffer":0,"byteOffset":0,"byteLength":36},
            {"buffer":0,"byteOffset":36,"byteLength":6},
            {"buffer":0,"byteOffset":44,"byteLength":8},
            {"buffer":0,"byteOffset":52,"byteLength":24}],
        "accessors":[
            {"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]},
            {"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"},
            {"bufferView":2,"componentType":5126,"count":2,"type":"SCALAR","min":[0.0],"max":[1.0]},
            {"bufferView":3,"componentType":5126,"count":2,"type":"VEC3"}],
        "meshes":[{"name":"suzanne","primitives":[{"attributes":{"POSITION":0},"indices":1}]}],
        "nodes":[
            {"name":"armature","children":[1],"translation":[0.0,2.0,0.0]},
            {"name":"monkey","mesh":0}],
        "scenes":[{"nodes":[0]}],
        "scene":0,
        "animations":[{
            "name":"hop",
            "samplers":[{"input":2,"output":3,"interpolation":"LINEAR"}],
            "channels":[{"sampler":0,"target":{"node":1,"path":"translation"}}]}]
    }"#;

    let mut glb = Vec::new();
    let json_chunk = chunk(CHUNK_JSON, json.as_bytes().to_vec(), b' ');
    let bin_chunk = chunk(CHUNK_BIN, bin, 0);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&((12 + json_chunk.len() + bin_chunk.len()) as u32).to_le_bytes());
    glb.extend(json_chunk);
    glb.extend(bin_chunk);
    glb
}

#[test]
fn decodes_the_node_hierarchy() {
    let scene = GltfCodec.decode(&synthetic_glb()).unwrap();

    assert_eq!(scene.nodes.len(), 1);
    let root = &scene.nodes[0];
    assert_eq!(root.name, "armature");
    assert_eq!(root.source_index, 0);
    assert!(root.primitives.is_empty());
    assert!((root.transform.position.y - 2.0).abs() < 1e-6);

    assert_eq!(root.children.len(), 1);
    let child = &root.children[0];
    assert_eq!(child.name, "monkey");
    assert_eq!(child.source_index, 1);
}

#[test]
fn decodes_the_mesh_geometry() {
    let scene = GltfCodec.decode(&synthetic_glb()).unwrap();

    let child = &scene.nodes[0].children[0];
    assert_eq!(child.primitives.len(), 1);
    let primitive = &child.primitives[0];
    assert_eq!(primitive.name, "suzanne");
    assert_eq!(primitive.vertices.len(), 3);
    assert_eq!(primitive.indices, vec![0, 1, 2]);
    assert_eq!(primitive.vertices[1].position, [1.0, 0.0, 0.0]);
    assert!(primitive.material.is_none());
}

#[test]
fn decodes_the_animation_clip() {
    let scene = GltfCodec.decode(&synthetic_glb()).unwrap();

    assert_eq!(scene.clips.len(), 1);
    let clip = &scene.clips[0];
    assert_eq!(clip.name, "hop");
    assert!((clip.duration - 1.0).abs() < 1e-6);
    assert_eq!(clip.tracks.len(), 1);

    let track = &clip.tracks[0];
    assert_eq!(track.node_index, 1);
    let TrackData::Translation(data) = &track.data else {
        panic!("expected a translation track");
    };
    let midway = data.sample(0.5).unwrap();
    assert!((midway.x - 1.5).abs() < 1e-6);
}

#[test]
fn no_materials_decode_to_an_empty_list() {
    let scene = GltfCodec.decode(&synthetic_glb()).unwrap();
    assert!(scene.materials.is_empty());
}

#[test]
fn unreadable_bytes_fail_terminally() {
    assert!(GltfCodec.decode(b"definitely not a gltf file").is_err());
    assert!(GltfCodec.decode(&[]).is_err());
}
