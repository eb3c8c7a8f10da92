//! Scene graph tests
//!
//! Covers:
//! - world transform propagation through the owned tree
//! - node lookup by decoded source index
//! - transform composition

use cgmath::{Quaternion, Rad, Rotation3, Vector3};

use limelight::data_structures::instance::Instance;
use limelight::data_structures::scene_graph::{ContainerNode, SceneNode};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn translated(x: f32, y: f32, z: f32) -> Instance {
    Instance {
        position: Vector3::new(x, y, z),
        ..Default::default()
    }
}

#[test]
fn world_transforms_compose_down_the_tree() {
    let mut root = ContainerNode::new(Some(0), translated(1.0, 0.0, 0.0));
    let mut middle = ContainerNode::new(Some(1), translated(0.0, 2.0, 0.0));
    middle.add_child(Box::new(ContainerNode::new(
        Some(2),
        translated(0.0, 0.0, 3.0),
    )));
    root.add_child(Box::new(middle));

    root.update_world_transforms(&Instance::default());

    let leaf_world = root.children()[0].children()[0].world_transform().clone();
    assert!(approx(leaf_world.position.x, 1.0));
    assert!(approx(leaf_world.position.y, 2.0));
    assert!(approx(leaf_world.position.z, 3.0));
}

#[test]
fn parent_scale_applies_to_child_position() {
    let parent_transform = Instance {
        scale: Vector3::new(2.0, 2.0, 2.0),
        ..Default::default()
    };
    let mut root = ContainerNode::new(Some(0), parent_transform);
    root.add_child(Box::new(ContainerNode::new(
        Some(1),
        translated(1.0, 0.0, 0.0),
    )));

    root.update_world_transforms(&Instance::default());

    let child_world = root.children()[0].world_transform().clone();
    assert!(approx(child_world.position.x, 2.0));
    assert!(approx(child_world.scale.x, 2.0));
}

#[test]
fn parent_rotation_moves_child() {
    // 90 degrees about Y carries +X onto -Z.
    let parent_transform = Instance {
        rotation: Quaternion::from_angle_y(Rad(std::f32::consts::FRAC_PI_2)),
        ..Default::default()
    };
    let mut root = ContainerNode::new(Some(0), parent_transform);
    root.add_child(Box::new(ContainerNode::new(
        Some(1),
        translated(1.0, 0.0, 0.0),
    )));

    root.update_world_transforms(&Instance::default());

    let child_world = root.children()[0].world_transform().clone();
    assert!(approx(child_world.position.x, 0.0));
    assert!(approx(child_world.position.z, -1.0));
}

#[test]
fn update_twice_yields_identical_worlds() {
    let mut root = ContainerNode::new(Some(0), translated(1.0, 2.0, 3.0));
    root.add_child(Box::new(ContainerNode::new(
        Some(1),
        translated(4.0, 5.0, 6.0),
    )));

    root.update_world_transforms(&Instance::default());
    let first = root.children()[0].world_transform().clone();
    root.update_world_transforms(&Instance::default());
    let second = root.children()[0].world_transform().clone();

    assert_eq!(first, second);
}

#[test]
fn node_lookup_by_source_index() {
    let mut root = ContainerNode::new(Some(7), Instance::default());
    let mut middle = ContainerNode::new(None, Instance::default());
    middle.add_child(Box::new(ContainerNode::new(Some(42), Instance::default())));
    root.add_child(Box::new(middle));

    assert!(root.node_mut(7).is_some());
    assert!(root.node_mut(42).is_some());
    assert!(root.node_mut(3).is_none());
}

#[test]
fn containers_never_cast_shadows() {
    let mut root = ContainerNode::new(None, Instance::default());
    root.set_cast_shadows(true);
    assert!(!root.casts_shadow());
}

#[test]
fn instance_composition_matches_matrix_composition() {
    use cgmath::Matrix4;

    let parent = Instance {
        position: Vector3::new(1.0, 2.0, 3.0),
        rotation: Quaternion::from_angle_z(Rad(0.7)),
        scale: Vector3::new(2.0, 2.0, 2.0),
    };
    let child = Instance {
        position: Vector3::new(-1.0, 0.5, 0.0),
        rotation: Quaternion::from_angle_x(Rad(-0.3)),
        scale: Vector3::new(1.0, 1.0, 1.0),
    };

    let composed = (&parent * &child).to_matrix();
    let expected: Matrix4<f32> = parent.to_matrix() * child.to_matrix();

    let composed: [[f32; 4]; 4] = composed.into();
    let expected: [[f32; 4]; 4] = expected.into();
    for (col_a, col_b) in composed.iter().zip(expected.iter()) {
        for (a, b) in col_a.iter().zip(col_b.iter()) {
            assert!((a - b).abs() < 1e-4, "matrix mismatch: {a} vs {b}");
        }
    }
}
