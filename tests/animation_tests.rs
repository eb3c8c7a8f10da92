//! Animation tests
//!
//! Covers:
//! - KeyframeTrack linear/step sampling and end clamping
//! - AnimationClip duration derivation
//! - AnimationAction loop modes, in particular play-once with clamp-on-finish
//! - AnimationMixer writing sampled poses into the scene graph

use std::f32::consts::PI;
use std::sync::Arc;

use cgmath::{Quaternion, Rotation3, Vector3};

use limelight::animation::{AnimationAction, AnimationMixer, LoopMode};
use limelight::data_structures::instance::Instance;
use limelight::data_structures::scene_graph::{ContainerNode, SceneNode};
use limelight::resources::animation::{
    AnimationClip, Interpolation, KeyframeTrack, Track, TrackData,
};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

// ============================================================================
// KeyframeTrack sampling
// ============================================================================

#[test]
fn track_linear_midpoint() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(10.0, 20.0, 30.0)],
        Interpolation::Linear,
    );

    let value = track.sample(0.5).unwrap();
    assert!(approx_vec(value, Vector3::new(5.0, 10.0, 15.0)));
}

#[test]
fn track_linear_exact_keyframes() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ],
        Interpolation::Linear,
    );

    assert!(approx(track.sample(0.0).unwrap().x, 0.0));
    assert!(approx(track.sample(1.0).unwrap().x, 1.0));
    assert!(approx(track.sample(2.0).unwrap().x, 2.0));
}

#[test]
fn track_clamps_beyond_both_ends() {
    let track = KeyframeTrack::new(
        vec![1.0, 2.0],
        vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)],
        Interpolation::Linear,
    );

    // Before the first keyframe: first value. After the last: last value.
    assert!(approx(track.sample(0.0).unwrap().x, 1.0));
    assert!(approx(track.sample(5.0).unwrap().x, 2.0));
}

#[test]
fn track_step_holds_current_keyframe() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(100.0, 0.0, 0.0),
            Vector3::new(200.0, 0.0, 0.0),
        ],
        Interpolation::Step,
    );

    assert!(approx(track.sample(0.5).unwrap().x, 0.0));
    assert!(approx(track.sample(0.99).unwrap().x, 0.0));
    assert!(approx(track.sample(1.0).unwrap().x, 100.0));
    assert!(approx(track.sample(1.5).unwrap().x, 100.0));
}

#[test]
fn track_empty_yields_none() {
    let track: KeyframeTrack<Vector3<f32>> =
        KeyframeTrack::new(Vec::new(), Vec::new(), Interpolation::Linear);
    assert!(track.sample(0.0).is_none());
}

#[test]
fn track_quaternion_slerp_midpoint() {
    let q0 = Quaternion::from_angle_y(cgmath::Rad(0.0));
    let q1 = Quaternion::from_angle_y(cgmath::Rad(PI / 2.0));
    let track = KeyframeTrack::new(vec![0.0, 1.0], vec![q0, q1], Interpolation::Linear);

    let value = track.sample(0.5).unwrap();
    let expected = Quaternion::from_angle_y(cgmath::Rad(PI / 4.0));
    assert!((value.s - expected.s).abs() < 1e-4);
    assert!((value.v.y - expected.v.y).abs() < 1e-4);
}

// ============================================================================
// AnimationClip duration
// ============================================================================

fn translation_clip(node_index: usize, times: Vec<f32>, xs: Vec<f32>) -> AnimationClip {
    let values = xs.into_iter().map(|x| Vector3::new(x, 0.0, 0.0)).collect();
    AnimationClip::new(
        "clip".to_string(),
        vec![Track {
            node_index,
            data: TrackData::Translation(KeyframeTrack::new(times, values, Interpolation::Linear)),
        }],
    )
}

#[test]
fn clip_duration_is_longest_track() {
    let clip = AnimationClip::new(
        "mixed".to_string(),
        vec![
            Track {
                node_index: 0,
                data: TrackData::Translation(KeyframeTrack::new(
                    vec![0.0, 1.0],
                    vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)],
                    Interpolation::Linear,
                )),
            },
            Track {
                node_index: 0,
                data: TrackData::Scale(KeyframeTrack::new(
                    vec![0.0, 2.5],
                    vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 2.0, 2.0)],
                    Interpolation::Linear,
                )),
            },
        ],
    );
    assert!(approx(clip.duration, 2.5));
}

#[test]
fn clip_without_tracks_has_zero_duration() {
    let clip = AnimationClip::new("empty".to_string(), Vec::new());
    assert!(approx(clip.duration, 0.0));
}

// ============================================================================
// AnimationAction loop modes
// ============================================================================

#[test]
fn action_once_clamps_and_pauses_at_end() {
    let clip = Arc::new(translation_clip(0, vec![0.0, 1.0], vec![0.0, 10.0]));
    let mut action = AnimationAction::new(clip);
    action.loop_mode = LoopMode::Once;

    action.update(0.4);
    assert!(approx(action.time, 0.4));
    assert!(!action.finished());

    action.update(2.0);
    assert!(approx(action.time, 1.0), "time clamps to the duration");
    assert!(action.paused);
    assert!(action.finished());

    // Further updates keep the clamped time; the clip never restarts.
    action.update(5.0);
    assert!(approx(action.time, 1.0));
}

#[test]
fn action_loop_wraps_around() {
    let clip = Arc::new(translation_clip(0, vec![0.0, 1.0], vec![0.0, 10.0]));
    let mut action = AnimationAction::new(clip);
    assert_eq!(action.loop_mode, LoopMode::Loop);

    action.update(1.25);
    assert!(approx(action.time, 0.25));
    assert!(!action.paused);
}

// ============================================================================
// Mixer applies poses to the scene graph
// ============================================================================

fn two_node_tree() -> ContainerNode {
    let mut root = ContainerNode::new(Some(0), Instance::default());
    root.add_child(Box::new(ContainerNode::new(Some(1), Instance::default())));
    root
}

#[test]
fn mixer_writes_sampled_translation() {
    let mut root = two_node_tree();
    let clip = Arc::new(translation_clip(1, vec![0.0, 1.0], vec![0.0, 8.0]));

    let mut mixer = AnimationMixer::new();
    mixer.play(AnimationAction::new(clip));
    mixer.update(0.5, &mut root);

    let child = root.node_mut(1).unwrap();
    assert!(approx(child.local_transform().position.x, 4.0));
}

#[test]
fn mixer_play_once_pins_final_pose() {
    let mut root = two_node_tree();
    let clip = Arc::new(translation_clip(1, vec![0.0, 1.0], vec![0.0, 8.0]));

    let mut mixer = AnimationMixer::new();
    let mut action = AnimationAction::new(clip);
    action.loop_mode = LoopMode::Once;
    mixer.play(action);

    // Run well past the end in several steps.
    for _ in 0..10 {
        mixer.update(0.3, &mut root);
    }

    let final_x = root.node_mut(1).unwrap().local_transform().position.x;
    assert!(
        approx(final_x, 8.0),
        "pose pins to the final keyframe, got {final_x}"
    );

    // More time passing never rewinds or loops the pose.
    mixer.update(10.0, &mut root);
    let x = root.node_mut(1).unwrap().local_transform().position.x;
    assert!(approx(x, 8.0));
    assert!(mixer.actions()[0].finished());
}

#[test]
fn mixer_targets_only_bound_node() {
    let mut root = two_node_tree();
    let clip = Arc::new(translation_clip(1, vec![0.0, 1.0], vec![0.0, 8.0]));

    let mut mixer = AnimationMixer::new();
    mixer.play(AnimationAction::new(clip));
    mixer.update(1.0, &mut root);

    assert!(approx(root.local_transform().position.x, 0.0));
}
