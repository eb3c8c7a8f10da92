//! Camera and orbit controller tests
//!
//! Covers:
//! - spherical state derivation from an eye/center pair
//! - update stability with no input
//! - zoom and rotation behaviour

use cgmath::{MetricSpace, Point3};

use limelight::camera::{Camera, OrbitControls, Projection};
use winit::event::{DeviceId, MouseScrollDelta, TouchPhase, WindowEvent};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn test_projection() -> Projection {
    Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0)
}

#[test]
fn spherical_state_matches_initial_pose() {
    let center = Point3::new(0.0, 0.3, 0.0);
    let eye = Point3::new(1.0, 0.3, 0.0);
    let controls = OrbitControls::new(center, eye);

    assert!(approx(controls.radius, 1.0));
    // The offset is horizontal, so the polar angle is 90 degrees.
    assert!(approx(controls.phi, std::f32::consts::FRAC_PI_2));
    assert!(approx(controls.theta, std::f32::consts::FRAC_PI_2));
}

#[test]
fn update_without_input_preserves_the_pose() {
    let center = Point3::new(0.0, 0.3, 0.0);
    let eye = Point3::new(1.0, 0.3, 0.0);
    let mut controls = OrbitControls::new(center, eye);
    let mut camera = Camera::new(eye, center);
    let projection = test_projection();

    for _ in 0..5 {
        controls.update(&mut camera, &projection, 1.0 / 60.0);
    }

    assert!(camera.position.distance(eye) < EPSILON);
    assert!(camera.target.distance(center) < EPSILON);
}

#[test]
fn drag_orbits_without_changing_radius() {
    let center = Point3::new(0.0, 0.3, 0.0);
    let eye = Point3::new(1.0, 0.3, 0.0);
    let mut controls = OrbitControls::new(center, eye);
    controls.enable_damping = false;
    let mut camera = Camera::new(eye, center);
    let projection = test_projection();

    controls.handle_mouse(120.0, 0.0);
    controls.update(&mut camera, &projection, 1.0 / 60.0);

    assert!(camera.position.distance(eye) > EPSILON, "camera moved");
    let radius = camera.position.distance(camera.target);
    assert!(approx(radius, 1.0), "orbit keeps the distance");
}

#[test]
fn scroll_zooms_in() {
    let center = Point3::new(0.0, 0.3, 0.0);
    let eye = Point3::new(1.0, 0.3, 0.0);
    let mut controls = OrbitControls::new(center, eye);
    let mut camera = Camera::new(eye, center);
    let projection = test_projection();

    controls.handle_window_events(&WindowEvent::MouseWheel {
        device_id: DeviceId::dummy(),
        delta: MouseScrollDelta::LineDelta(0.0, 2.0),
        phase: TouchPhase::Moved,
    });
    controls.update(&mut camera, &projection, 1.0 / 60.0);

    assert!(controls.radius < 1.0);
    let distance = camera.position.distance(camera.target);
    assert!(approx(distance, controls.radius));
}

#[test]
fn camera_look_at_is_translation_invariant() {
    let a = Camera::new((1.0, 0.3, 0.0), (0.0, 0.3, 0.0));
    let b = Camera::new((2.0, 0.3, 5.0), (1.0, 0.3, 5.0));

    let ma: [[f32; 4]; 4] = a.calc_matrix().into();
    let mb: [[f32; 4]; 4] = b.calc_matrix().into();
    // Same relative pose, same rotation part.
    for col in 0..3 {
        for row in 0..3 {
            assert!(approx(ma[col][row], mb[col][row]));
        }
    }
}
