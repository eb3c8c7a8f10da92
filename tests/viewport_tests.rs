//! Viewport sizing tests
//!
//! Covers:
//! - the device pixel ratio clamp
//! - surface extent derivation and resize idempotence
//! - projection aspect recomputation

use limelight::camera::Projection;
use limelight::context::{clamped_pixel_ratio, surface_extent};
use winit::dpi::PhysicalSize;

#[test]
fn pixel_ratio_clamps_at_two() {
    assert_eq!(clamped_pixel_ratio(1.0), 1.0);
    assert_eq!(clamped_pixel_ratio(2.0), 2.0);
    assert_eq!(clamped_pixel_ratio(3.0), 2.0);
}

#[test]
fn surface_extent_passes_low_density_through() {
    let size = PhysicalSize::new(1920, 1080);
    assert_eq!(surface_extent(size, 1.0), size);
    assert_eq!(surface_extent(size, 2.0), size);
}

#[test]
fn surface_extent_shrinks_above_the_clamp() {
    // A 3x display reports 3x physical pixels but renders at the clamped 2x.
    let size = PhysicalSize::new(3000, 1500);
    let extent = surface_extent(size, 3.0);
    assert_eq!(extent, PhysicalSize::new(2000, 1000));
}

#[test]
fn surface_extent_is_idempotent() {
    let size = PhysicalSize::new(1280, 720);
    let once = surface_extent(size, 2.0);
    let twice = surface_extent(once, 2.0);
    assert_eq!(once, twice);
}

#[test]
fn projection_resize_recomputes_aspect() {
    let mut projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0);
    assert!((projection.aspect - 800.0 / 600.0).abs() < 1e-6);

    projection.resize(1920, 1080);
    assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);
}

#[test]
fn projection_resize_is_idempotent() {
    let mut projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0);

    projection.resize(1024, 768);
    let aspect_once = projection.aspect;
    let height_once = projection.height;

    projection.resize(1024, 768);
    assert_eq!(projection.aspect, aspect_once);
    assert_eq!(projection.height, height_once);
}
