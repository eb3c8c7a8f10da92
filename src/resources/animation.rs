//! Keyframe tracks and animation clips decoded from assets.
//!
//! Clips are read-only after decode; playback state lives in the mixer, not
//! here. Sampling clamps at both ends of a track so a finished clip holds
//! its final values.

use cgmath::{Quaternion, Vector3, VectorSpace};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interpolation {
    Linear,
    Step,
}

pub trait Interpolate: Clone {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self;
}

impl Interpolate for Vector3<f32> {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        a.lerp(*b, t)
    }
}

impl Interpolate for Quaternion<f32> {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        a.slerp(*b, t)
    }
}

/// A timed series of values for one animated property.
#[derive(Clone, Debug)]
pub struct KeyframeTrack<T: Interpolate> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: Interpolation,
}

impl<T: Interpolate> KeyframeTrack<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: Interpolation) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Sample the track at `time`, clamped to the first and last keyframe.
    /// Returns `None` for a track without keyframes.
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() || self.values.is_empty() {
            return None;
        }
        let len = self.times.len().min(self.values.len());
        if time <= self.times[0] {
            return Some(self.values[0].clone());
        }
        if time >= self.times[len - 1] {
            return Some(self.values[len - 1].clone());
        }

        // First index whose timestamp exceeds `time`; the sampled segment is
        // [next - 1, next].
        let next = self.times[..len].partition_point(|&t| t <= time);
        let index = next - 1;

        match self.interpolation {
            Interpolation::Step => Some(self.values[index].clone()),
            Interpolation::Linear => {
                let t0 = self.times[index];
                let t1 = self.times[next];
                let span = t1 - t0;
                let t = if span > 1e-6 { (time - t0) / span } else { 0.0 };
                Some(T::interpolate(
                    &self.values[index],
                    &self.values[next],
                    t.clamp(0.0, 1.0),
                ))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub enum TrackData {
    Translation(KeyframeTrack<Vector3<f32>>),
    Rotation(KeyframeTrack<Quaternion<f32>>),
    Scale(KeyframeTrack<Vector3<f32>>),
}

impl TrackData {
    pub fn end_time(&self) -> f32 {
        match self {
            TrackData::Translation(t) => t.end_time(),
            TrackData::Rotation(t) => t.end_time(),
            TrackData::Scale(t) => t.end_time(),
        }
    }
}

/// One animated property of one scene node.
#[derive(Clone, Debug)]
pub struct Track {
    /// Source node index the track targets, resolved against the scene graph.
    pub node_index: usize,
    pub data: TrackData,
}

/// A named animation: all tracks that belong to one clip, with the duration
/// derived from the longest track.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    pub fn new(name: String, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|track| track.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            name,
            duration,
            tracks,
        }
    }
}
