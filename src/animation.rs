//! Animation playback: actions and the per-model mixer.
//!
//! An [`AnimationAction`] is one playback of one clip. The mixer advances
//! every action by the frame delta and writes the sampled values into the
//! scene graph, addressing nodes by their decoded source index.

use std::sync::Arc;

use crate::{
    data_structures::scene_graph::SceneNode,
    resources::animation::{AnimationClip, TrackData},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopMode {
    /// Play once, then hold the final frame (clamp-on-finish).
    Once,
    Loop,
}

#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    pub time: f32,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
    pub enabled: bool,
}

impl AnimationAction {
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
            enabled: true,
        }
    }

    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Advance the action's clock by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.paused || !self.enabled {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.time_scale;

        match self.loop_mode {
            LoopMode::Once => {
                // Clamp to the ends and stop; the pose stays pinned there.
                if self.time >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                }
            }
            LoopMode::Loop => {
                if self.time >= duration {
                    self.time %= duration;
                } else if self.time < 0.0 {
                    self.time = duration + (self.time % duration);
                }
            }
        }
    }

    pub fn finished(&self) -> bool {
        self.loop_mode == LoopMode::Once && self.paused
    }
}

/// Per-model playback controller holding the active actions.
#[derive(Default)]
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn play(&mut self, action: AnimationAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    /// Advance all actions by `dt` seconds and write the sampled poses into
    /// the scene graph. A finished one-shot action keeps writing its clamped
    /// final pose, which is what pins the display there.
    pub fn update(&mut self, dt: f32, root: &mut dyn SceneNode) {
        for action in &mut self.actions {
            action.update(dt);
        }

        for action in &self.actions {
            if !action.enabled {
                continue;
            }
            for track in &action.clip.tracks {
                let Some(node) = root.node_mut(track.node_index) else {
                    continue;
                };
                match &track.data {
                    TrackData::Translation(t) => {
                        if let Some(value) = t.sample(action.time) {
                            node.local_transform_mut().position = value;
                        }
                    }
                    TrackData::Rotation(t) => {
                        if let Some(value) = t.sample(action.time) {
                            node.local_transform_mut().rotation = value;
                        }
                    }
                    TrackData::Scale(t) => {
                        if let Some(value) = t.sample(action.time) {
                            node.local_transform_mut().scale = value;
                        }
                    }
                }
            }
        }
    }
}
