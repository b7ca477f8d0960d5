//! Audio emitters and listener pose

use glam::{Vec2, Vec3};
use std::fmt;

use super::sound::SoundId;

/// Emitter identifier, allocated from a counter and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AudioEmitterId(pub u64);

impl fmt::Display for AudioEmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emitter {}", self.0)
    }
}

/// Playback repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayType {
    /// Play to the end, then the emitter is culled
    #[default]
    Once,
    /// Repeat until stopped or destroyed
    Loop,
}

/// Backend-reported playback state of an emitter's source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    /// Set up but never played
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Live playback instance of a sound
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEmitter {
    /// Backend source handle, assigned by `setup_emitter`
    pub source_id: u32,
    /// Backend buffer handle, assigned by `setup_emitter`
    pub status_handle: u32,
    pub sound_id: SoundId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub direction: Vec3,
    /// Inner/outer attenuation radius
    pub radius: Vec2,
    /// Requested volume already scaled by the sound's intrinsic volume
    pub volume: f32,
    pub play_type: PlayType,
    /// Position is in world space (otherwise relative to the listener)
    pub world: bool,
}

/// Emitter creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterDesc {
    pub position: Vec3,
    pub velocity: Vec3,
    pub direction: Vec3,
    pub radius: Vec2,
    pub volume: f32,
    pub world: bool,
    pub play_type: PlayType,
}

impl Default for EmitterDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ONE,
            velocity: Vec3::ONE,
            direction: Vec3::ONE,
            radius: Vec2::ONE,
            volume: 1.0,
            world: false,
            play_type: PlayType::Once,
        }
    }
}

impl EmitterDesc {
    /// Positional emitter in world space
    pub fn world(position: Vec3, radius: Vec2, play_type: PlayType) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            direction: Vec3::ZERO,
            radius,
            world: true,
            play_type,
            ..Self::default()
        }
    }
}

/// Listener pose pushed to the backend every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    pub position: Vec3,
    pub velocity: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: Vec3::ONE,
            velocity: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}
