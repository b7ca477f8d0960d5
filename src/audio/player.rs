//! Playback backends
//!
//! `SoundHandler` drives one `AudioPlayer` at a time and can swap it at
//! runtime. Backends own all hardware resources behind the source handles
//! they hand out in `setup_emitter`.

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::emitter::{AudioEmitter, AudioStatus, Listener, PlayType};
use super::sound::Sound;

/// Playback backend capability set
pub trait AudioPlayer {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Acquire the output device; called once the previous backend is gone
    fn activate(&mut self);

    /// Global output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    fn update_listener_state(&mut self, listener: &Listener);

    fn update_emitter_state(&mut self, emitter: &AudioEmitter);

    /// Allocate backend resources for `sound` and store their handles in `emitter`
    fn setup_emitter(&mut self, emitter: &mut AudioEmitter, sound: &Sound);

    fn play_emitter(&mut self, emitter: &AudioEmitter);

    fn pause_emitter(&mut self, emitter: &AudioEmitter);

    fn stop_emitter(&mut self, emitter: &AudioEmitter);

    /// Status of a source; unknown sources report `Stopped`
    fn audio_status(&self, source_id: u32) -> AudioStatus;

    /// Release the resources behind `emitter`
    fn clean_up_resource(&mut self, emitter: &AudioEmitter);
}

/// Selectable backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Silent backend
    #[default]
    Null,
    /// System output through cpal
    Cpal,
}

/// Create a backend (not yet activated)
pub fn create_player(kind: PlayerKind) -> Box<dyn AudioPlayer> {
    match kind {
        PlayerKind::Null => Box::new(NullPlayer::new()),
        #[cfg(feature = "cpal-backend")]
        PlayerKind::Cpal => Box::new(super::cpal_player::CpalPlayer::new()),
        #[cfg(not(feature = "cpal-backend"))]
        PlayerKind::Cpal => {
            log::warn!("cpal backend not compiled in (feature \"cpal-backend\"), using null backend");
            Box::new(NullPlayer::new())
        }
    }
}

/// Playback position bookkeeping for a silent source
#[derive(Debug, Clone, Copy)]
enum Clock {
    Initial,
    Playing { since: Instant, offset: Duration },
    Paused { offset: Duration },
    Stopped,
}

#[derive(Debug, Clone)]
struct SilentSource {
    duration: Duration,
    looping: bool,
    clock: Clock,
}

impl SilentSource {
    fn status(&self) -> AudioStatus {
        match self.clock {
            Clock::Initial => AudioStatus::Initial,
            Clock::Playing { since, offset } => {
                if !self.looping && offset + since.elapsed() >= self.duration {
                    AudioStatus::Stopped
                } else {
                    AudioStatus::Playing
                }
            }
            Clock::Paused { .. } => AudioStatus::Paused,
            Clock::Stopped => AudioStatus::Stopped,
        }
    }
}

/// Backend without output
///
/// Tracks play/pause/stop per source against the sound's real length,
/// so Once emitters finish on schedule.
#[derive(Debug)]
pub struct NullPlayer {
    sources: HashMap<u32, SilentSource>,
    next_source: u32,
    volume: f32,
    active: bool,
}

impl NullPlayer {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            next_source: 1,
            volume: 1.0,
            active: false,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of allocated sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl Default for NullPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlayer for NullPlayer {
    fn name(&self) -> &str {
        "null"
    }

    fn activate(&mut self) {
        self.active = true;
        info!("Null audio backend active");
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn update_listener_state(&mut self, _listener: &Listener) {}

    fn update_emitter_state(&mut self, _emitter: &AudioEmitter) {}

    fn setup_emitter(&mut self, emitter: &mut AudioEmitter, sound: &Sound) {
        let id = self.next_source;
        self.next_source += 1;

        self.sources.insert(
            id,
            SilentSource {
                duration: Duration::from_secs_f64(sound.duration_secs()),
                looping: emitter.play_type == PlayType::Loop,
                clock: Clock::Initial,
            },
        );
        emitter.source_id = id;
        emitter.status_handle = id;
        trace!("Null source {} for sound {}", id, sound.id);
    }

    fn play_emitter(&mut self, emitter: &AudioEmitter) {
        if let Some(source) = self.sources.get_mut(&emitter.source_id) {
            let offset = match source.clock {
                Clock::Paused { offset } => offset,
                _ => Duration::ZERO,
            };
            source.clock = Clock::Playing {
                since: Instant::now(),
                offset,
            };
        }
    }

    fn pause_emitter(&mut self, emitter: &AudioEmitter) {
        if let Some(source) = self.sources.get_mut(&emitter.source_id) {
            if let Clock::Playing { since, offset } = source.clock {
                source.clock = Clock::Paused {
                    offset: offset + since.elapsed(),
                };
            }
        }
    }

    fn stop_emitter(&mut self, emitter: &AudioEmitter) {
        if let Some(source) = self.sources.get_mut(&emitter.source_id) {
            source.clock = Clock::Stopped;
        }
    }

    fn audio_status(&self, source_id: u32) -> AudioStatus {
        self.sources
            .get(&source_id)
            .map_or(AudioStatus::Stopped, SilentSource::status)
    }

    fn clean_up_resource(&mut self, emitter: &AudioEmitter) {
        if self.sources.remove(&emitter.source_id).is_some() {
            debug!("Null source {} released", emitter.source_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sound::SoundId;
    use glam::{Vec2, Vec3};
    use std::sync::Arc;

    fn emitter(play_type: PlayType) -> AudioEmitter {
        AudioEmitter {
            source_id: 0,
            status_handle: 0,
            sound_id: SoundId(1),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            direction: Vec3::ZERO,
            radius: Vec2::ONE,
            volume: 1.0,
            play_type,
            world: false,
        }
    }

    fn long_sound() -> Sound {
        let mut sound = Sound::new(SoundId(1), "drone", Vec::new());
        sound.pcm = Arc::new(vec![0; 22_050 * 60]);
        sound.sample_rate = 22_050;
        sound.channels = 1;
        sound
    }

    #[test]
    fn test_null_player_state_machine() {
        let mut player = NullPlayer::new();
        let mut e = emitter(PlayType::Once);
        player.setup_emitter(&mut e, &long_sound());
        assert_ne!(e.source_id, 0);
        assert_eq!(player.audio_status(e.source_id), AudioStatus::Initial);

        player.play_emitter(&e);
        assert_eq!(player.audio_status(e.source_id), AudioStatus::Playing);
        player.pause_emitter(&e);
        assert_eq!(player.audio_status(e.source_id), AudioStatus::Paused);
        player.play_emitter(&e);
        assert_eq!(player.audio_status(e.source_id), AudioStatus::Playing);
        player.stop_emitter(&e);
        assert_eq!(player.audio_status(e.source_id), AudioStatus::Stopped);

        player.clean_up_resource(&e);
        assert_eq!(player.source_count(), 0);
        assert_eq!(player.audio_status(e.source_id), AudioStatus::Stopped);
    }

    #[test]
    fn test_null_player_once_finishes() {
        let mut player = NullPlayer::new();
        let mut once = emitter(PlayType::Once);
        let mut looping = emitter(PlayType::Loop);
        // Undecoded sounds have zero length
        let empty = Sound::new(SoundId(1), "empty", Vec::new());
        player.setup_emitter(&mut once, &empty);
        player.setup_emitter(&mut looping, &empty);

        player.play_emitter(&once);
        player.play_emitter(&looping);
        assert_eq!(player.audio_status(once.source_id), AudioStatus::Stopped);
        assert_eq!(player.audio_status(looping.source_id), AudioStatus::Playing);
    }

    #[test]
    fn test_null_player_volume_clamped() {
        let mut player = NullPlayer::new();
        player.set_volume(3.0);
        assert_eq!(player.volume(), 1.0);
        assert!(!player.is_active());
        player.activate();
        assert!(player.is_active());
    }

    #[test]
    fn test_create_player_null() {
        let player = create_player(PlayerKind::Null);
        assert_eq!(player.name(), "null");
    }
}
