//! Sounds and sound packs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Global sound identifier, unique across all registered packs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SoundId(pub u32);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Audio clip, decoded to PCM on first use
#[derive(Debug, Clone)]
pub struct Sound {
    pub id: SoundId,
    pub name: String,
    /// Intrinsic volume, multiplied into every emitter playing this sound
    pub volume: f32,
    /// True once `pcm` holds the decoded payload
    pub loaded: bool,
    /// Encoded payload
    pub bytes: Vec<u8>,
    /// Decoded 16-bit PCM, interleaved when `channels > 1`
    pub pcm: Arc<Vec<i16>>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Sound {
    pub fn new(id: SoundId, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            volume: 1.0,
            loaded: false,
            bytes,
            pcm: Arc::new(Vec::new()),
            sample_rate: 0,
            channels: 0,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Number of sample frames decoded so far
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.pcm.len() / self.channels as usize
        }
    }

    /// Playback length in seconds (0 until decoded)
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }
}

/// Named collection of sounds
#[derive(Debug, Clone, Default)]
pub struct SoundPack {
    name: String,
    sounds: BTreeMap<SoundId, Sound>,
}

impl SoundPack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sounds: BTreeMap::new(),
        }
    }

    /// Add a sound, returning any sound it replaced
    pub fn add(&mut self, sound: Sound) -> Option<Sound> {
        self.sounds.insert(sound.id, sound)
    }

    pub fn with_sound(mut self, sound: Sound) -> Self {
        self.add(sound);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sounds(&self) -> &BTreeMap<SoundId, Sound> {
        &self.sounds
    }

    pub fn sound(&self, id: SoundId) -> Option<&Sound> {
        self.sounds.get(&id)
    }

    pub fn sound_mut(&mut self, id: SoundId) -> Option<&mut Sound> {
        self.sounds.get_mut(&id)
    }

    pub fn sound_by_name(&self, name: &str) -> Option<&Sound> {
        self.sounds.values().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}
