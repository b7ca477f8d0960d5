//! Sound pack registry
//!
//! Packs are keyed by name; every sound is additionally indexed by its
//! global id. Payloads are decoded lazily on first access.

use log::{debug, error, warn};
use std::collections::HashMap;

use super::decoder::AudioDecoder;
use super::sound::{Sound, SoundId, SoundPack};
use super::AudioError;

#[derive(Debug, Default)]
pub struct SoundPackRegistry {
    packs: HashMap<String, SoundPack>,
    /// Sound id -> owning pack name
    index: HashMap<SoundId, String>,
}

impl SoundPackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pack under its name
    ///
    /// Fails without touching the registry if the name is taken. Sound ids
    /// already indexed from another pack keep pointing at that pack.
    pub fn register_sound_pack(&mut self, pack: SoundPack) -> Result<(), AudioError> {
        let name = pack.name().to_string();
        if self.packs.contains_key(&name) {
            return Err(AudioError::DuplicateSoundPack(name));
        }

        for id in pack.sounds().keys() {
            match self.index.get(id) {
                Some(owner) => warn!(
                    "Sound {} in pack '{}' already registered by pack '{}', ignoring",
                    id, name, owner
                ),
                None => {
                    self.index.insert(*id, name.clone());
                }
            }
        }

        debug!("Registered sound pack '{}' ({} sounds)", name, pack.len());
        self.packs.insert(name, pack);
        Ok(())
    }

    /// Look up a sound, decoding its payload on first access
    ///
    /// A decode failure is logged and the sound is returned undecoded
    /// (`loaded == false`); the next access retries.
    pub fn get_sound(
        &mut self,
        id: SoundId,
        decoder: &dyn AudioDecoder,
    ) -> Result<&Sound, AudioError> {
        let sound = self.sound_mut(id).ok_or(AudioError::SoundNotFound(id))?;

        if !sound.loaded {
            match decoder.to_pcm16(sound) {
                Ok(()) => sound.loaded = true,
                Err(e) => error!("Failed to decode sound {} '{}': {}", id, sound.name, e),
            }
        }

        Ok(sound)
    }

    /// Look up a sound without decoding it
    pub fn sound(&self, id: SoundId) -> Option<&Sound> {
        let pack = self.index.get(&id)?;
        self.packs.get(pack)?.sound(id)
    }

    fn sound_mut(&mut self, id: SoundId) -> Option<&mut Sound> {
        let pack = self.index.get(&id)?;
        self.packs.get_mut(pack)?.sound_mut(id)
    }

    pub fn sound_by_name(&self, pack: &str, name: &str) -> Option<&Sound> {
        self.packs.get(pack)?.sound_by_name(name)
    }

    pub fn sound_packs(&self) -> impl Iterator<Item = &SoundPack> {
        self.packs.values()
    }

    pub fn contains_pack(&self, name: &str) -> bool {
        self.packs.contains_key(name)
    }

    /// Number of registered packs
    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decoder::{encode_wav, WavDecoder};

    fn wav_sound(id: u32, name: &str) -> Sound {
        Sound::new(SoundId(id), name, encode_wav(&[0, 100, 200], 8_000).unwrap())
    }

    #[test]
    fn test_duplicate_pack_rejected() {
        let mut registry = SoundPackRegistry::new();
        registry
            .register_sound_pack(SoundPack::new("music").with_sound(wav_sound(1, "theme")))
            .unwrap();

        let err = registry
            .register_sound_pack(SoundPack::new("music").with_sound(wav_sound(2, "other")))
            .unwrap_err();
        assert_eq!(err, AudioError::DuplicateSoundPack("music".to_string()));

        // Registry unchanged
        assert_eq!(registry.len(), 1);
        assert!(registry.sound(SoundId(2)).is_none());
        assert_eq!(registry.sound(SoundId(1)).unwrap().name, "theme");
    }

    #[test]
    fn test_first_pack_wins_on_id_collision() {
        let mut registry = SoundPackRegistry::new();
        registry
            .register_sound_pack(SoundPack::new("a").with_sound(wav_sound(5, "first")))
            .unwrap();
        registry
            .register_sound_pack(SoundPack::new("b").with_sound(wav_sound(5, "second")))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.sound(SoundId(5)).unwrap().name, "first");
        // Still reachable by name through its own pack
        assert_eq!(registry.sound_by_name("b", "second").unwrap().id, SoundId(5));
    }

    #[test]
    fn test_get_sound_decodes_lazily() {
        let mut registry = SoundPackRegistry::new();
        registry
            .register_sound_pack(SoundPack::new("sfx").with_sound(wav_sound(3, "click")))
            .unwrap();
        assert!(!registry.sound(SoundId(3)).unwrap().loaded);

        let sound = registry.get_sound(SoundId(3), &WavDecoder).unwrap();
        assert!(sound.loaded);
        assert_eq!(sound.pcm.as_slice(), &[0, 100, 200]);
        assert_eq!(sound.sample_rate, 8_000);
    }

    #[test]
    fn test_get_sound_decode_failure_keeps_unloaded() {
        let mut registry = SoundPackRegistry::new();
        let broken = Sound::new(SoundId(9), "broken", b"garbage".to_vec());
        registry
            .register_sound_pack(SoundPack::new("sfx").with_sound(broken))
            .unwrap();

        let sound = registry.get_sound(SoundId(9), &WavDecoder).unwrap();
        assert!(!sound.loaded);
        assert!(sound.pcm.is_empty());
    }

    #[test]
    fn test_get_sound_missing() {
        let mut registry = SoundPackRegistry::new();
        assert_eq!(
            registry.get_sound(SoundId(1), &WavDecoder).unwrap_err(),
            AudioError::SoundNotFound(SoundId(1))
        );
        assert!(!registry.contains_pack("sfx"));
        assert!(registry.is_empty());
    }
}
