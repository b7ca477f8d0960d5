//! Emitter lifecycle manager
//!
//! Emitters move through `Initial -> Playing -> (Paused <-> Playing) -> Stopped`
//! as reported by the backend. `tick()` culls `Once` emitters once their
//! source reports `Stopped`; `Loop` emitters live until destroyed.

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::decoder::{AudioDecoder, WavDecoder};
use super::emitter::{AudioEmitter, AudioEmitterId, AudioStatus, EmitterDesc, Listener, PlayType};
use super::player::{create_player, AudioPlayer};
use super::registry::SoundPackRegistry;
use super::sound::{Sound, SoundId, SoundPack};
use super::AudioError;
use crate::config::AudioConfig;
use crate::constants::DEFAULT_GLOBAL_VOLUME;

pub struct SoundHandler {
    registry: SoundPackRegistry,
    decoder: Box<dyn AudioDecoder>,
    player: Box<dyn AudioPlayer>,
    emitters: BTreeMap<AudioEmitterId, AudioEmitter>,
    next_emitter_id: u64,
    /// Picks among `create_emitters` candidates
    rng: StdRng,
}

impl SoundHandler {
    /// Take ownership of a decoder and an already activated backend
    pub fn new(decoder: Box<dyn AudioDecoder>, mut player: Box<dyn AudioPlayer>) -> Self {
        player.update_listener_state(&Listener::default());
        player.set_volume(DEFAULT_GLOBAL_VOLUME);

        Self {
            registry: SoundPackRegistry::new(),
            decoder,
            player,
            emitters: BTreeMap::new(),
            next_emitter_id: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// WAV decoder plus the configured backend
    pub fn from_config(config: &AudioConfig) -> Self {
        let mut player = create_player(config.backend);
        player.activate();
        info!("Audio backend: {}", player.name());

        let mut handler = Self::new(Box::new(WavDecoder), player);
        handler.set_global_volume(config.global_volume);
        handler
    }

    /// Make candidate selection reproducible
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn register_sound_pack(&mut self, pack: SoundPack) -> Result<(), AudioError> {
        self.registry.register_sound_pack(pack)
    }

    pub fn registry(&self) -> &SoundPackRegistry {
        &self.registry
    }

    /// Look up a sound, decoding it on first access
    pub fn get_sound(&mut self, id: SoundId) -> Result<&Sound, AudioError> {
        self.registry.get_sound(id, self.decoder.as_ref())
    }

    /// Create an emitter for `id` and set it up on the backend (not played)
    pub fn create_emitter(
        &mut self,
        id: SoundId,
        desc: &EmitterDesc,
    ) -> Result<AudioEmitterId, AudioError> {
        let sound = self.registry.get_sound(id, self.decoder.as_ref())?;

        let emitter_id = AudioEmitterId(self.next_emitter_id);
        self.next_emitter_id += 1;

        let mut emitter = AudioEmitter {
            source_id: 0,
            status_handle: 0,
            sound_id: id,
            position: desc.position,
            velocity: desc.velocity,
            direction: desc.direction,
            radius: desc.radius,
            volume: sound.volume * desc.volume,
            play_type: desc.play_type,
            world: desc.world,
        };
        self.player.setup_emitter(&mut emitter, sound);
        debug!("Created {} for sound {} '{}'", emitter_id, id, sound.name);

        self.emitters.insert(emitter_id, emitter);
        Ok(emitter_id)
    }

    /// Create an emitter for one sound picked uniformly from `ids`
    pub fn create_emitters(
        &mut self,
        ids: &[SoundId],
        desc: &EmitterDesc,
    ) -> Result<AudioEmitterId, AudioError> {
        let id = *ids.choose(&mut self.rng).ok_or(AudioError::NoCandidates)?;
        self.create_emitter(id, desc)
    }

    /// Play a sound right away on a listener-relative emitter
    pub fn play_sound(
        &mut self,
        id: SoundId,
        play_type: PlayType,
    ) -> Result<AudioEmitterId, AudioError> {
        let desc = EmitterDesc {
            play_type,
            ..EmitterDesc::default()
        };
        let emitter_id = self.create_emitter(id, &desc)?;
        self.play_emitter(emitter_id);
        Ok(emitter_id)
    }

    pub fn emitter_exists(&self, id: AudioEmitterId) -> bool {
        self.emitters.contains_key(&id)
    }

    pub fn emitter(&self, id: AudioEmitterId) -> Option<&AudioEmitter> {
        self.emitters.get(&id)
    }

    pub fn emitters(&self) -> &BTreeMap<AudioEmitterId, AudioEmitter> {
        &self.emitters
    }

    /// Returns false for unknown ids
    pub fn play_emitter(&mut self, id: AudioEmitterId) -> bool {
        match self.emitters.get(&id) {
            Some(emitter) => {
                self.player.play_emitter(emitter);
                true
            }
            None => {
                warn!("play: unknown {}", id);
                false
            }
        }
    }

    /// Returns false for unknown ids
    pub fn pause_emitter(&mut self, id: AudioEmitterId) -> bool {
        match self.emitters.get(&id) {
            Some(emitter) => {
                self.player.pause_emitter(emitter);
                true
            }
            None => {
                warn!("pause: unknown {}", id);
                false
            }
        }
    }

    /// Returns false for unknown ids
    pub fn stop_emitter(&mut self, id: AudioEmitterId) -> bool {
        match self.emitters.get(&id) {
            Some(emitter) => {
                self.player.stop_emitter(emitter);
                true
            }
            None => {
                warn!("stop: unknown {}", id);
                false
            }
        }
    }

    /// Release an emitter's backend resources and forget it
    pub fn destroy_emitter(&mut self, id: AudioEmitterId) -> bool {
        match self.emitters.remove(&id) {
            Some(emitter) => {
                self.player.clean_up_resource(&emitter);
                true
            }
            None => {
                warn!("destroy: unknown {}", id);
                false
            }
        }
    }

    /// Per-frame update
    pub fn tick(&mut self, listener: &Listener) {
        self.player.update_listener_state(listener);

        for emitter in self.emitters.values() {
            self.player.update_emitter_state(emitter);
        }

        let player = &mut self.player;
        self.emitters.retain(|id, emitter| {
            let finished = emitter.play_type == PlayType::Once
                && player.audio_status(emitter.source_id) == AudioStatus::Stopped;
            if finished {
                player.clean_up_resource(emitter);
                trace!("Culled {}", id);
            }
            !finished
        });
    }

    pub fn destroy_emitters(&mut self) {
        for emitter in std::mem::take(&mut self.emitters).into_values() {
            self.player.clean_up_resource(&emitter);
        }
    }

    pub fn set_global_volume(&mut self, volume: f32) {
        self.player.set_volume(volume);
    }

    /// Swap the backend at runtime
    ///
    /// All emitters are destroyed against the old backend before it is
    /// dropped; the new one is activated afterwards.
    pub fn replace_audio_player(&mut self, player: Box<dyn AudioPlayer>) {
        self.destroy_emitters();
        let old = std::mem::replace(&mut self.player, player);
        info!("Audio backend: {} -> {}", old.name(), self.player.name());
        drop(old);

        self.player.set_volume(DEFAULT_GLOBAL_VOLUME);
        self.player.activate();
    }

    pub fn player(&self) -> &dyn AudioPlayer {
        self.player.as_ref()
    }
}
