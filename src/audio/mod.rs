//! Sound packs and audio emitter lifecycle
//!
//! `SoundHandler` owns the pack registry, the live emitters and one
//! playback backend. Call `tick()` once per frame to push listener and
//! emitter state and to cull emitters that finished playing.

pub mod decoder;
pub mod emitter;
pub mod handler;
pub mod player;
pub mod registry;
pub mod sound;

#[cfg(feature = "cpal-backend")]
pub mod cpal_player;

#[cfg(test)]
mod testing;

pub use decoder::{encode_wav, AudioDecoder, SoundDecodeError, WavDecoder};
pub use emitter::{AudioEmitter, AudioEmitterId, AudioStatus, EmitterDesc, Listener, PlayType};
pub use handler::SoundHandler;
pub use player::{create_player, AudioPlayer, NullPlayer, PlayerKind};
pub use registry::SoundPackRegistry;
pub use sound::{Sound, SoundId, SoundPack};

#[cfg(feature = "cpal-backend")]
pub use cpal_player::CpalPlayer;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("sound pack '{0}' is already registered")]
    DuplicateSoundPack(String),
    #[error("sound {0} not found")]
    SoundNotFound(SoundId),
    #[error("no candidate sounds to choose from")]
    NoCandidates,
}
