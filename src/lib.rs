//! assetcore - bitmap font atlases and audio emitter lifecycle
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            FileSystem (fs)               │
//! ├────────────────────┬─────────────────────┤
//! │  .met/.fnt (font)  │  SoundPack (audio)  │
//! │         ↓          │          ↓          │
//! │  Skyline packer    │  SoundHandler tick  │
//! │         ↓          │          ↓          │
//! │  TextureSink (gpu) │  AudioPlayer        │
//! └────────────────────┴─────────────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod constants;
pub mod font;
pub mod fs;
pub mod gpu;
