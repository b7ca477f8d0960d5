//! Audio payload decoding

use log::debug;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

use super::sound::Sound;

/// Malformed or unsupported audio payload
#[derive(Debug, Error)]
pub enum SoundDecodeError {
    #[error("invalid WAV data: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
    #[error("sound has no payload")]
    Empty,
}

/// Converts encoded sound payloads to 16-bit PCM
pub trait AudioDecoder {
    /// Decode `sound.bytes` into `sound.pcm`, `sample_rate` and `channels`
    fn to_pcm16(&self, sound: &mut Sound) -> Result<(), SoundDecodeError>;
}

/// RIFF/WAVE decoder (hound)
#[derive(Debug, Default, Clone, Copy)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn to_pcm16(&self, sound: &mut Sound) -> Result<(), SoundDecodeError> {
        if sound.bytes.is_empty() {
            return Err(SoundDecodeError::Empty);
        }

        let mut reader = hound::WavReader::new(Cursor::new(sound.bytes.as_slice()))?;
        let spec = reader.spec();

        let samples: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int => match spec.bits_per_sample {
                16 => reader.samples::<i16>().collect::<Result<_, _>>()?,
                8 => reader
                    .samples::<i8>()
                    .map(|s| s.map(|s| (s as i16) << 8))
                    .collect::<Result<_, _>>()?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| (s >> (spec.bits_per_sample - 16)) as i16))
                    .collect::<Result<_, _>>()?,
                bits => return Err(SoundDecodeError::UnsupportedBitDepth(bits)),
            },
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|s| (s.clamp(-1.0, 1.0) * 32767.0) as i16))
                .collect::<Result<_, _>>()?,
        };

        debug!(
            "Decoded sound {} '{}': {} samples, {}Hz, {}ch",
            sound.id,
            sound.name,
            samples.len(),
            spec.sample_rate,
            spec.channels
        );

        sound.pcm = Arc::new(samples);
        sound.sample_rate = spec.sample_rate;
        sound.channels = spec.channels;
        Ok(())
    }
}

/// Encode mono 16-bit PCM as an in-memory WAV file
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, SoundDecodeError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
