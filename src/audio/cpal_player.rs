//! System audio output through cpal
//!
//! Each emitter becomes a voice in a shared table; the cpal callback sums
//! the playing voices at their emitter volume and the global volume.
//! No spatialization: positions are ignored.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::emitter::{AudioEmitter, AudioStatus, Listener, PlayType};
use super::player::AudioPlayer;
use super::sound::Sound;

/// One playing (or paused) sound
struct Voice {
    pcm: Arc<Vec<i16>>,
    channels: usize,
    sample_rate: u32,
    /// Position in source frames
    cursor: f64,
    gain: f32,
    looping: bool,
    status: AudioStatus,
}

impl Voice {
    fn frames(&self) -> usize {
        self.pcm.len() / self.channels.max(1)
    }
}

/// Voice table shared with the audio callback
struct Mixer {
    voices: HashMap<u32, Voice>,
    volume: f32,
    output_rate: u32,
}

impl Mixer {
    /// Produce one mono output sample and advance all playing voices
    fn next_sample(&mut self) -> f32 {
        let mut acc = 0.0f32;
        let output_rate = self.output_rate.max(1) as f64;

        for voice in self.voices.values_mut() {
            if voice.status != AudioStatus::Playing {
                continue;
            }

            let frames = voice.frames();
            if frames == 0 {
                voice.status = AudioStatus::Stopped;
                continue;
            }
            if voice.cursor as usize >= frames {
                if voice.looping {
                    voice.cursor %= frames as f64;
                } else {
                    voice.status = AudioStatus::Stopped;
                    continue;
                }
            }

            // Downmix to mono
            let base = voice.cursor as usize * voice.channels;
            let sum: i32 = voice.pcm[base..base + voice.channels]
                .iter()
                .map(|&s| s as i32)
                .sum();
            let sample = sum as f32 / voice.channels as f32 / 32768.0;

            acc += sample * voice.gain;
            voice.cursor += voice.sample_rate as f64 / output_rate;
        }

        (acc * self.volume).clamp(-1.0, 1.0)
    }
}

fn lock(mixer: &Mutex<Mixer>) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut mixer = lock(&mixer);
            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(mixer.next_sample());
                frame.fill(value);
            }
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )
}

/// Backend playing through the default output device
pub struct CpalPlayer {
    mixer: Arc<Mutex<Mixer>>,
    /// The cpal stream (kept alive while active)
    stream: Option<cpal::Stream>,
    next_source: u32,
}

impl CpalPlayer {
    pub fn new() -> Self {
        Self {
            mixer: Arc::new(Mutex::new(Mixer {
                voices: HashMap::new(),
                volume: 1.0,
                output_rate: 44_100,
            })),
            stream: None,
            next_source: 1,
        }
    }

    fn open_stream(&self) -> Result<(cpal::Stream, u32), String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "No audio output device available".to_string())?;
        let supported = device
            .default_output_config()
            .map_err(|e| format!("Failed to get default output config: {}", e))?;

        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.config();
        let mixer = Arc::clone(&self.mixer);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer),
            other => return Err(format!("Unsupported sample format: {:?}", other)),
        }
        .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to play audio stream: {}", e))?;

        Ok((stream, sample_rate))
    }

    fn with_voice(&self, source_id: u32, f: impl FnOnce(&mut Voice)) {
        if let Some(voice) = lock(&self.mixer).voices.get_mut(&source_id) {
            f(voice);
        }
    }
}

impl Default for CpalPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlayer for CpalPlayer {
    fn name(&self) -> &str {
        "cpal"
    }

    fn activate(&mut self) {
        if self.stream.is_some() {
            return;
        }
        match self.open_stream() {
            Ok((stream, sample_rate)) => {
                lock(&self.mixer).output_rate = sample_rate;
                self.stream = Some(stream);
                info!("cpal audio backend active ({}Hz)", sample_rate);
            }
            // Stay silent rather than fail the caller
            Err(e) => error!("{}", e),
        }
    }

    fn set_volume(&mut self, volume: f32) {
        lock(&self.mixer).volume = volume.clamp(0.0, 1.0);
    }

    fn update_listener_state(&mut self, _listener: &Listener) {}

    fn update_emitter_state(&mut self, emitter: &AudioEmitter) {
        let gain = emitter.volume;
        self.with_voice(emitter.source_id, |voice| voice.gain = gain);
    }

    fn setup_emitter(&mut self, emitter: &mut AudioEmitter, sound: &Sound) {
        let id = self.next_source;
        self.next_source += 1;

        lock(&self.mixer).voices.insert(
            id,
            Voice {
                pcm: Arc::clone(&sound.pcm),
                channels: sound.channels as usize,
                sample_rate: sound.sample_rate,
                cursor: 0.0,
                gain: emitter.volume,
                looping: emitter.play_type == PlayType::Loop,
                status: AudioStatus::Initial,
            },
        );
        emitter.source_id = id;
        emitter.status_handle = id;
        debug!("cpal voice {} for sound {}", id, sound.id);
    }

    fn play_emitter(&mut self, emitter: &AudioEmitter) {
        self.with_voice(emitter.source_id, |voice| {
            if voice.status == AudioStatus::Stopped {
                voice.cursor = 0.0;
            }
            voice.status = AudioStatus::Playing;
        });
    }

    fn pause_emitter(&mut self, emitter: &AudioEmitter) {
        self.with_voice(emitter.source_id, |voice| {
            if voice.status == AudioStatus::Playing {
                voice.status = AudioStatus::Paused;
            }
        });
    }

    fn stop_emitter(&mut self, emitter: &AudioEmitter) {
        self.with_voice(emitter.source_id, |voice| voice.status = AudioStatus::Stopped);
    }

    fn audio_status(&self, source_id: u32) -> AudioStatus {
        lock(&self.mixer)
            .voices
            .get(&source_id)
            .map_or(AudioStatus::Stopped, |voice| voice.status)
    }

    fn clean_up_resource(&mut self, emitter: &AudioEmitter) {
        lock(&self.mixer).voices.remove(&emitter.source_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer_with(voice: Voice) -> Mixer {
        let mut voices = HashMap::new();
        voices.insert(1, voice);
        Mixer {
            voices,
            volume: 1.0,
            output_rate: 10,
        }
    }

    fn voice(pcm: Vec<i16>, looping: bool) -> Voice {
        Voice {
            pcm: Arc::new(pcm),
            channels: 1,
            sample_rate: 10,
            cursor: 0.0,
            gain: 1.0,
            looping,
            status: AudioStatus::Playing,
        }
    }

    #[test]
    fn test_mixer_once_stops_at_end() {
        let mut mixer = mixer_with(voice(vec![16384, -16384], false));
        assert_eq!(mixer.next_sample(), 0.5);
        assert_eq!(mixer.next_sample(), -0.5);
        assert_eq!(mixer.next_sample(), 0.0);
        assert_eq!(mixer.voices[&1].status, AudioStatus::Stopped);
    }

    #[test]
    fn test_mixer_loop_wraps() {
        let mut mixer = mixer_with(voice(vec![16384, 0], true));
        for _ in 0..5 {
            mixer.next_sample();
        }
        assert_eq!(mixer.next_sample(), 0.0);
        assert_eq!(mixer.next_sample(), 0.5);
        assert_eq!(mixer.voices[&1].status, AudioStatus::Playing);
    }
}
