//! Recording backend and decoder for handler tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use super::decoder::{AudioDecoder, SoundDecodeError};
use super::emitter::{AudioEmitter, AudioStatus, Listener};
use super::player::AudioPlayer;
use super::sound::Sound;

/// Everything a `MockPlayer` was asked to do
#[derive(Debug, Default)]
pub struct PlayerLog {
    pub calls: Vec<String>,
    pub volume: Option<f32>,
    pub activations: usize,
    pub listener: Option<Listener>,
    /// Source id -> status reported by `audio_status`
    pub statuses: HashMap<u32, AudioStatus>,
    pub cleaned: Vec<u32>,
    pub next_source: u32,
}

#[derive(Clone)]
pub struct MockPlayer {
    pub log: Rc<RefCell<PlayerLog>>,
}

impl MockPlayer {
    pub fn new() -> (Self, Rc<RefCell<PlayerLog>>) {
        let log = Rc::new(RefCell::new(PlayerLog::default()));
        (Self { log: Rc::clone(&log) }, log)
    }
}

impl AudioPlayer for MockPlayer {
    fn name(&self) -> &str {
        "mock"
    }

    fn activate(&mut self) {
        let mut log = self.log.borrow_mut();
        log.activations += 1;
        log.calls.push("activate".to_string());
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.borrow_mut().volume = Some(volume);
    }

    fn update_listener_state(&mut self, listener: &Listener) {
        let mut log = self.log.borrow_mut();
        log.listener = Some(*listener);
        log.calls.push("listener".to_string());
    }

    fn update_emitter_state(&mut self, emitter: &AudioEmitter) {
        self.log
            .borrow_mut()
            .calls
            .push(format!("update {}", emitter.source_id));
    }

    fn setup_emitter(&mut self, emitter: &mut AudioEmitter, _sound: &Sound) {
        let mut log = self.log.borrow_mut();
        log.next_source += 1;
        let id = log.next_source;
        log.statuses.insert(id, AudioStatus::Initial);
        log.calls.push(format!("setup {}", id));
        emitter.source_id = id;
        emitter.status_handle = id;
    }

    fn play_emitter(&mut self, emitter: &AudioEmitter) {
        let mut log = self.log.borrow_mut();
        log.statuses.insert(emitter.source_id, AudioStatus::Playing);
        log.calls.push(format!("play {}", emitter.source_id));
    }

    fn pause_emitter(&mut self, emitter: &AudioEmitter) {
        let mut log = self.log.borrow_mut();
        log.statuses.insert(emitter.source_id, AudioStatus::Paused);
        log.calls.push(format!("pause {}", emitter.source_id));
    }

    fn stop_emitter(&mut self, emitter: &AudioEmitter) {
        let mut log = self.log.borrow_mut();
        log.statuses.insert(emitter.source_id, AudioStatus::Stopped);
        log.calls.push(format!("stop {}", emitter.source_id));
    }

    fn audio_status(&self, source_id: u32) -> AudioStatus {
        self.log
            .borrow()
            .statuses
            .get(&source_id)
            .copied()
            .unwrap_or(AudioStatus::Stopped)
    }

    fn clean_up_resource(&mut self, emitter: &AudioEmitter) {
        let mut log = self.log.borrow_mut();
        log.statuses.remove(&emitter.source_id);
        log.cleaned.push(emitter.source_id);
        log.calls.push(format!("cleanup {}", emitter.source_id));
    }
}

/// Decoder that yields a fixed PCM buffer, or always fails
pub struct MockDecoder {
    pub fail: bool,
    /// Number of decode attempts
    pub decodes: Rc<Cell<usize>>,
}

impl MockDecoder {
    pub fn ok() -> Self {
        Self {
            fail: false,
            decodes: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            decodes: Rc::new(Cell::new(0)),
        }
    }
}

impl AudioDecoder for MockDecoder {
    fn to_pcm16(&self, sound: &mut Sound) -> Result<(), SoundDecodeError> {
        self.decodes.set(self.decodes.get() + 1);
        if self.fail {
            return Err(SoundDecodeError::Empty);
        }
        sound.pcm = Arc::new(vec![0; 100]);
        sound.sample_rate = 100;
        sound.channels = 1;
        Ok(())
    }
}
