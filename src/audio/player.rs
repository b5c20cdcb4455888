use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::AudioSettings;
use crate::error::PlayerError;
use crate::library::ResourceHandle;

use super::engine::AudioEngine;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, EngineEvent};

/// Handle to the audio thread. Commands go over a channel; events come
/// back on the sender given to [`AudioPlayer::new`].
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    pub fn new(audio_settings: AudioSettings, events: Sender<EngineEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let audio_handle = spawn_audio_thread(rx, events, audio_settings);

        Self {
            tx,
            join: Mutex::new(Some(audio_handle)),
        }
    }

    #[cfg(test)]
    pub(super) fn from_sender(tx: Sender<AudioCmd>) -> Self {
        Self {
            tx,
            join: Mutex::new(None),
        }
    }

    fn send(&self, cmd: AudioCmd) -> Result<(), PlayerError> {
        self.tx.send(cmd).map_err(|_| PlayerError::EngineGone)
    }

    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl AudioEngine for AudioPlayer {
    fn load(&mut self, generation: u64, resource: &ResourceHandle) -> Result<(), PlayerError> {
        self.send(AudioCmd::Load {
            generation,
            resource: resource.clone(),
        })
    }

    fn unload(&mut self) -> Result<(), PlayerError> {
        self.send(AudioCmd::Unload)
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.send(AudioCmd::Play)
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.send(AudioCmd::Pause)
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.send(AudioCmd::Seek(position))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError> {
        self.send(AudioCmd::SetVolume(volume))
    }
}
