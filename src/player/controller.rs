use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::{AudioEngine, EngineEvent};
use crate::error::PlayerError;
use crate::library::Track;

use super::progress::{clamp_percent, clamp_volume, progress_percent, seek_position};
use super::state::{PlayIntent, PlaybackState, PlayerPhase};

/// Owns the playlist and the single playback session bound to it.
///
/// All mutation goes through here. With an empty playlist every transport
/// operation is a no-op that never touches the engine.
pub struct PlayerController<E: AudioEngine> {
    engine: E,
    tracks: Vec<Track>,
    current: usize,
    intent: PlayIntent,
    volume: f32,

    // Session state for the loaded source; reset on every retarget.
    generation: u64,
    position: Duration,
    progress: f64,
    engine_duration: Option<Duration>,

    last_error: Option<String>,
}

impl<E: AudioEngine> PlayerController<E> {
    pub fn new(engine: E, volume: f32) -> Self {
        Self {
            engine,
            tracks: Vec::new(),
            current: 0,
            intent: PlayIntent::default(),
            volume: clamp_volume(volume).unwrap_or(1.0),
            generation: 0,
            position: Duration::ZERO,
            progress: 0.0,
            engine_duration: None,
            last_error: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.tracks.is_empty()).then_some(self.current)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current)
    }

    /// The play intent, which is what the UI shows as playing/paused.
    pub fn is_playing(&self) -> bool {
        self.intent.requested
    }

    pub fn intent(&self) -> PlayIntent {
        self.intent
    }

    pub fn phase(&self) -> PlayerPhase {
        if self.tracks.is_empty() {
            PlayerPhase::Idle
        } else if self.intent.requested {
            PlayerPhase::Playing
        } else {
            PlayerPhase::Paused
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress
    }

    /// Length of the current track: the engine's report when it has one,
    /// otherwise the length measured at ingestion.
    pub fn duration(&self) -> Option<Duration> {
        self.engine_duration
            .filter(|d| !d.is_zero())
            .or_else(|| self.current_track().and_then(Track::known_duration))
    }

    pub fn can_seek(&self) -> bool {
        self.duration().is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_index: self.current_index(),
            is_playing: self.intent.requested,
            volume: self.volume,
            progress_percent: self.progress,
        }
    }

    /// Append an ingested track. The first track becomes current, paused.
    pub fn append(&mut self, track: Track) -> Result<usize, PlayerError> {
        info!(id = %track.id, title = %track.title, "appending track");
        self.tracks.push(track);
        let index = self.tracks.len() - 1;
        if index == 0 {
            self.current = 0;
            self.retarget()?;
        }
        Ok(index)
    }

    /// Remove the entry at `index`, returning it so the caller can drop it.
    ///
    /// Removing the current entry moves the session to the entry that takes
    /// its place (or the new last one) and keeps the play intent.
    pub fn remove(&mut self, index: usize) -> Result<Track, PlayerError> {
        if index >= self.tracks.len() {
            return Err(PlayerError::NoSuchTrack(index));
        }
        let removed = self.tracks.remove(index);
        info!(id = %removed.id, title = %removed.title, "removed track");

        if self.tracks.is_empty() {
            self.current = 0;
            self.intent = PlayIntent::default();
            self.reset_session();
            self.engine.unload()?;
        } else if index < self.current {
            self.current -= 1;
        } else if index == self.current {
            self.current = self.current.min(self.tracks.len() - 1);
            self.retarget()?;
        }
        Ok(removed)
    }

    /// Make `index` the current track without touching the play intent.
    pub fn select(&mut self, index: usize) -> Result<(), PlayerError> {
        if self.tracks.is_empty() {
            return Ok(());
        }
        if index >= self.tracks.len() {
            return Err(PlayerError::NoSuchTrack(index));
        }
        if index == self.current {
            return Ok(());
        }
        self.current = index;
        self.retarget()
    }

    /// Advance by one; no-op on the last track.
    pub fn play_next(&mut self) -> Result<(), PlayerError> {
        if self.current + 1 < self.tracks.len() {
            self.current += 1;
            self.retarget()?;
        }
        Ok(())
    }

    /// Go back by one; no-op on the first track.
    pub fn play_previous(&mut self) -> Result<(), PlayerError> {
        if !self.tracks.is_empty() && self.current > 0 {
            self.current -= 1;
            self.retarget()?;
        }
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), PlayerError> {
        if self.tracks.is_empty() {
            return Ok(());
        }
        if self.intent.requested {
            self.pause()
        } else {
            self.play()
        }
    }

    pub fn play(&mut self) -> Result<(), PlayerError> {
        if self.tracks.is_empty() {
            return Ok(());
        }
        self.intent.requested = true;
        self.last_error = None;
        self.engine.play()
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        if self.tracks.is_empty() {
            return Ok(());
        }
        self.intent.requested = false;
        self.engine.pause()
    }

    /// Jump to `percent` of the current track.
    ///
    /// Fails with `DurationUnknown` instead of seeking to a meaningless
    /// position when the length is unknown or zero.
    pub fn seek_percent(&mut self, percent: f64) -> Result<(), PlayerError> {
        if self.tracks.is_empty() {
            return Ok(());
        }
        let duration = self.duration().ok_or(PlayerError::DurationUnknown)?;
        let percent = clamp_percent(percent);
        let position = seek_position(percent, duration);

        debug!(percent, ?position, "seek");
        self.engine.seek(position)?;
        self.position = position;
        self.progress = percent;
        Ok(())
    }

    /// Seek relative to the current progress by `delta` percent.
    pub fn seek_by_percent(&mut self, delta: f64) -> Result<(), PlayerError> {
        self.seek_percent(self.progress + delta)
    }

    /// Set and apply the volume; it also sticks for later tracks.
    pub fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError> {
        let Some(volume) = clamp_volume(volume) else {
            return Ok(());
        };
        self.volume = volume;
        if self.tracks.is_empty() {
            return Ok(());
        }
        self.engine.set_volume(volume)
    }

    pub fn change_volume(&mut self, delta: f32) -> Result<(), PlayerError> {
        self.set_volume(self.volume + delta)
    }

    /// Fold an engine report into the state. Reports about a source that
    /// has since been replaced are dropped.
    pub fn handle_event(&mut self, event: EngineEvent) -> Result<(), PlayerError> {
        if event.generation() != self.generation || self.tracks.is_empty() {
            debug!(?event, current = self.generation, "dropping stale engine event");
            return Ok(());
        }

        match event {
            EngineEvent::LoadedMetadata { duration, .. } => {
                self.engine_duration = duration;
                if let (Some(d), Some(track)) = (duration, self.tracks.get_mut(self.current)) {
                    if track.duration.is_zero() {
                        track.duration = d;
                    }
                }
            }
            EngineEvent::TimeUpdate { position, .. } => {
                self.position = position;
                self.progress = progress_percent(position, self.duration());
            }
            EngineEvent::Playing { .. } => self.intent.confirmed = true,
            EngineEvent::Paused { .. } => self.intent.confirmed = false,
            EngineEvent::Ended { .. } => {
                self.intent.confirmed = false;
                if self.current + 1 < self.tracks.len() {
                    self.current += 1;
                    self.retarget()?;
                } else {
                    info!("reached the end of the playlist");
                    self.intent.requested = false;
                    if let Some(d) = self.duration() {
                        self.position = d;
                        self.progress = 100.0;
                    }
                }
            }
            EngineEvent::Failed { message, .. } => {
                warn!(generation = self.generation, "playback failed: {message}");
                self.intent = PlayIntent::default();
                self.last_error = Some(message);
            }
        }
        Ok(())
    }

    fn reset_session(&mut self) {
        self.generation += 1;
        self.position = Duration::ZERO;
        self.progress = 0.0;
        self.engine_duration = None;
    }

    /// Point the engine at the current track, from the start.
    fn retarget(&mut self) -> Result<(), PlayerError> {
        self.reset_session();
        let track = &self.tracks[self.current];
        debug!(generation = self.generation, index = self.current, title = %track.title, "retarget");

        self.engine.load(self.generation, &track.resource)?;
        self.engine.set_volume(self.volume)?;
        if self.intent.requested {
            self.engine.play()?;
        }
        Ok(())
    }
}
