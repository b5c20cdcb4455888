use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::config::AudioSettings;
use crate::error::EngineError;
use crate::library::ResourceHandle;

use super::sink::create_sink_at;
use super::types::{AudioCmd, EngineEvent};

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<EngineEvent>,
    settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let e = EngineError::from(e);
                error!("{e}");
                run_without_output(&rx, &events, &e.to_string());
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let tick = Duration::from_millis(settings.tick_ms.max(1));
        let mut engine = Engine::new(&stream, events, settings);

        loop {
            match rx.recv_timeout(tick) {
                Ok(AudioCmd::Quit { fade_out_ms }) => {
                    engine.quit(fade_out_ms);
                    break;
                }
                Ok(cmd) => engine.handle(cmd),
                Err(RecvTimeoutError::Timeout) => engine.tick(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("audio thread exiting");
    })
}

/// No output device: every load fails, everything else is ignored.
pub(super) fn run_without_output(
    rx: &Receiver<AudioCmd>,
    events: &Sender<EngineEvent>,
    message: &str,
) {
    let mut generation = 0;
    while let Ok(cmd) = rx.recv() {
        match cmd {
            AudioCmd::Load { generation: g, .. } => {
                generation = g;
                let _ = events.send(EngineEvent::Failed {
                    generation,
                    message: message.to_string(),
                });
            }
            AudioCmd::Play => {
                let _ = events.send(EngineEvent::Failed {
                    generation,
                    message: message.to_string(),
                });
            }
            AudioCmd::Quit { .. } => break,
            _ => {}
        }
    }
}

/// What a tick reports about the current source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TickReport {
    Quiet,
    Position,
    Ended,
}

/// Play/pause/end bookkeeping of the engine, kept apart from the sinks.
///
/// `drained` below means the sink has run out of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Transport {
    pub(super) paused: bool,
    pub(super) ended: bool,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            paused: true,
            ended: false,
        }
    }
}

impl Transport {
    /// A new source was loaded or the old one dropped.
    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Play after a natural end starts the source over.
    pub(super) fn needs_restart(&self, drained: bool) -> bool {
        self.ended || drained
    }

    pub(super) fn started(&mut self) {
        self.paused = false;
        self.ended = false;
    }

    pub(super) fn seeked(&mut self) {
        self.ended = false;
    }

    /// `Ended` is reported once per run; the source then counts as paused.
    pub(super) fn tick(&mut self, drained: bool) -> TickReport {
        if self.paused {
            return TickReport::Quiet;
        }
        if !drained {
            return TickReport::Position;
        }
        if self.ended {
            return TickReport::Quiet;
        }
        self.ended = true;
        self.paused = true;
        TickReport::Ended
    }
}

/// Seek inside the live source when it still has one and accepts the seek.
/// `false` means the source has to be rebuilt at the target instead.
pub(super) fn seek_in_place<E>(
    drained: bool,
    try_seek: impl FnOnce() -> Result<(), E>,
) -> bool {
    !drained && try_seek().is_ok()
}

struct Engine<'a> {
    stream: &'a OutputStream,
    events: Sender<EngineEvent>,
    settings: AudioSettings,

    generation: u64,
    resource: Option<ResourceHandle>,
    sink: Option<Sink>,
    // Previous source kept alive briefly so a following Play can crossfade.
    outgoing: Option<Sink>,
    transport: Transport,
    volume: f32,
}

impl<'a> Engine<'a> {
    fn new(stream: &'a OutputStream, events: Sender<EngineEvent>, settings: AudioSettings) -> Self {
        Self {
            stream,
            events,
            settings,
            generation: 0,
            resource: None,
            sink: None,
            outgoing: None,
            transport: Transport::default(),
            volume: 1.0,
        }
    }

    fn emit(&self, event: EngineEvent) {
        // Controller gone means shutdown is in progress.
        let _ = self.events.send(event);
    }

    fn fail(&self, e: EngineError) {
        warn!(generation = self.generation, "audio engine: {e}");
        self.emit(EngineEvent::Failed {
            generation: self.generation,
            message: e.to_string(),
        });
    }

    fn handle(&mut self, cmd: AudioCmd) {
        match cmd {
            AudioCmd::Load {
                generation,
                resource,
            } => self.load(generation, resource),
            AudioCmd::Unload => self.unload(),
            AudioCmd::Play => self.play(),
            AudioCmd::Pause => self.pause(),
            AudioCmd::Seek(position) => self.seek(position),
            AudioCmd::SetVolume(v) => {
                self.volume = v;
                if let Some(s) = self.sink.as_ref() {
                    s.set_volume(v);
                }
            }
            AudioCmd::Quit { .. } => {}
        }
    }

    fn load(&mut self, generation: u64, resource: ResourceHandle) {
        self.generation = generation;
        self.resource = None;

        if let Some(old) = self.sink.take() {
            if !self.transport.paused && self.settings.crossfade_ms > 0 {
                self.stop_outgoing();
                self.outgoing = Some(old);
            } else {
                old.stop();
            }
        }
        self.transport.reset();

        match create_sink_at(self.stream, &resource, Duration::ZERO, self.volume) {
            Ok((sink, duration)) => {
                debug!(generation, path = %resource.origin().display(), ?duration, "loaded source");
                self.sink = Some(sink);
                self.resource = Some(resource);
                self.emit(EngineEvent::LoadedMetadata {
                    generation,
                    duration,
                });
            }
            Err(e) => {
                self.stop_outgoing();
                self.fail(e);
            }
        }
    }

    fn unload(&mut self) {
        self.stop_outgoing();
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.resource = None;
        self.transport.reset();
    }

    fn play(&mut self) {
        if self.sink.is_none() {
            self.stop_outgoing();
            self.fail(EngineError::NoSource);
            return;
        }

        let drained = self.sink.as_ref().is_some_and(Sink::empty);
        if self.transport.needs_restart(drained) {
            if let Err(e) = self.rebuild_at(Duration::ZERO) {
                self.fail(e);
                return;
            }
        }

        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        self.transport.started();

        match self.outgoing.take() {
            Some(old) => crossfade(&old, sink, self.volume, &self.settings),
            None => sink.play(),
        }
        self.emit(EngineEvent::Playing {
            generation: self.generation,
        });
    }

    fn pause(&mut self) {
        self.stop_outgoing();
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
        self.transport.paused = true;
        self.emit(EngineEvent::Paused {
            generation: self.generation,
        });
    }

    fn seek(&mut self, position: Duration) {
        self.stop_outgoing();
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        if !seek_in_place(sink.empty(), || sink.try_seek(position)) {
            // Rebuild the source and skip into it.
            if let Err(e) = self.rebuild_at(position) {
                self.fail(e);
                return;
            }
        }

        self.transport.seeked();
        self.emit(EngineEvent::TimeUpdate {
            generation: self.generation,
            position,
        });
    }

    /// Replace the current sink with a fresh one starting at `position`,
    /// keeping the paused state.
    fn rebuild_at(&mut self, position: Duration) -> Result<(), EngineError> {
        let resource = self.resource.as_ref().ok_or(EngineError::NoSource)?;
        let (sink, _) = create_sink_at(self.stream, resource, position, self.volume)?;
        if !self.transport.paused {
            sink.play();
        }
        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        Ok(())
    }

    fn stop_outgoing(&mut self) {
        if let Some(old) = self.outgoing.take() {
            old.stop();
        }
    }

    fn tick(&mut self) {
        // A load that was not followed by play does not crossfade.
        self.stop_outgoing();

        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        match self.transport.tick(sink.empty()) {
            TickReport::Quiet => {}
            TickReport::Position => self.emit(EngineEvent::TimeUpdate {
                generation: self.generation,
                position: sink.get_pos(),
            }),
            TickReport::Ended => self.emit(EngineEvent::Ended {
                generation: self.generation,
            }),
        }
    }

    fn quit(&mut self, fade_out_ms: u64) {
        self.stop_outgoing();
        if let Some(s) = self.sink.take() {
            // Fade out gently before stopping.
            if !self.transport.paused {
                fade_out_sink(&s, self.volume, fade_out_ms);
            }
            s.stop();
        }
    }
}

/// Fade `old` out and `new` in to `volume`, then stop `old`.
fn crossfade(old: &Sink, new: &Sink, volume: f32, settings: &AudioSettings) {
    let steps = settings.crossfade_steps.max(1);
    let step_ms = (settings.crossfade_ms / steps).max(1);

    new.set_volume(0.0);
    new.play();

    // Fade volumes in a short blocking loop. Audio continues in rodio's mixer thread.
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        old.set_volume(volume * (1.0 - t));
        new.set_volume(volume * t);
        thread::sleep(Duration::from_millis(step_ms));
    }

    old.stop();
    new.set_volume(volume);
}

fn fade_out_sink(sink: &Sink, volume: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(volume * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
