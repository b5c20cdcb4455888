use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::app::{App, InputMode};
use crate::audio::{AudioEngine, EngineEvent};
use crate::config;
use crate::error::PlayerError;
use crate::library::{IngestEvent, Ingestor, expand};
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::PlayerController;
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// Everything the event loop mutates.
pub struct Session<E: AudioEngine> {
    pub app: App,
    pub player: PlayerController<E>,
    pub ingestor: Ingestor,
}

impl<E: AudioEngine> Session<E> {
    /// Expand `paths` and start ingesting the files found.
    pub fn add_paths(&mut self, paths: &[PathBuf], settings: &config::IngestSettings) {
        if paths.is_empty() {
            return;
        }
        let files = expand(paths, settings);
        if files.is_empty() {
            self.app.set_status("No audio files found");
            return;
        }
        let n = self.ingestor.submit(files);
        info!(files = n, "ingesting");
        self.app.set_status(format!("Loading {n} file(s)"));
    }

    /// Log a failed intent and surface it in the status line.
    fn report(&mut self, result: Result<(), PlayerError>) {
        if let Err(e) = result {
            match e {
                PlayerError::DurationUnknown => debug!("{e}"),
                _ => warn!("{e}"),
            }
            self.app.set_status(e.to_string());
        }
    }

    fn follow_on(&mut self, settings: &config::Settings) {
        if settings.ui.follow_playback {
            self.app.follow_playback = true;
        }
    }
}

/// Append finished ingestions in completion order.
pub fn drain_ingest<E: AudioEngine>(session: &mut Session<E>, rx: &Receiver<IngestEvent>) {
    let mut added = 0usize;
    // File name of the last failure in this batch.
    let mut skipped: Option<String> = None;

    while let Ok(ev) = rx.try_recv() {
        match ev {
            IngestEvent::Loaded(track) => match session.player.append(track) {
                Ok(_) => added += 1,
                Err(e) => session.report(Err(e)),
            },
            IngestEvent::Failed(e) => {
                let name = e
                    .path()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| e.path().display().to_string());
                skipped = Some(name);
            }
        }
    }

    if let Some(msg) = ingest_status(added, skipped) {
        session.app.set_status(msg);
    }
}

/// Status line for one drained batch. Only the last skipped file is named.
fn ingest_status(added: usize, skipped: Option<String>) -> Option<String> {
    match (added, skipped) {
        (0, None) => None,
        (0, Some(name)) => Some(format!("Skipped {name}: not playable")),
        (n, None) => Some(format!("Added {n} track(s)")),
        (n, Some(name)) => Some(format!("Added {n} track(s); skipped {name}: not playable")),
    }
}

pub fn drain_engine<E: AudioEngine>(session: &mut Session<E>, rx: &Receiver<EngineEvent>) {
    while let Ok(ev) = rx.try_recv() {
        let res = session.player.handle_event(ev);
        session.report(res);
    }
}

/// Main terminal event loop: handles input, UI drawing, engine reports and
/// MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run<E: AudioEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    session: &mut Session<E>,
    mpris: &MprisHandle,
    ingest_rx: &Receiver<IngestEvent>,
    engine_rx: &Receiver<EngineEvent>,
    control_rx: &Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        drain_ingest(session, ingest_rx);
        drain_engine(session, engine_rx);

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, settings, session) {
                return Ok(());
            }
        }

        // Cursor follows the current track (selection, auto-advance, media keys).
        let current = session.player.current_index();
        session.app.follow(current);
        session.app.clamp_cursor(session.player.len());

        // Keep MPRIS in sync even when playback changes come from media keys or auto-advance.
        update_mpris(mpris, &session.player);

        let pending = session.ingestor.pending();
        terminal.draw(|f| {
            ui::draw(
                f,
                &session.app,
                &session.player,
                pending,
                &settings.ui,
                &settings.controls,
            )
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, session) {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply a command from MPRIS. Returns `true` when the app should quit.
pub fn handle_control_cmd<E: AudioEngine>(
    cmd: ControlCmd,
    settings: &config::Settings,
    session: &mut Session<E>,
) -> bool {
    debug!(?cmd, "control command");
    let res = match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => session.player.play(),
        ControlCmd::Pause => session.player.pause(),
        ControlCmd::PlayPause => session.player.toggle_play_pause(),
        // Stop is rewind-and-pause; the track stays current.
        ControlCmd::Stop => {
            let res = session.player.pause();
            if res.is_ok() && session.player.can_seek() {
                session.player.seek_percent(0.0)
            } else {
                res
            }
        }
        ControlCmd::Next => {
            session.follow_on(settings);
            session.player.play_next()
        }
        ControlCmd::Prev => {
            session.follow_on(settings);
            session.player.play_previous()
        }
        ControlCmd::SetVolume(v) => session.player.set_volume(v as f32),
    };
    session.report(res);
    false
}

/// Apply a key press. Returns `true` when the app should quit.
pub fn handle_key_event<E: AudioEngine>(
    key: KeyEvent,
    settings: &config::Settings,
    session: &mut Session<E>,
) -> bool {
    if session.app.mode == InputMode::AddFiles {
        match key.code {
            KeyCode::Esc => session.app.cancel_input(),
            KeyCode::Enter => {
                let paths = session.app.take_input();
                session.add_paths(&paths, &settings.ingest);
            }
            KeyCode::Backspace => session.app.pop_input(),
            KeyCode::Char(c) if !c.is_control() => session.app.push_input(c),
            _ => {}
        }
        return false;
    }

    // Any key other than the second `g` breaks the chord.
    let gg = std::mem::take(&mut session.app.pending_g);
    let len = session.player.len();
    let seek_step = settings.controls.seek_step_percent;
    let volume_step = settings.controls.volume_step;

    let res = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('p') | KeyCode::Char(' ') => session.player.toggle_play_pause(),
        KeyCode::Char('l') => {
            session.follow_on(settings);
            session.player.play_next()
        }
        KeyCode::Char('h') => {
            session.follow_on(settings);
            session.player.play_previous()
        }
        KeyCode::Char('L') => session.player.seek_by_percent(seek_step),
        KeyCode::Char('H') => session.player.seek_by_percent(-seek_step),
        KeyCode::Char(d @ '0'..='9') => {
            let tenth = d.to_digit(10).unwrap_or(0);
            session.player.seek_percent(f64::from(tenth) * 10.0)
        }
        KeyCode::Char('+') | KeyCode::Char('=') => session.player.change_volume(volume_step),
        KeyCode::Char('-') => session.player.change_volume(-volume_step),
        KeyCode::Char('j') | KeyCode::Down => {
            session.app.follow_playback = false;
            session.app.cursor_down(len);
            Ok(())
        }
        KeyCode::Char('k') | KeyCode::Up => {
            session.app.follow_playback = false;
            session.app.cursor_up(len);
            Ok(())
        }
        KeyCode::Char('g') => {
            if gg {
                session.app.follow_playback = false;
                session.app.cursor_top();
            } else {
                session.app.pending_g = true;
            }
            Ok(())
        }
        KeyCode::Char('G') => {
            session.app.follow_playback = false;
            session.app.cursor_bottom(len);
            Ok(())
        }
        KeyCode::Enter => {
            session.follow_on(settings);
            session.player.select(session.app.cursor)
        }
        KeyCode::Char('a') => {
            session.app.begin_add();
            Ok(())
        }
        KeyCode::Char('x') => {
            if len == 0 {
                Ok(())
            } else {
                let res = session.player.remove(session.app.cursor).map(|removed| {
                    session.app.set_status(format!("Removed {}", removed.title));
                });
                session.app.clamp_cursor(session.player.len());
                res
            }
        }
        KeyCode::Char('K') => {
            session.app.toggle_metadata_window();
            Ok(())
        }
        KeyCode::Esc => {
            session.app.metadata_window = false;
            session.app.clear_status();
            Ok(())
        }
        _ => Ok(()),
    };
    session.report(res);
    false
}
