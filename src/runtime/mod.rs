use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info};

use crate::app::App;
use crate::audio::{AudioPlayer, EngineEvent};
use crate::cli::Args;
use crate::library::{IngestEvent, Ingestor};
use crate::mpris::ControlCmd;
use crate::player::PlayerController;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;


pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut settings = settings::load_settings(args.config.as_deref());
    if let Some(v) = args.volume {
        settings.playback.volume = v;
    }
    if args.no_mpris {
        settings.mpris.enabled = false;
    }

    if args.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let _log_guard = logging::init_logging(&settings.log_directory(), &settings.log.level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>();
    let (ingest_tx, ingest_rx) = mpsc::channel::<IngestEvent>();
    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();

    let audio_player = AudioPlayer::new(settings.audio.clone(), engine_tx);
    let mut session = event_loop::Session {
        app: App::new(settings.ui.follow_playback),
        player: PlayerController::new(audio_player, settings.playback.volume),
        ingestor: Ingestor::new(ingest_tx),
    };
    session.add_paths(&args.paths, &settings.ingest);

    let mpris = crate::mpris::spawn_mpris(control_tx, settings.mpris.enabled);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut session,
        &mpris,
        &ingest_rx,
        &engine_rx,
        &control_rx,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        error!("event loop failed: {e}");
    }
    session
        .player
        .engine()
        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
    info!("bye");

    run_result
}
