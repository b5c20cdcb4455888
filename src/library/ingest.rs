//! Load-and-measure tasks for newly added files.
//!
//! Every file gets its own thread that reads the bytes, measures the
//! duration and reports back over a channel. Results arrive in completion
//! order, which is the order tracks are appended in.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use lofty::file::AudioFile;
use lofty::probe::Probe;
use rodio::{Decoder, Source};
use tracing::{debug, info, warn};

use crate::error::IngestError;

use super::display::title_from_path;
use super::model::{ResourceHandle, Track, TrackId, UNKNOWN_ARTIST};

/// Outcome of one ingestion task.
#[derive(Debug)]
pub enum IngestEvent {
    Loaded(Track),
    Failed(IngestError),
}

pub struct Ingestor {
    tx: Sender<IngestEvent>,
    pending: Arc<AtomicUsize>,
}

impl Ingestor {
    pub fn new(tx: Sender<IngestEvent>) -> Self {
        Self {
            tx,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start one detached task per file. Returns how many were started.
    pub fn submit(&self, files: Vec<PathBuf>) -> usize {
        let count = files.len();
        for path in files {
            let tx = self.tx.clone();
            let pending = self.pending.clone();
            pending.fetch_add(1, Ordering::SeqCst);

            thread::spawn(move || {
                let event = match load_track(&path) {
                    Ok(track) => {
                        info!(id = %track.id, title = %track.title, duration_ms = track.duration.as_millis() as u64, "ingested");
                        IngestEvent::Loaded(track)
                    }
                    Err(e) => {
                        warn!("ingest failed: {e}");
                        IngestEvent::Failed(e)
                    }
                };
                pending.fetch_sub(1, Ordering::SeqCst);
                // Receiver gone means the session is over; nothing to do.
                let _ = tx.send(event);
            });
        }
        count
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Read `path` into memory and build a `Track` for it.
pub fn load_track(path: &Path) -> Result<Track, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let resource = ResourceHandle::from_bytes(path, bytes);
    let duration = measure(&resource)?;

    Ok(Track {
        id: TrackId::generate(),
        title: title_from_path(path),
        artist: UNKNOWN_ARTIST.to_string(),
        duration,
        resource,
    })
}

/// Measure a resource and make sure the engine can actually play it.
///
/// The container header is the preferred source of the length. A file is
/// only accepted when rodio can also build a decoder for it.
fn measure(resource: &ResourceHandle) -> Result<Duration, IngestError> {
    let path = resource.origin().to_path_buf();

    let tagged = Probe::new(Cursor::new(resource.as_ref()))
        .guess_file_type()
        .map_err(|e| IngestError::Io {
            path: path.clone(),
            source: e,
        })?
        .read()
        .map_err(|source| IngestError::Probe {
            path: path.clone(),
            source,
        })?;

    let decoder = Decoder::new(Cursor::new(resource.clone()))
        .map_err(|source| IngestError::Decode { path, source })?;

    let duration = tagged.properties().duration();
    if !duration.is_zero() {
        return Ok(duration);
    }

    // Some containers carry no length header.
    let duration = decoder.total_duration().unwrap_or(Duration::ZERO);
    debug!(path = %resource.origin().display(), ?duration, "duration from decoder");
    Ok(duration)
}
