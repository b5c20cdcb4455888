//! Error types shared across the player.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by `PlayerController` operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("audio engine is not running")]
    EngineGone,

    #[error("duration of the current track is not known yet")]
    DurationUnknown,

    #[error("no track at index {0}")]
    NoSuchTrack(usize),
}

/// Reasons a file never makes it into the playlist.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized audio in {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

impl IngestError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. } | Self::Probe { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

/// Failures inside the audio thread. These never cross the thread boundary
/// as values; they are reported as `EngineEvent::Failed` messages.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    Output(#[from] rodio::StreamError),

    #[error("failed to decode source: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),

    #[error("no source loaded")]
    NoSource,
}
