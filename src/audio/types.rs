//! Audio-related small types.
//!
//! Commands sent to the audio thread and the events it reports back.

use std::time::Duration;

use crate::library::ResourceHandle;

/// Commands understood by the audio thread.
#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the current source. `generation` tags every event about it.
    Load {
        generation: u64,
        resource: ResourceHandle,
    },
    /// Drop the current source without loading another.
    Unload,
    /// Start or resume playback. Restarts from the top after a natural end.
    Play,
    /// Pause playback.
    Pause,
    /// Jump to an absolute position in the current source.
    Seek(Duration),
    /// Set the output volume, `[0, 1]`.
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Events reported by the audio thread, each tagged with the generation of
/// the source it is about.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The source decoded and its length is known (if the format says).
    LoadedMetadata {
        generation: u64,
        duration: Option<Duration>,
    },
    /// Periodic position report while playing, and after every seek.
    TimeUpdate { generation: u64, position: Duration },
    /// Playback actually started.
    Playing { generation: u64 },
    /// Playback actually paused.
    Paused { generation: u64 },
    /// The source played to its natural end.
    Ended { generation: u64 },
    /// Loading or playing failed; the source is unusable.
    Failed { generation: u64, message: String },
}

impl EngineEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::LoadedMetadata { generation, .. }
            | Self::TimeUpdate { generation, .. }
            | Self::Playing { generation }
            | Self::Paused { generation }
            | Self::Ended { generation }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}
