//! The audio engine: a rodio-backed thread driven through the
//! [`AudioEngine`] trait.

mod engine;
mod player;
mod sink;
mod thread;
mod types;

pub use engine::AudioEngine;
pub use player::AudioPlayer;
pub use types::{AudioCmd, EngineEvent};
