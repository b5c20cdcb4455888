//! The player state machine.
//!
//! `PlayerController` owns the playlist and drives one
//! [`AudioEngine`](crate::audio::AudioEngine); `progress` holds the
//! NaN-free time math.

mod controller;
mod progress;
mod state;

pub use controller::PlayerController;
pub use progress::{format_mmss, format_mmss_opt, progress_percent};
pub use state::{PlayIntent, PlaybackState, PlayerPhase};

#[cfg(test)]
mod tests;
