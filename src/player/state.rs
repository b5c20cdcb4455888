/// Coarse phase of the player, as shown to the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerPhase {
    /// Empty playlist; transport is inert.
    #[default]
    Idle,
    Paused,
    Playing,
}

/// Play intent vs. what the engine last confirmed.
///
/// `requested` flips immediately on user input; `confirmed` follows the
/// engine's Playing/Paused reports. They disagree while a request is in
/// flight or after the engine refused one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PlayIntent {
    pub requested: bool,
    pub confirmed: bool,
}

impl PlayIntent {
    pub fn is_pending(&self) -> bool {
        self.requested != self.confirmed
    }
}

/// Snapshot of the transport state for display and remote control.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaybackState {
    /// `None` when the playlist is empty.
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub volume: f32,
    pub progress_percent: f64,
}
