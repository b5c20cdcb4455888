use crate::audio::AudioEngine;
use crate::mpris::MprisHandle;
use crate::player::PlayerController;

/// Push the controller's current state to MPRIS. The handle only signals
/// properties that actually changed.
pub fn update_mpris<E: AudioEngine>(mpris: &MprisHandle, player: &PlayerController<E>) {
    mpris.set_track_metadata(player.current_track());
    mpris.set_playback(player.phase());
    mpris.set_volume(f64::from(player.volume()));
}
