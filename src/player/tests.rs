use super::progress::{clamp_percent, clamp_volume, seek_position};
use super::*;
use crate::audio::{AudioEngine, EngineEvent};
use crate::error::PlayerError;
use crate::library::{ResourceHandle, Track, TrackId, UNKNOWN_ARTIST};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load { generation: u64, path: PathBuf },
    Unload,
    Play,
    Pause,
    Seek(Duration),
    Volume(f32),
}

/// Engine double that records requests and never answers.
#[derive(Default)]
struct RecordingEngine {
    calls: Vec<Call>,
    gone: bool,
}

impl RecordingEngine {
    fn record(&mut self, call: Call) -> Result<(), PlayerError> {
        if self.gone {
            return Err(PlayerError::EngineGone);
        }
        self.calls.push(call);
        Ok(())
    }
}

impl AudioEngine for RecordingEngine {
    fn load(&mut self, generation: u64, resource: &ResourceHandle) -> Result<(), PlayerError> {
        self.record(Call::Load {
            generation,
            path: resource.origin().to_path_buf(),
        })
    }

    fn unload(&mut self) -> Result<(), PlayerError> {
        self.record(Call::Unload)
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.record(Call::Play)
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.record(Call::Pause)
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.record(Call::Seek(position))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError> {
        self.record(Call::Volume(volume))
    }
}

fn track(name: &str, secs: u64) -> Track {
    Track {
        id: TrackId::generate(),
        title: name.to_string(),
        artist: UNKNOWN_ARTIST.to_string(),
        duration: Duration::from_secs(secs),
        resource: ResourceHandle::from_bytes(format!("/music/{name}.mp3"), vec![0u8; 8]),
    }
}

fn player_with(names: &[&str]) -> PlayerController<RecordingEngine> {
    let mut p = PlayerController::new(RecordingEngine::default(), 1.0);
    for name in names {
        p.append(track(name, 100)).unwrap();
    }
    p
}

fn calls(p: &PlayerController<RecordingEngine>) -> &[Call] {
    &p.engine().calls
}

fn last_generation(p: &PlayerController<RecordingEngine>) -> u64 {
    calls(p)
        .iter()
        .rev()
        .find_map(|c| match c {
            Call::Load { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("no load recorded")
}

fn loaded_path(p: &PlayerController<RecordingEngine>) -> PathBuf {
    calls(p)
        .iter()
        .rev()
        .find_map(|c| match c {
            Call::Load { path, .. } => Some(path.clone()),
            _ => None,
        })
        .expect("no load recorded")
}

#[test]
fn empty_playlist_transport_is_inert() {
    let mut p = PlayerController::new(RecordingEngine::default(), 1.0);

    p.toggle_play_pause().unwrap();
    p.play_next().unwrap();
    p.play_previous().unwrap();
    p.select(3).unwrap();
    p.seek_percent(50.0).unwrap();
    p.set_volume(0.2).unwrap();

    assert!(calls(&p).is_empty());
    assert!(!p.is_playing());
    assert_eq!(p.phase(), PlayerPhase::Idle);
    assert_eq!(p.current_index(), None);
    // Volume is still remembered for the first track.
    assert!((p.volume() - 0.2).abs() < f32::EPSILON);
}

#[test]
fn first_append_selects_track_paused() {
    let p = player_with(&["A"]);

    assert_eq!(p.phase(), PlayerPhase::Paused);
    assert_eq!(p.current_index(), Some(0));
    assert_eq!(
        calls(&p),
        &[
            Call::Load {
                generation: 1,
                path: PathBuf::from("/music/A.mp3")
            },
            Call::Volume(1.0),
        ]
    );
}

#[test]
fn later_appends_do_not_retarget() {
    let p = player_with(&["A", "B", "C"]);
    let loads = calls(&p)
        .iter()
        .filter(|c| matches!(c, Call::Load { .. }))
        .count();
    assert_eq!(loads, 1);
    assert_eq!(p.len(), 3);
}

#[test]
fn next_stops_at_the_last_track() {
    let mut p = player_with(&["A", "B", "C"]);
    assert_eq!(p.current_index(), Some(0));

    p.play_next().unwrap();
    assert_eq!(p.current_index(), Some(1));
    p.play_next().unwrap();
    assert_eq!(p.current_index(), Some(2));
    p.play_next().unwrap();
    assert_eq!(p.current_index(), Some(2));
    assert_eq!(loaded_path(&p), PathBuf::from("/music/C.mp3"));
}

#[test]
fn previous_stops_at_the_first_track() {
    let mut p = player_with(&["A", "B"]);
    let before = calls(&p).len();
    p.play_previous().unwrap();
    assert_eq!(p.current_index(), Some(0));
    assert_eq!(calls(&p).len(), before);
}

#[test]
fn next_and_previous_never_leave_bounds() {
    let mut p = player_with(&["A", "B", "C", "D"]);
    // Deterministic mixed walk, heavy on both ends.
    let steps = "nnnnnnppnpppppppnnnpnnnnnnnppp";
    for s in steps.chars() {
        match s {
            'n' => p.play_next().unwrap(),
            _ => p.play_previous().unwrap(),
        }
        let i = p.current_index().unwrap();
        assert!(i < p.len());
    }
}

#[test]
fn toggle_twice_restores_play_state() {
    let mut p = player_with(&["A", "B", "C"]);
    p.select(2).unwrap();
    let original = p.is_playing();

    p.toggle_play_pause().unwrap();
    assert_ne!(p.is_playing(), original);
    p.toggle_play_pause().unwrap();
    assert_eq!(p.is_playing(), original);

    let tail: Vec<_> = calls(&p).iter().rev().take(2).cloned().collect();
    assert_eq!(tail, vec![Call::Pause, Call::Play]);
}

#[test]
fn play_intent_is_confirmed_by_engine_events() {
    let mut p = player_with(&["A"]);
    let generation = last_generation(&p);

    p.toggle_play_pause().unwrap();
    assert!(p.is_playing());
    assert!(p.intent().is_pending());

    p.handle_event(EngineEvent::Playing { generation }).unwrap();
    assert!(p.intent().confirmed);
    assert!(!p.intent().is_pending());

    p.toggle_play_pause().unwrap();
    assert!(p.intent().is_pending());
    p.handle_event(EngineEvent::Paused { generation }).unwrap();
    assert_eq!(p.intent(), PlayIntent::default());
}

#[test]
fn selection_keeps_phase() {
    let mut p = player_with(&["A", "B", "C"]);

    p.select(1).unwrap();
    assert_eq!(p.phase(), PlayerPhase::Paused);
    assert!(!calls(&p).contains(&Call::Play));

    p.toggle_play_pause().unwrap();
    p.select(2).unwrap();
    assert_eq!(p.phase(), PlayerPhase::Playing);
    assert_eq!(calls(&p).last(), Some(&Call::Play));
    assert_eq!(loaded_path(&p), PathBuf::from("/music/C.mp3"));
}

#[test]
fn selecting_the_current_track_is_a_noop() {
    let mut p = player_with(&["A", "B"]);
    let before = calls(&p).len();
    p.select(0).unwrap();
    assert_eq!(calls(&p).len(), before);
}

#[test]
fn selecting_out_of_range_is_rejected() {
    let mut p = player_with(&["A", "B"]);
    assert_eq!(p.select(5), Err(PlayerError::NoSuchTrack(5)));
    assert_eq!(p.current_index(), Some(0));
}

#[test]
fn retarget_resets_progress() {
    let mut p = player_with(&["A", "B"]);
    let generation = last_generation(&p);
    p.handle_event(EngineEvent::TimeUpdate {
        generation,
        position: Duration::from_secs(50),
    })
    .unwrap();
    assert!((p.progress_percent() - 50.0).abs() < 1e-9);

    p.play_next().unwrap();
    assert_eq!(p.progress_percent(), 0.0);
    assert_eq!(p.position(), Duration::ZERO);
}

#[test]
fn seek_sets_position_and_progress_reads_back() {
    let mut p = player_with(&["A"]);
    let generation = last_generation(&p);

    p.seek_percent(40.0).unwrap();
    let target = Duration::from_secs(40);
    assert_eq!(calls(&p).last(), Some(&Call::Seek(target)));
    assert!((p.progress_percent() - 40.0).abs() < 1e-9);

    // Engine confirms the new position on its next tick.
    p.handle_event(EngineEvent::TimeUpdate {
        generation,
        position: target,
    })
    .unwrap();
    assert!((p.progress_percent() - 40.0).abs() < 1e-6);
}

#[test]
fn seek_clamps_out_of_range_and_non_finite() {
    let mut p = player_with(&["A"]);

    p.seek_percent(150.0).unwrap();
    assert_eq!(calls(&p).last(), Some(&Call::Seek(Duration::from_secs(100))));
    p.seek_percent(f64::NAN).unwrap();
    assert_eq!(calls(&p).last(), Some(&Call::Seek(Duration::ZERO)));
    assert_eq!(p.progress_percent(), 0.0);
}

#[test]
fn seek_without_duration_is_refused() {
    let mut p = PlayerController::new(RecordingEngine::default(), 1.0);
    p.append(track("Silent", 0)).unwrap();
    let generation = last_generation(&p);

    assert!(!p.can_seek());
    assert_eq!(p.seek_percent(50.0), Err(PlayerError::DurationUnknown));
    assert!(!calls(&p).iter().any(|c| matches!(c, Call::Seek(_))));

    // Progress stays a number while the length is unknown.
    p.handle_event(EngineEvent::TimeUpdate {
        generation,
        position: Duration::from_secs(3),
    })
    .unwrap();
    assert_eq!(p.progress_percent(), 0.0);

    // Once the engine reports a length, seeking works and the track learns it.
    p.handle_event(EngineEvent::LoadedMetadata {
        generation,
        duration: Some(Duration::from_secs(10)),
    })
    .unwrap();
    assert!(p.can_seek());
    assert_eq!(p.tracks()[0].duration, Duration::from_secs(10));
    p.seek_percent(50.0).unwrap();
    assert_eq!(calls(&p).last(), Some(&Call::Seek(Duration::from_secs(5))));
}

#[test]
fn relative_seek_moves_from_current_progress() {
    let mut p = player_with(&["A"]);
    p.seek_percent(20.0).unwrap();
    p.seek_by_percent(5.0).unwrap();
    assert!((p.progress_percent() - 25.0).abs() < 1e-9);
    p.seek_by_percent(-40.0).unwrap();
    assert_eq!(p.progress_percent(), 0.0);
}

#[test]
fn ended_advances_and_keeps_playing() {
    let mut p = player_with(&["A", "B"]);
    p.toggle_play_pause().unwrap();
    let generation = last_generation(&p);

    p.handle_event(EngineEvent::Ended { generation }).unwrap();
    assert_eq!(p.current_index(), Some(1));
    assert!(p.is_playing());
    let tail: Vec<_> = calls(&p).iter().rev().take(3).cloned().collect();
    assert_eq!(
        tail,
        vec![
            Call::Play,
            Call::Volume(1.0),
            Call::Load {
                generation: generation + 1,
                path: PathBuf::from("/music/B.mp3")
            },
        ]
    );
}

#[test]
fn ended_on_last_track_stays_and_stops() {
    let mut p = player_with(&["A", "B"]);
    p.select(1).unwrap();
    p.toggle_play_pause().unwrap();
    let generation = last_generation(&p);
    p.handle_event(EngineEvent::Playing { generation }).unwrap();

    assert!(p.handle_event(EngineEvent::Ended { generation }).is_ok());
    assert_eq!(p.current_index(), Some(1));
    assert!(!p.is_playing());
    assert_eq!(p.phase(), PlayerPhase::Paused);
    assert_eq!(p.progress_percent(), 100.0);
}

#[test]
fn stale_events_are_ignored() {
    let mut p = player_with(&["A", "B", "C"]);
    p.toggle_play_pause().unwrap();
    let old = last_generation(&p);
    p.select(1).unwrap();

    p.handle_event(EngineEvent::Ended { generation: old }).unwrap();
    assert_eq!(p.current_index(), Some(1));

    p.handle_event(EngineEvent::TimeUpdate {
        generation: old,
        position: Duration::from_secs(90),
    })
    .unwrap();
    assert_eq!(p.progress_percent(), 0.0);
}

#[test]
fn failure_clears_intent_and_records_error() {
    let mut p = player_with(&["A"]);
    p.toggle_play_pause().unwrap();
    let generation = last_generation(&p);

    p.handle_event(EngineEvent::Failed {
        generation,
        message: "decoder exploded".into(),
    })
    .unwrap();
    assert!(!p.is_playing());
    assert_eq!(p.intent(), PlayIntent::default());
    assert_eq!(p.last_error(), Some("decoder exploded"));

    // A fresh play request clears the error.
    p.toggle_play_pause().unwrap();
    assert_eq!(p.last_error(), None);
}

#[test]
fn volume_applies_now_and_sticks_across_tracks() {
    let mut p = player_with(&["A", "B"]);
    p.set_volume(0.3).unwrap();
    assert_eq!(calls(&p).last(), Some(&Call::Volume(0.3)));

    p.play_next().unwrap();
    let last_volume = calls(&p).iter().rev().find_map(|c| match c {
        Call::Volume(v) => Some(*v),
        _ => None,
    });
    assert_eq!(last_volume, Some(0.3));
    assert_eq!(p.state().volume, 0.3);
}

#[test]
fn volume_is_clamped_and_nan_ignored() {
    let mut p = player_with(&["A"]);
    p.set_volume(1.7).unwrap();
    assert_eq!(p.volume(), 1.0);
    p.change_volume(-2.0).unwrap();
    assert_eq!(p.volume(), 0.0);
    p.set_volume(f32::NAN).unwrap();
    assert_eq!(p.volume(), 0.0);
}

#[test]
fn removing_before_current_shifts_index_without_reload() {
    let mut p = player_with(&["A", "B", "C"]);
    p.select(2).unwrap();
    let before = calls(&p).len();

    let removed = p.remove(0).unwrap();
    assert_eq!(removed.title, "A");
    assert_eq!(p.current_index(), Some(1));
    assert_eq!(p.current_track().unwrap().title, "C");
    assert_eq!(calls(&p).len(), before);
}

#[test]
fn removing_current_retargets_and_keeps_intent() {
    let mut p = player_with(&["A", "B", "C"]);
    p.select(2).unwrap();
    p.toggle_play_pause().unwrap();

    p.remove(2).unwrap();
    assert_eq!(p.current_index(), Some(1));
    assert!(p.is_playing());
    assert_eq!(loaded_path(&p), PathBuf::from("/music/B.mp3"));
    assert_eq!(calls(&p).last(), Some(&Call::Play));
}

#[test]
fn removing_the_only_track_returns_to_idle_and_releases_it() {
    let mut p = player_with(&["A"]);
    let watch = p.tracks()[0].resource.watch();

    let removed = p.remove(0).unwrap();
    assert_eq!(p.phase(), PlayerPhase::Idle);
    assert_eq!(calls(&p).last(), Some(&Call::Unload));
    assert!(!watch.is_released());

    drop(removed);
    assert!(watch.is_released());
}

#[test]
fn removing_out_of_range_is_rejected() {
    let mut p = player_with(&["A"]);
    assert_eq!(p.remove(1).unwrap_err(), PlayerError::NoSuchTrack(1));
}

#[test]
fn engine_gone_is_propagated() {
    let mut p = PlayerController::new(
        RecordingEngine {
            calls: Vec::new(),
            gone: true,
        },
        1.0,
    );
    assert_eq!(p.append(track("A", 10)), Err(PlayerError::EngineGone));
    assert_eq!(p.toggle_play_pause(), Err(PlayerError::EngineGone));
}

#[test]
fn state_snapshot_mirrors_controller() {
    let mut p = player_with(&["A", "B"]);
    p.select(1).unwrap();
    p.toggle_play_pause().unwrap();
    p.set_volume(0.5).unwrap();
    p.seek_percent(25.0).unwrap();

    let s = p.state();
    assert_eq!(s.current_index, Some(1));
    assert!(s.is_playing);
    assert_eq!(s.volume, 0.5);
    assert!((s.progress_percent - 25.0).abs() < 1e-9);
}

#[test]
fn progress_math_never_produces_nan() {
    assert_eq!(progress_percent(Duration::from_secs(5), None), 0.0);
    assert_eq!(progress_percent(Duration::from_secs(5), Some(Duration::ZERO)), 0.0);
    assert_eq!(
        progress_percent(Duration::from_secs(50), Some(Duration::from_secs(40))),
        100.0
    );
    assert_eq!(clamp_percent(f64::INFINITY), 0.0);
    assert_eq!(seek_position(50.0, Duration::from_secs(60)), Duration::from_secs(30));
    assert_eq!(clamp_volume(f32::NAN), None);
}

#[test]
fn times_format_as_minutes_and_padded_seconds() {
    assert_eq!(format_mmss(Duration::from_secs(0)), "0:00");
    assert_eq!(format_mmss(Duration::from_secs(65)), "1:05");
    assert_eq!(format_mmss(Duration::from_millis(754_900)), "12:34");
    assert_eq!(format_mmss_opt(None), "-:--");
}
