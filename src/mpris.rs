//! MPRIS D-Bus service so media keys and `playerctl` can drive the player.
//!
//! The service runs on its own thread. It only forwards `ControlCmd`s into
//! the event loop and reads a shared snapshot the event loop keeps current.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, interface, object_server::InterfaceRef};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::PlayerPhase;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.tapedeck";
const TRACK_PATH_PREFIX: &str = "/org/mpris/MediaPlayer2/track/";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    SetVolume(f64),
}

#[derive(Debug, PartialEq)]
struct SharedState {
    playback: PlayerPhase,
    title: Option<String>,
    artist: Vec<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    volume: f64,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            playback: PlayerPhase::Idle,
            title: None,
            artist: Vec::new(),
            url: None,
            length_micros: None,
            track_id: None,
            volume: 1.0,
        }
    }
}

/// Which properties changed since the service last emitted signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Changed {
    Playback,
    Metadata,
    Volume,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Changed>,
}

impl MprisHandle {
    /// Publish the current track. `None` clears the metadata.
    pub fn set_track_metadata(&self, track: Option<&Track>) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        let title = track.map(|t| t.title.clone());
        let track_id = track.and_then(|t| {
            ObjectPath::try_from(format!("{TRACK_PATH_PREFIX}{}", t.id))
                .ok()
                .map(OwnedObjectPath::from)
        });
        let length_micros = track
            .and_then(Track::known_duration)
            .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX));
        if s.title == title && s.track_id == track_id && s.length_micros == length_micros {
            return;
        }

        s.title = title;
        s.track_id = track_id;
        s.length_micros = length_micros;
        s.artist = track.map(|t| vec![t.artist.clone()]).unwrap_or_default();
        s.url = track.map(|t| format!("file://{}", t.path().display()));
        drop(s);
        let _ = self.notify.send(Changed::Metadata);
    }

    pub fn set_playback(&self, playback: PlayerPhase) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        if s.playback != playback {
            s.playback = playback;
            drop(s);
            let _ = self.notify.send(Changed::Playback);
        }
    }

    pub fn set_volume(&self, volume: f64) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        if (s.volume - volume).abs() > f64::EPSILON {
            s.volume = volume;
            drop(s);
            let _ = self.notify.send(Changed::Volume);
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "tapedeck"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        ["audio/mpeg", "audio/flac", "audio/wav", "audio/ogg"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn owned<'a>(v: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(v.into()).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    /// Rewinds and pauses. The player has no separate stopped phase, so
    /// `PlaybackStatus` reads `Paused` afterwards and `Stopped` only when
    /// the playlist is empty.
    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlayerPhase::Idle => "Stopped",
            PlayerPhase::Playing => "Playing",
            PlayerPhase::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(1.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(volume));
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Option<OwnedValue>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };

        put(
            "mpris:trackid",
            s.track_id.clone().and_then(|p| owned(Value::from(p))),
        );
        put("xesam:title", s.title.clone().and_then(owned));
        if !s.artist.is_empty() {
            put("xesam:artist", owned(s.artist.clone()));
        }
        put("xesam:url", s.url.clone().and_then(owned));
        put("mpris:length", s.length_micros.and_then(owned));
        map
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>, enabled: bool) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, changes) = mpsc::channel::<Changed>();

    if !enabled {
        info!("MPRIS disabled");
        return MprisHandle { state, notify };
    }

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, changes).await {
                warn!("MPRIS: {e}");
            }
        });
    });

    MprisHandle { state, notify }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    changes: Receiver<Changed>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    info!(name = BUS_NAME, "MPRIS service registered");

    let player: InterfaceRef<PlayerIface> = object_server.interface(OBJECT_PATH).await?;

    // Forward change notices as PropertiesChanged signals.
    loop {
        Timer::after(Duration::from_millis(200)).await;

        let mut pending: Vec<Changed> = Vec::new();
        loop {
            match changes.try_recv() {
                Ok(c) if !pending.contains(&c) => pending.push(c),
                Ok(_) => {}
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    debug!("MPRIS: handle dropped, stopping");
                    return Ok(());
                }
            }
        }
        if pending.is_empty() {
            continue;
        }

        let iface = player.get().await;
        let emitter = player.signal_emitter();
        for c in pending {
            let res = match c {
                Changed::Playback => iface.playback_status_changed(emitter).await,
                Changed::Metadata => iface.metadata_changed(emitter).await,
                Changed::Volume => iface.volume_changed(emitter).await,
            };
            if let Err(e) = res {
                debug!("MPRIS: failed to emit {c:?}: {e}");
            }
        }
    }
}
