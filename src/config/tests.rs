use super::load::{default_config_path, default_log_dir, resolve_config_path};
use super::schema::*;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_tapedeck_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("TAPEDECK_CONFIG_PATH", "/tmp/tapedeck-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/tapedeck-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home")
            .join("tapedeck")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("tapedeck")
            .join("config.toml")
    );
}

#[test]
fn log_dir_follows_xdg_state_home_then_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/state");
    assert_eq!(default_log_dir().unwrap(), PathBuf::from("/tmp/state/tapedeck"));

    let _g2 = EnvGuard::remove("XDG_STATE_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_log_dir().unwrap(),
        PathBuf::from("/tmp/home-dir/.local/state/tapedeck")
    );
}

#[test]
fn explicit_log_directory_wins() {
    let s = Settings {
        log: LogSettings {
            directory: Some(PathBuf::from("/var/tmp/td")),
            ..LogSettings::default()
        },
        ..Settings::default()
    };
    assert_eq!(s.log_directory(), PathBuf::from("/var/tmp/td"));
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
crossfade_ms = 120
crossfade_steps = 3
quit_fade_out_ms = 0
tick_ms = 100

[playback]
volume = 0.4

[controls]
seek_step_percent = 10.0
volume_step = 0.1

[ui]
follow_playback = false
header_text = "hello"
time_fields = ["elapsed", "remaining"]
time_separator = " | "

[ingest]
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false

[log]
directory = "/tmp/td-logs"
level = "debug"

[mpris]
enabled = false
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::remove("TAPEDECK__AUDIO__CROSSFADE_MS");

    let s = Settings::load_from(Some(&cfg_path)).unwrap();
    assert_eq!(s.audio.crossfade_ms, 120);
    assert_eq!(s.audio.crossfade_steps, 3);
    assert_eq!(s.audio.quit_fade_out_ms, 0);
    assert_eq!(s.audio.tick_ms, 100);
    assert!((s.playback.volume - 0.4).abs() < f32::EPSILON);
    assert!((s.controls.seek_step_percent - 10.0).abs() < f64::EPSILON);
    assert!((s.controls.volume_step - 0.1).abs() < f32::EPSILON);
    assert!(!s.ui.follow_playback);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.time_fields, vec![TimeField::Elapsed, TimeField::Remaining]);
    assert_eq!(s.ui.time_separator, " | ");
    assert_eq!(s.ingest.extensions, vec!["mp3".to_string()]);
    assert!(!s.ingest.recursive);
    assert!(!s.ingest.include_hidden);
    assert!(!s.ingest.follow_links);
    assert_eq!(s.log.directory, Some(PathBuf::from("/tmp/td-logs")));
    assert_eq!(s.log.level, "debug");
    assert!(!s.mpris.enabled);
    assert!(s.validate().is_ok());
}

#[test]
fn missing_config_file_yields_defaults() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();

    let s = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(s.audio.tick_ms, AudioSettings::default().tick_ms);
    assert!((s.playback.volume - 1.0).abs() < f32::EPSILON);
    assert!(s.mpris.enabled);
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
crossfade_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TAPEDECK__AUDIO__CROSSFADE_MS", "0");

    let s = Settings::load_from(Some(&cfg_path)).unwrap();
    assert_eq!(s.audio.crossfade_ms, 0);
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.playback.volume = 1.5;
    assert!(s.validate().is_err());
    s.playback.volume = 0.5;

    s.audio.crossfade_steps = 0;
    assert!(s.validate().is_err());
    s.audio.crossfade_steps = 1;

    s.controls.seek_step_percent = 0.0;
    assert!(s.validate().is_err());
    s.controls.seek_step_percent = 5.0;

    s.audio.tick_ms = 0;
    assert!(s.validate().is_err());
}

#[test]
fn effective_settings_render_as_toml() {
    let text = Settings::default().to_toml().unwrap();
    assert!(text.contains("[audio]"));
    assert!(text.contains("tick_ms = 200"));
    assert!(text.contains("\"elapsed\""));
}
