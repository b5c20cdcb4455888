use std::path::Path;

use crate::config;

/// Load settings, falling back to defaults when the file is unreadable or invalid.
///
/// Runs before logging is set up, so problems go to stderr.
pub fn load_settings(explicit: Option<&Path>) -> config::Settings {
    let loaded = match explicit {
        Some(path) => config::Settings::load_from(Some(path)),
        None => config::Settings::load(),
    };

    match loaded {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("tapedeck: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("tapedeck: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
