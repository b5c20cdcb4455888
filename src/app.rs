//! Application module: view state shared by the TUI and the event loop.
//!
//! The `App` model lives in `app::model` and tracks the list cursor, the
//! add-files prompt and popups. It never touches playback.

mod model;

pub use model::*;
