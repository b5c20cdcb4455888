//! Playlist entries and how files become them.
//!
//! `model` holds `Track` and the shared `ResourceHandle`, `scan` turns
//! user-supplied paths into files, and `ingest` reads and measures those
//! files on background threads.

mod display;
mod ingest;
mod model;
mod scan;

pub use display::title_from_path;
pub use ingest::{IngestEvent, Ingestor, load_track};
pub use model::*;
pub use scan::{expand, expand_home};
