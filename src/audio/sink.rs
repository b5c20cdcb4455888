//! Utilities for creating `rodio` sinks from in-memory resources.
//!
//! The helper here encapsulates decoding a `ResourceHandle` and preparing a
//! paused `Sink` at the requested start position.

use std::io::Cursor;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::EngineError;
use crate::library::ResourceHandle;

/// Create a paused `Sink` for `resource` that starts playback at `start_at`.
///
/// Also returns the total length reported by the decoder, when the format
/// exposes one.
pub(super) fn create_sink_at(
    handle: &OutputStream,
    resource: &ResourceHandle,
    start_at: Duration,
    volume: f32,
) -> Result<(Sink, Option<Duration>), EngineError> {
    let decoder = Decoder::new(Cursor::new(resource.clone()))?;
    let total = decoder.total_duration();
    // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(handle.mixer());
    sink.set_volume(volume);
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
