use std::time::Duration;

use crate::error::PlayerError;
use crate::library::ResourceHandle;

/// The playback engine as seen by the controller.
///
/// Calls are requests: outcomes come back asynchronously as
/// [`EngineEvent`](super::EngineEvent)s tagged with the load generation.
/// An `Err` only means the engine is unreachable.
pub trait AudioEngine {
    fn load(&mut self, generation: u64, resource: &ResourceHandle) -> Result<(), PlayerError>;
    fn unload(&mut self) -> Result<(), PlayerError>;
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn seek(&mut self, position: Duration) -> Result<(), PlayerError>;
    fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError>;
}
