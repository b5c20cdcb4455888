use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::debug;

/// Artist shown for every track; tags are not read.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

const ID_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Session-unique track identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    /// Draw a fresh random id. Collisions are possible in theory and ignored.
    pub fn generate() -> Self {
        let mut n: u64 = rand::random();
        let mut s = String::with_capacity(ID_LEN);
        for _ in 0..ID_LEN {
            s.push(ID_ALPHABET[(n % 36) as usize] as char);
            n /= 36;
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Resource {
    origin: PathBuf,
    bytes: Box<[u8]>,
}

impl Drop for Resource {
    fn drop(&mut self) {
        debug!(path = %self.origin.display(), bytes = self.bytes.len(), "released audio resource");
    }
}

/// Shared owner of a file's bytes, used by the playlist and the engine.
///
/// The bytes are freed when the last clone goes away: once the track has
/// left the playlist and the engine has moved on to another source.
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<Resource>,
}

impl ResourceHandle {
    pub fn from_bytes(origin: impl Into<PathBuf>, bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            inner: Arc::new(Resource {
                origin: origin.into(),
                bytes: bytes.into(),
            }),
        }
    }

    /// Path the bytes were read from.
    pub fn origin(&self) -> &Path {
        &self.inner.origin
    }

    pub fn len(&self) -> usize {
        self.inner.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bytes.is_empty()
    }

    pub fn watch(&self) -> ResourceWatch {
        ResourceWatch(Arc::downgrade(&self.inner))
    }
}

impl AsRef<[u8]> for ResourceHandle {
    fn as_ref(&self) -> &[u8] {
        &self.inner.bytes
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("origin", &self.inner.origin)
            .field("len", &self.inner.bytes.len())
            .finish()
    }
}

/// Non-owning observer of a `ResourceHandle`.
#[derive(Clone)]
pub struct ResourceWatch(Weak<Resource>);

impl ResourceWatch {
    pub fn is_released(&self) -> bool {
        self.0.strong_count() == 0
    }
}

/// One playable playlist entry.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    /// Zero when neither the container header nor the decoder could tell.
    pub duration: Duration,
    pub resource: ResourceHandle,
}

impl Track {
    pub fn path(&self) -> &Path {
        self.resource.origin()
    }

    /// Duration usable for progress math, if any.
    pub fn known_duration(&self) -> Option<Duration> {
        (!self.duration.is_zero()).then_some(self.duration)
    }
}
