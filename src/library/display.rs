use std::path::Path;

/// Build a track title from its file name by dropping the last extension.
///
/// `song.mp3` -> `song`, `live.2019.flac` -> `live.2019`. When stripping
/// leaves nothing (a bare `.ogg`), the full file name is kept.
pub fn title_from_path(path: &Path) -> String {
    let Some(name) = path.file_name().map(|s| s.to_string_lossy()) else {
        return "UNKNOWN".to_string();
    };
    let name = name.as_ref();

    let stem = match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => &name[..dot],
        _ => name,
    };

    if stem.trim().is_empty() {
        name.to_string()
    } else {
        stem.to_string()
    }
}
