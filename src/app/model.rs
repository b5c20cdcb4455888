//! Application model types: `App` and `InputMode`.
//!
//! `App` only holds view state (cursor, prompt, popups). Playlist and
//! playback live in `PlayerController`.

use std::path::PathBuf;

use crate::library::expand_home;

/// What keystrokes currently mean.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing paths into the add-files prompt.
    AddFiles,
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    pub cursor: usize,
    pub follow_playback: bool,
    pub mode: InputMode,
    pub input: String,
    pub status: Option<String>,
    pub metadata_window: bool,
    /// First `g` of a `gg` chord was pressed.
    pub pending_g: bool,
}

impl App {
    pub fn new(follow_playback: bool) -> Self {
        Self {
            follow_playback,
            ..Self::default()
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Move the cursor down, wrapping to the top.
    pub fn cursor_down(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor + 1) % len;
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn cursor_up(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = if self.cursor == 0 { len - 1 } else { self.cursor - 1 };
    }

    pub fn cursor_top(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_bottom(&mut self, len: usize) {
        self.cursor = len.saturating_sub(1);
    }

    /// Keep the cursor inside a list of `len` entries (after removals).
    pub fn clamp_cursor(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Move the cursor to the current track when following playback.
    pub fn follow(&mut self, current: Option<usize>) {
        if let (true, Some(i)) = (self.follow_playback, current) {
            self.cursor = i;
        }
    }

    pub fn begin_add(&mut self) {
        self.mode = InputMode::AddFiles;
        self.input.clear();
        self.pending_g = false;
    }

    pub fn cancel_input(&mut self) {
        self.mode = InputMode::Normal;
        self.input.clear();
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    /// Leave the prompt and return the paths typed into it.
    pub fn take_input(&mut self) -> Vec<PathBuf> {
        self.mode = InputMode::Normal;
        let raw = std::mem::take(&mut self.input);
        parse_paths(&raw)
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Split a `;`-separated path list. Blank entries are skipped and
/// surrounding quotes (as pasted by terminals on drag and drop) removed.
pub fn parse_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(';')
        .map(|p| p.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|p| !p.is_empty())
        .map(expand_home)
        .collect()
}
