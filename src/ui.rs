//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, InputMode};
use crate::audio::AudioEngine;
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::Track;
use crate::player::{PlayerController, PlayerPhase, format_mmss, format_mmss_opt};

const EMPTY_HINT: &str = "Add some music to get started";

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text. Step sizes come from config.
fn controls_text(controls: &ControlsSettings) -> String {
    let volume_pct = (controls.volume_step * 100.0).round() as u32;
    [
        "[j/k] up/down".to_string(),
        "[gg/G] top/bottom".to_string(),
        "[enter] play selected".to_string(),
        "[space/p] play/pause".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[H/L] seek -/+{}%", controls.seek_step_percent),
        "[0-9] jump".to_string(),
        format!("[-/+] volume -/+{volume_pct}%"),
        "[a] add".to_string(),
        "[x] remove".to_string(),
        "[K] metadata".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

/// "Title - Artist" for the now-playing line.
fn now_playing_text(track: Option<&Track>) -> String {
    match track {
        Some(t) => format!("{} - {}", t.title, t.artist),
        None => EMPTY_HINT.to_string(),
    }
}

/// One playlist row: marker, title, artist and length.
fn playlist_row_text(track: &Track, current: bool) -> String {
    let marker = if current { "▶" } else { " " };
    format!(
        "{marker} {} - {}  [{}]",
        track.title,
        track.artist,
        format_mmss_opt(track.known_duration())
    )
}

/// Build the time text (elapsed/total/remaining) per `UiSettings`.
fn time_text(elapsed: Duration, total: Option<Duration>, ui: &UiSettings) -> String {
    ui.time_fields
        .iter()
        .map(|f| match f {
            TimeField::Elapsed => format_mmss(elapsed),
            TimeField::Total => format_mmss_opt(total),
            TimeField::Remaining => match total {
                Some(t) => format!("-{}", format_mmss(t.saturating_sub(elapsed))),
                None => format_mmss_opt(None),
            },
        })
        .collect::<Vec<_>>()
        .join(&ui.time_separator)
}

/// Inputs for the status line, gathered so the text can be built without a frame.
struct StatusInfo<'a> {
    phase: PlayerPhase,
    pending: bool,
    volume: f32,
    follow: bool,
    ingesting: usize,
    error: Option<&'a str>,
    message: Option<&'a str>,
}

fn status_text(s: &StatusInfo<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();

    let phase = match s.phase {
        PlayerPhase::Idle => "Idle",
        PlayerPhase::Paused => "Paused",
        PlayerPhase::Playing => "Playing",
    };
    if s.pending {
        parts.push(format!("{phase}…"));
    } else {
        parts.push(phase.to_string());
    }

    parts.push(format!("VOL: {}%", (s.volume * 100.0).round() as u32));

    if s.follow {
        parts.push("CURSOR: Follow".to_string());
    } else {
        parts.push("CURSOR: Free-roam".to_string());
    }

    if s.ingesting > 0 {
        parts.push(format!("Loading {} file(s)", s.ingesting));
    }

    if let Some(e) = s.error {
        parts.push(format!("Error: {e}"));
    } else if let Some(m) = s.message {
        parts.push(m.to_string());
    }

    parts.join(" • ")
}

/// Compute the visible window `(start, end, selected_pos_in_window)` that
/// keeps `selected` centered when the list is taller than `height`.
fn list_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    let selected = selected.min(total.saturating_sub(1));
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width: width.min(r.width),
        height: height.min(r.height),
    }
}

/// Format a duration, rounding up partial seconds, showing total seconds.
/// Zero reads as unknown.
fn format_duration_mmss_ceil(d: Duration) -> String {
    if d.is_zero() {
        return "unknown".to_string();
    }

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }
    format!("{}:{:02} ({}s)", total_secs / 60, total_secs % 60, total_secs)
}

fn metadata_text(track: Option<&Track>) -> String {
    let Some(track) = track else {
        return "No track selected".to_string();
    };
    format!(
        "Title: {}\nArtist: {}\nDuration: {}\nSize: {} KiB\nId: {}\nPath: {}",
        track.title,
        track.artist,
        format_duration_mmss_ceil(track.duration),
        track.resource.len() / 1024,
        track.id,
        track.path().display()
    )
}

/// Render the entire UI into `frame`.
pub fn draw<E: AudioEngine>(
    frame: &mut Frame,
    app: &App,
    player: &PlayerController<E>,
    ingesting: usize,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tapedeck ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Now playing: title line, progress gauge, status line.
    let now_block = Block::bordered().padding(LEFT_PAD).title(" now playing ");
    let inner = now_block.inner(chunks[1]);
    frame.render_widget(now_block, chunks[1]);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let title = Paragraph::new(now_playing_text(player.current_track()))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(title, rows[0]);

    if !player.is_empty() {
        let percent = player.progress_percent();
        let gauge = Gauge::default()
            .ratio((percent / 100.0).clamp(0.0, 1.0))
            .label(time_text(player.position(), player.duration(), ui_settings));
        frame.render_widget(gauge, rows[1]);
    }

    let status = status_text(&StatusInfo {
        phase: player.phase(),
        pending: player.intent().is_pending(),
        volume: player.volume(),
        follow: app.follow_playback,
        ingesting,
        error: player.last_error(),
        message: app.status.as_deref(),
    });
    frame.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), rows[2]);

    // Playlist
    let tracks = player.tracks();
    let list_block = Block::default().borders(Borders::ALL).title(" playlist ");
    if tracks.is_empty() {
        let hint = Paragraph::new(EMPTY_HINT)
            .alignment(Alignment::Center)
            .block(list_block);
        frame.render_widget(hint, chunks[2]);
    } else {
        // Only build ListItems for the visible window.
        let height = chunks[2].height.saturating_sub(2) as usize;
        let (start, end, pos) = list_window(tracks.len(), height, app.cursor);
        let current = player.current_index();

        let items: Vec<ListItem> = (start..end)
            .map(|i| {
                let is_current = Some(i) == current;
                let item = ListItem::new(playlist_row_text(&tracks[i], is_current));
                if is_current {
                    item.style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    item
                }
            })
            .collect();

        let list = List::new(items)
            .block(list_block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(pos));
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Popups stay inside the list area so header/status/footer remain visible.
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 9, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let meta = Paragraph::new(metadata_text(tracks.get(app.cursor)))
            .block(
                Block::default()
                    .padding(LEFT_PAD)
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup_area);
    }

    if app.mode == InputMode::AddFiles {
        let popup_area = centered_rect_sized(72, 5, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let prompt = Paragraph::new(format!("{}_", app.input))
            .block(
                Block::default()
                    .padding(LEFT_PAD)
                    .borders(Borders::ALL)
                    .title(" add files or folders (separate with ;, enter adds, esc cancels) "),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(prompt, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
