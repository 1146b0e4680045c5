//! Status presenter
//! Single owner of everything the user sees: status lines, the view mode,
//! the selected-file label and the admin input.

use std::io::Write;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::session::ViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Colors from the page palette, as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub background: &'static str,
    pub foreground: &'static str,
    pub border: &'static str,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        }
    }

    pub fn style(&self) -> StatusStyle {
        match self {
            Severity::Success => StatusStyle {
                background: "#e6f7e6",
                foreground: "#2b7a0b",
                border: "#2b7a0b",
            },
            Severity::Error => StatusStyle {
                background: "#ffe6e6",
                foreground: "#b00020",
                border: "#b00020",
            },
            Severity::Warning => StatusStyle {
                background: "#fff4e6",
                foreground: "#b76b00",
                border: "#b76b00",
            },
            Severity::Info => StatusStyle {
                background: "#e6f0ff",
                foreground: "#1a1a1a",
                border: "#667eea",
            },
        }
    }
}

/// The document status area and the admin panel's own status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Main,
    Admin,
}

/// Formats a main-channel status line.
pub fn render_status(message: &str, severity: Severity) -> String {
    format!("{} {}", severity.icon(), message)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub channel: Channel,
    pub severity: Severity,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

pub trait StatusPresenter: Send {
    fn show(&mut self, channel: Channel, message: &str, severity: Severity);

    fn render_view(&mut self, view: &ViewModel);

    fn show_file_label(&mut self, label: &str);

    fn clear_admin_input(&mut self);

    fn status(&mut self, message: &str, severity: Severity) {
        self.show(Channel::Main, message, severity);
    }

    fn admin_status(&mut self, message: &str) {
        self.show(Channel::Admin, message, Severity::Info);
    }
}

/// Records everything shown; backs the JSON report and the tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryPresenter {
    pub entries: Vec<StatusEntry>,
    pub view: Option<ViewModel>,
    pub file_label: Option<String>,
    pub admin_input_cleared: usize,
}

impl MemoryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self, channel: Channel) -> Option<&StatusEntry> {
        self.entries.iter().rev().find(|e| e.channel == channel)
    }

    pub fn on(&self, channel: Channel) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(move |e| e.channel == channel)
    }
}

impl StatusPresenter for MemoryPresenter {
    fn show(&mut self, channel: Channel, message: &str, severity: Severity) {
        let text = match channel {
            Channel::Main => render_status(message, severity),
            Channel::Admin => message.to_string(),
        };
        self.entries.push(StatusEntry {
            channel,
            severity,
            text,
            timestamp: Utc::now(),
        });
    }

    fn render_view(&mut self, view: &ViewModel) {
        self.view = Some(view.clone());
    }

    fn show_file_label(&mut self, label: &str) {
        self.file_label = Some(label.to_string());
    }

    fn clear_admin_input(&mut self) {
        self.admin_input_cleared += 1;
    }
}

/// `#rrggbb` to channels; anything else is black.
fn hex_rgb(color: &str) -> (u8, u8, u8) {
    let digits = match color.strip_prefix('#') {
        Some(d) if d.len() == 6 && d.bytes().all(|b| b.is_ascii_hexdigit()) => d,
        _ => return (0, 0, 0),
    };
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
    (channel(0), channel(2), channel(4))
}

fn paint(text: &str, color: &str) -> ColoredString {
    let (r, g, b) = hex_rgb(color);
    text.truecolor(r, g, b).bold()
}

/// Writes styled status lines to a terminal and keeps a history.
pub struct TerminalPresenter<Out: Write + Send> {
    out: Out,
    history: MemoryPresenter,
}

impl TerminalPresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<Out: Write + Send> TerminalPresenter<Out> {
    pub fn new(out: Out) -> Self {
        Self {
            out,
            history: MemoryPresenter::new(),
        }
    }

    pub fn history(&self) -> &[StatusEntry] {
        &self.history.entries
    }

    fn line(&mut self, text: impl std::fmt::Display) {
        // Presentation has no error path; a closed stdout loses the line.
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<Out: Write + Send> StatusPresenter for TerminalPresenter<Out> {
    fn show(&mut self, channel: Channel, message: &str, severity: Severity) {
        self.history.show(channel, message, severity);
        let style = severity.style();
        match channel {
            Channel::Main => {
                let rendered = render_status(message, severity);
                let painted = paint(&rendered, style.foreground);
                self.line(painted);
            }
            Channel::Admin => {
                let painted = paint(message, style.foreground);
                self.line(format!("[admin] {}", painted));
            }
        }
    }

    fn render_view(&mut self, view: &ViewModel) {
        self.history.render_view(view);
        let label = paint(&format!("[ {} ]", view.submit_label), view.accent);
        self.line(label);
        if view.admin_panel_visible {
            self.line("Admin controls: add-admin <address>");
        }
    }

    fn show_file_label(&mut self, label: &str) {
        self.history.show_file_label(label);
        self.line(label);
    }

    fn clear_admin_input(&mut self) {
        self.history.clear_admin_input();
    }
}
