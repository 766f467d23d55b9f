//! Terminal Surface
//!
//! Turns [`ControllerMessage`]s into lines on stdout. Thin client: it
//! prints what the controller sends and remembers only the current preview,
//! so a repeated render can be shown as a refresh.

use inkframe_core::{
    ControllerMessage, GalleryEntry, NotifyLevel, RenderContent, RenderInstruction, RenderSource,
};

/// Width used for the text preview box
pub const DEFAULT_WIDTH: usize = 60;

/// Terminal renderer
#[derive(Debug)]
pub struct Renderer {
    width: usize,
    json: bool,
    current: Option<RenderContent>,
}

impl Renderer {
    /// Plain-text renderer wrapping at `width`
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(20),
            json: false,
            current: None,
        }
    }

    /// Print each message as one JSON line instead
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Lines to print for `msg`
    pub fn apply(&mut self, msg: &ControllerMessage) -> Vec<String> {
        if self.json {
            if let ControllerMessage::Render(r) = msg {
                self.current = Some(r.content.clone());
            }
            return match serde_json::to_string(msg) {
                Ok(line) => vec![line],
                Err(e) => vec![format!("{{\"error\":\"{e}\"}}")],
            };
        }

        match msg {
            ControllerMessage::Render(instruction) => self.render(instruction),
            ControllerMessage::Status(status) => {
                let tag = match status.level {
                    NotifyLevel::Info => "info",
                    NotifyLevel::Success => "ok",
                    NotifyLevel::Warning => "warn",
                    NotifyLevel::Error => "error",
                };
                vec![format!("[{tag}] {}", status.text)]
            }
            ControllerMessage::Gallery { entries } => gallery(entries),
            ControllerMessage::ClearInput { .. } => Vec::new(),
            ControllerMessage::GeneratedImage { url } => vec![format!("generated: {url}")],
            ControllerMessage::MetArt(art) => {
                vec![format!("museum: \"{}\" by {} ({})", art.title, art.artist, art.image.url)]
            }
            ControllerMessage::Stopped => vec!["stopped".to_string()],
        }
    }

    fn render(&mut self, instruction: &RenderInstruction) -> Vec<String> {
        let refreshed = self.current.as_ref() == Some(&instruction.content);
        let source = match instruction.source {
            RenderSource::Staged => "staged",
            RenderSource::Idle => "idle",
        };
        let mut lines = vec![format!(
            "── #{} {} {}{} ──",
            instruction.seq,
            source,
            instruction.issued_at.format("%H:%M:%S"),
            if refreshed { " (refresh)" } else { "" }
        )];

        match &instruction.content {
            RenderContent::Text { message } => lines.extend(self.boxed(message)),
            RenderContent::Image { url } => lines.push(format!("image: {url}")),
            RenderContent::Weather { summary, url } => {
                if let Some(summary) = summary {
                    lines.extend(self.boxed(summary));
                }
                if let Some(url) = url {
                    lines.push(format!("weather: {url}"));
                }
                if summary.is_none() && url.is_none() {
                    lines.push("weather".to_string());
                }
            }
            RenderContent::IdleArt { url } => lines.push(format!("idle art: {url}")),
            RenderContent::NoIdleArt => lines.push("No idle art".to_string()),
        }

        self.current = Some(instruction.content.clone());
        lines
    }

    /// Text in a simple frame, wrapped to the renderer width
    fn boxed(&self, text: &str) -> Vec<String> {
        let inner = self.width - 4;
        let mut lines = vec![format!("┌{}┐", "─".repeat(inner + 2))];
        for paragraph in text.lines() {
            for line in textwrap::wrap(paragraph, inner) {
                let pad = inner.saturating_sub(textwrap::core::display_width(&line));
                lines.push(format!("│ {line}{} │", " ".repeat(pad)));
            }
        }
        lines.push(format!("└{}┘", "─".repeat(inner + 2)));
        lines
    }
}

fn gallery(entries: &[GalleryEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["gallery: empty".to_string()];
    }
    let mut lines = vec![format!("gallery ({}):", entries.len())];
    lines.extend(
        entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("  {:>2}. {}", i + 1, e.filename)),
    );
    lines
}
