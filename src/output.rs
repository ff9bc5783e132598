use crossterm::style::{style, Color, Stylize};
use std::fmt;
use std::io::{IsTerminal, Write};

/// Color of a console segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    White,
    Gray,
    Green,
    Red,
    Yellow,
    Cyan,
    Magenta,
}

impl Tone {
    /// Build a segment of this tone.
    pub fn text(self, text: impl Into<String>) -> Segment {
        Segment {
            text: text.into(),
            tone: self,
        }
    }

    fn color(self) -> Color {
        match self {
            Tone::White => Color::White,
            Tone::Gray => Color::DarkGrey,
            Tone::Green => Color::Green,
            Tone::Red => Color::Red,
            Tone::Yellow => Color::Yellow,
            Tone::Cyan => Color::Cyan,
            Tone::Magenta => Color::Magenta,
        }
    }
}

/// One colored piece of a console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub tone: Tone,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Join segments into an uncolored line.
pub fn plain(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Abstraction over operator-facing output.
///
/// Orchestration code writes status lines through this trait instead of
/// `println!` so tests can record them and quiet contexts can drop them.
/// Internal diagnostics go through `tracing` instead.
pub trait Console: Send + Sync {
    /// A status line made of alternating text/color segments.
    fn log(&self, segments: &[Segment]);

    /// A separator line between groups of messages.
    fn separator(&self);
}

/// Standard CLI output: timestamped lines on stdout, colored when stdout is a
/// terminal and `NO_COLOR` is unset.
pub struct TerminalConsole {
    // Concurrent supervisors log at the same time; keep lines whole.
    lock: parking_lot::Mutex<()>,
    color: bool,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self {
            lock: parking_lot::Mutex::new(()),
            color: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn timestamp() -> String {
        format!("[{}]", chrono::Local::now().format("%I:%M:%S %p"))
    }
}

impl Console for TerminalConsole {
    fn log(&self, segments: &[Segment]) {
        let (stamp, line) = if self.color {
            let line = segments
                .iter()
                .map(|s| style(s.text.as_str()).with(s.tone.color()).to_string())
                .collect::<Vec<_>>()
                .join(" ");
            (style(Self::timestamp()).dark_grey().to_string(), line)
        } else {
            (Self::timestamp(), plain(segments))
        };

        let _guard = self.lock.lock();
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{} {}", stamp, line).ok();
    }

    fn separator(&self) {
        let line = format!("{} --------------------", Self::timestamp());
        let line = if self.color {
            style(line).dark_grey().to_string()
        } else {
            line
        };

        let _guard = self.lock.lock();
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line).ok();
    }
}

/// Suppresses all output.
pub struct QuietConsole;

impl Console for QuietConsole {
    fn log(&self, _segments: &[Segment]) {}
    fn separator(&self) {}
}
