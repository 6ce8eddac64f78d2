//! Terminal surfaces: progress bar and message lines on stderr

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    tty::IsTty,
};
use splice_core::{Notifier, ProgressSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Partial block characters, from empty to full.
const PROGRESS_CHARS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
const BAR_WIDTH: usize = 30;

const DIM: Color = Color::Rgb { r: 140, g: 140, b: 140 };
const TEXT: Color = Color::Rgb { r: 180, g: 180, b: 180 };
const ALERT: Color = Color::Rgb { r: 230, g: 120, b: 110 };

#[derive(Default)]
struct BarState {
    title: String,
    percent: i32,
    active: bool,
}

/// A wrapping progress bar drawn on a single stderr line.
///
/// Nothing is drawn when stderr is not a terminal.
pub struct TerminalProgress {
    state: Mutex<BarState>,
    interactive: bool,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BarState::default()),
            interactive: io::stderr().is_tty(),
        }
    }

    fn render(&self, state: &BarState) {
        if !self.interactive {
            return;
        }
        let bar = render_bar(state.percent, BAR_WIDTH);
        let _ = execute!(
            io::stderr(),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(DIM),
            Print("  "),
            Print(&bar),
            Print(" "),
            SetForegroundColor(TEXT),
            Print(&state.title),
            ResetColor
        );
        let _ = io::stderr().flush();
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn begin(&self, title: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.title = title.to_string();
        state.percent = 0;
        state.active = true;
        if self.interactive {
            let _ = execute!(io::stderr(), Hide);
        }
        self.render(&state);
    }

    fn report(&self, increment: i32) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !state.active {
            return;
        }
        state.percent = (state.percent + increment).clamp(0, 100);
        self.render(&state);
    }

    fn finish(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !std::mem::take(&mut state.active) {
            return;
        }
        if self.interactive {
            let _ = execute!(
                io::stderr(),
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Show
            );
        }
    }
}

/// Bar of `width` cells filled to `percent`, using partial blocks for the edge cell.
fn render_bar(percent: i32, width: usize) -> String {
    let filled = f64::from(percent.clamp(0, 100)) * width as f64 / 100.0;
    let full_cells = filled as usize;
    let partial = (filled.fract() * 8.0) as usize;

    (0..width)
        .map(|i| {
            if i < full_cells {
                '█'
            } else if i == full_cells && partial > 0 {
                PROGRESS_CHARS[partial]
            } else {
                '░'
            }
        })
        .collect()
}

/// Prints `  + message` and `  ! message` lines to stderr.
pub struct StderrNotifier;

impl StderrNotifier {
    fn line(&self, marker: &str, color: Color, message: &str) {
        let mut err = io::stderr();
        if err.is_tty() {
            let _ = execute!(
                err,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                SetForegroundColor(color),
                Print(format!("  {} ", marker)),
                SetForegroundColor(TEXT),
                Print(message),
                ResetColor,
                Print("\n")
            );
        } else {
            let _ = writeln!(err, "  {} {}", marker, message);
        }
    }
}

impl Notifier for StderrNotifier {
    fn info(&self, message: &str) {
        self.line("+", DIM, message);
    }

    fn error(&self, message: &str) {
        self.line("!", ALERT, message);
    }
}
