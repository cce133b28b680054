use anyhow::{Context, Result};
use crossterm::{
    cursor, execute, queue,
    style::Print,
    terminal::{self, ClearType},
};
use std::io::{self, Write};

/// Where rendered frames go. `clear` wipes the display when a chart session
/// starts; `present` replaces the previously presented frame.
pub trait Screen: Send {
    fn clear(&mut self) -> Result<()>;
    fn present(&mut self, frame: &str) -> Result<()>;
}

/// Crossterm screen that rewrites its output in place: each `present` moves
/// the cursor back over the previous frame and redraws from there. Lines end
/// with `\r\n` since the console runs in raw mode.
#[derive(Debug, Clone, Default)]
pub struct LiveScreen {
    drawn_lines: u16,
}

impl LiveScreen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Screen for LiveScreen {
    fn clear(&mut self) -> Result<()> {
        let mut out = io::stdout();
        execute!(out, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))
            .context("clear screen")?;
        self.drawn_lines = 0;
        Ok(())
    }

    fn present(&mut self, frame: &str) -> Result<()> {
        let mut out = io::stdout();
        queue!(out, cursor::MoveToColumn(0))?;
        if self.drawn_lines > 0 {
            queue!(out, cursor::MoveUp(self.drawn_lines))?;
        }
        queue!(out, terminal::Clear(ClearType::FromCursorDown))?;

        let mut lines = 0u16;
        for line in frame.lines() {
            queue!(out, Print(line), Print("\r\n"))?;
            lines = lines.saturating_add(1);
        }
        out.flush().context("flush frame")?;
        self.drawn_lines = lines;
        Ok(())
    }
}
