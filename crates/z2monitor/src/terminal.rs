//! Terminal I/O
//!
//! Painting dashboard frames with crossterm, plus the stdin/stdout port the
//! acknowledgment session and credential prompts talk through.

use ack_session::LinePort;
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use event_engine::Severity;
use std::io::{self, BufRead, Write};

use crate::credentials::Prompter;
use crate::render::{Segment, Tone};

/// Size used when the terminal cannot be queried (pipes, tests)
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Columns and rows of the controlling terminal
pub fn size() -> (u16, u16) {
    terminal::size().unwrap_or(FALLBACK_SIZE)
}

/// Foreground color and boldness for a tone
pub fn style(tone: Tone) -> (Option<Color>, bool) {
    match tone {
        Tone::Plain => (None, false),
        Tone::Header => (Some(Color::Cyan), true),
        Tone::Severity(severity) => severity_style(severity),
        Tone::Acknowledged => (Some(Color::Green), false),
        Tone::Unacknowledged => (Some(Color::Red), false),
        Tone::Error => (Some(Color::Red), true),
    }
}

fn severity_style(severity: Severity) -> (Option<Color>, bool) {
    match severity {
        Severity::DISASTER => (Some(Color::Red), true),
        Severity::HIGH => (Some(Color::Red), false),
        Severity::WARNING => (Some(Color::Yellow), false),
        Severity::AVERAGE => (Some(Color::Cyan), false),
        _ => (None, false),
    }
}

/// Draw lines, optionally clearing the screen first
pub fn paint<W: Write>(out: &mut W, lines: &[Vec<Segment>], clear: bool) -> io::Result<()> {
    if clear {
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    }
    for line in lines {
        for segment in line {
            let (color, bold) = style(segment.tone);
            if let Some(color) = color {
                queue!(out, SetForegroundColor(color))?;
            }
            if bold {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            queue!(out, Print(&segment.text))?;
            if color.is_some() || bold {
                queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
            }
        }
        queue!(out, Print("\n"))?;
    }
    out.flush()
}

/// Operator port over stdin and stdout
pub struct StdioPort {
    stdin: io::StdinLock<'static>,
    stdout: io::Stdout,
}

impl StdioPort {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin().lock(),
            stdout: io::stdout(),
        }
    }
}

impl Default for StdioPort {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePort for StdioPort {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.stdout, "{}", line)
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        execute!(
            self.stdout,
            SetAttribute(Attribute::Bold),
            Print(prompt),
            SetAttribute(Attribute::Reset)
        )?;

        let mut line = String::new();
        if self.stdin.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}

impl Prompter for StdioPort {
    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        execute!(self.stdout, Print(prompt))?;

        let secret = {
            let _raw = RawMode::enable()?;
            read_hidden()?
        };
        writeln!(self.stdout)?;
        Ok(secret)
    }
}

/// Raw mode for the lifetime of the guard
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Collect key presses until Enter; `None` on Esc or Ctrl-C/Ctrl-D
fn read_hidden() -> io::Result<Option<String>> {
    let mut secret = String::new();
    loop {
        let TermEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(Some(secret)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') | KeyCode::Char('d')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                return Ok(None)
            }
            KeyCode::Char(c) => secret.push(c),
            KeyCode::Backspace => {
                secret.pop();
            }
            _ => {}
        }
    }
}
