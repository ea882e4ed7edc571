use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use std::time::Duration;

pub const TICK_MS: u64 = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb
{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const GREEN: Rgb = Rgb { r: 0, g: 200, b: 90 };
pub const RED: Rgb = Rgb { r: 230, g: 60, b: 60 };
pub const YELLOW: Rgb = Rgb { r: 255, g: 215, b: 0 };
pub const BLUE: Rgb = Rgb { r: 80, g: 140, b: 255 };
pub const GRAY: Rgb = Rgb { r: 130, g: 130, b: 130 };

/// Raw mode and the alternate screen for as long as the guard lives.
pub struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    pub fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    pub fn stdout(&mut self) -> &mut Stdout
    {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// A key press, reduced to what the games react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input
{
    Char(char),
    Backspace,
    Enter,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Quit,
}

/// Drains every pending key event without blocking.
pub fn poll_inputs() -> io::Result<Vec<Input>>
{
    let mut inputs = Vec::new();
    while event::poll(Duration::from_millis(0))? {
        if let Event::Key(key) = event::read()? {
            if let Some(input) = translate(key) {
                inputs.push(input);
            }
        }
    }
    Ok(inputs)
}

fn translate(key: KeyEvent) -> Option<Input>
{
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let KeyEvent { code, modifiers, .. } = key;
    let input = match code {
        KeyCode::Esc => Input::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Input::Quit,
        KeyCode::Backspace => Input::Backspace,
        KeyCode::Enter => Input::Enter,
        KeyCode::Tab => Input::Tab,
        KeyCode::Up => Input::Up,
        KeyCode::Down => Input::Down,
        KeyCode::Left => Input::Left,
        KeyCode::Right => Input::Right,
        KeyCode::Char(ch) => Input::Char(ch),
        _ => return None,
    };
    Some(input)
}

pub fn draw_lines(stdout: &mut Stdout, lines: &[String]) -> io::Result<()>
{
    let output = format!("{}\r\n", lines.join("\r\n"));
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    stdout.write_all(output.as_bytes())?;
    stdout.flush()
}

/// Blocks until SPACE (returns `true`) or a quit key (returns `false`).
pub fn wait_for_space() -> io::Result<bool>
{
    while event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match translate(key) {
                    Some(Input::Char(' ')) => return Ok(true),
                    Some(Input::Quit) => return Ok(false),
                    _ => {}
                }
            }
        }
    }
}

pub fn paint(text: &str, color: Rgb) -> String
{
    format!(
        "\x1b[38;2;{};{};{}m{}\x1b[0m",
        color.r, color.g, color.b, text
    )
}

/// Background-filled tile, the way letter cells are drawn.
pub fn tile(text: &str, background: Rgb) -> String
{
    format!(
        "\x1b[48;2;{};{};{}m {} \x1b[0m",
        background.r, background.g, background.b, text
    )
}

pub fn format_clock(duration: Duration) -> String
{
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `width` cells filled in proportion to `left / total`.
pub fn time_bar(left: Duration, total: Duration, width: usize) -> String
{
    let filled = if total.is_zero() {
        0
    } else {
        let ratio = (left.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0);
        (ratio * width as f64).ceil() as usize
    };
    let color = if filled * 4 <= width { RED } else if filled * 2 <= width { YELLOW } else { GREEN };
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(width - filled.min(width)));
    paint(&bar, color)
}
