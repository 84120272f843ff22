//! Player — plays a game in the terminal.
//!
//! `TerminalHost` is the `Host` a `Sketch` runs on: a monotonic clock, a
//! character-grid canvas and silent audio clips. `Player` owns the terminal
//! and the event loop, stepping the sketch at the configured frame rate and
//! forwarding key presses to the game.

pub mod raster;

use std::cell::Cell as Flag;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::{cursor, execute, queue, style, terminal};

use crate::assets::{ImageInfo, Pending};
use crate::config::{GameConfig, matches_binding};
use crate::game::Game;
use crate::menubar::{menu_items, print_menu};
use crate::sketch::{Host, Sketch};
use crate::sound::AudioClip;
use crate::types::{Color, DrawCommand, NamedColor, Resolution, Style};

use raster::CharCanvas;

/// Rows reserved above the canvas for the menu bar.
const CANVAS_OFFSET: u16 = 1;

/// A clip that only tracks what it was asked to do. Terminals have no audio.
#[derive(Debug, Clone)]
pub struct SilentClip {
    url: Rc<str>,
    playing: Rc<Flag<bool>>,
}

impl SilentClip {
    pub fn new(url: &str) -> Self {
        SilentClip {
            url: Rc::from(url),
            playing: Rc::new(Flag::new(false)),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }
}

impl AudioClip for SilentClip {
    fn is_loaded(&self) -> bool {
        true
    }

    fn play(&mut self) {
        log::debug!("play {}", self.url);
        self.playing.set(true);
    }

    fn pause(&mut self) {
        self.playing.set(false);
    }

    fn stop(&mut self) {
        self.playing.set(false);
    }

    fn set_loop(&mut self, _looped: bool) {}

    fn set_volume(&mut self, _volume: f64) {}
}

pub struct TerminalHost {
    started: Instant,
    cell_size: f64,
    canvas: CharCanvas,
}

impl TerminalHost {
    pub fn new(cell_size: f64) -> Self {
        TerminalHost {
            started: Instant::now(),
            cell_size,
            canvas: CharCanvas::new(Resolution::default(), cell_size),
        }
    }

    pub fn canvas(&self) -> &CharCanvas {
        &self.canvas
    }
}

impl Host for TerminalHost {
    type Clip = SilentClip;

    fn millis(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Every image occupies exactly one cell on the character grid.
    fn load_image(&mut self, _url: &str) -> Pending<ImageInfo> {
        Pending::ready(ImageInfo {
            width: self.cell_size,
            height: self.cell_size,
        })
    }

    fn load_sound(&mut self, url: &str) -> SilentClip {
        SilentClip::new(url)
    }

    fn create_canvas(&mut self, size: Resolution) {
        self.canvas = CharCanvas::new(size, self.cell_size);
    }

    fn parent_size(&self) -> Option<Resolution> {
        None
    }

    fn set_display_scale(&mut self, _scale: f64) {}

    fn draw(&mut self, commands: &[DrawCommand]) {
        self.canvas.paint(commands);
    }
}

pub struct Player<G> {
    sketch: Sketch<G, SilentClip>,
    host: TerminalHost,
    config: GameConfig,
}

impl<G: Game> Player<G> {
    pub fn new(game: G, config: GameConfig) -> Result<Self> {
        let cell_size = game.board()?.cell_size;
        Ok(Player {
            sketch: Sketch::new(game, &config),
            host: TerminalHost::new(cell_size),
            config,
        })
    }

    /// Play the game in the terminal.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub fn play(&mut self) -> Result<()> {
        self.sketch.start(&mut self.host)?;

        let (term_w, term_h) = terminal::size()?;
        let need_w = self.host.canvas().width() as u16;
        let need_h = self.host.canvas().height() as u16;
        // +2: one row for menu bar, one row for status bar
        if term_w < need_w || term_h < need_h + 2 {
            self.sketch.unload();
            bail!(
                "Terminal too small: need {}x{}, have {}x{}",
                need_w,
                need_h + 2,
                term_w,
                term_h,
            );
        }

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        // Always restore terminal state.
        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        self.sketch.unload();

        result
    }

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let frame = Duration::from_millis(1000 / u64::from(self.config.frame_rate.max(1)));
        self.render_menubar(stdout)?;

        loop {
            let deadline = Instant::now() + frame;
            if self.sketch.draw(&mut self.host)? {
                self.render_canvas(stdout)?;
            }
            self.render_status(stdout)?;

            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() || !event::poll(remaining)? {
                    break;
                }
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if !self.handle_key(&key)? {
                            return Ok(());
                        }
                    }
                    Event::Resize(_, _) => {
                        execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
                        self.render_menubar(stdout)?;
                    }
                    _ => {}
                }
            }
        }
    }

    /// Returns `false` when the player should quit.
    fn handle_key(&mut self, key: &KeyEvent) -> Result<bool> {
        let bindings = &self.config.key_bindings;
        if matches_binding(&bindings.quit, key) || matches_binding("Ctrl-c", key) {
            return Ok(false);
        }
        if matches_binding(&bindings.pause, key) {
            self.sketch.session_mut().toggle_pause();
        } else if matches_binding(&bindings.mute, key) {
            self.sketch.session_mut().toggle_mute();
        } else if let Some((name, code)) = browser_key(key.code) {
            self.sketch.key_pressed(&name, code)?;
        }
        Ok(true)
    }

    fn render_menubar(&self, stdout: &mut io::Stdout) -> Result<()> {
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
        )?;
        print_menu(stdout, &menu_items(&self.config.key_bindings))?;
        stdout.flush()?;
        Ok(())
    }

    fn render_canvas(&self, stdout: &mut io::Stdout) -> Result<()> {
        for (y, row) in self.host.canvas().rows().iter().enumerate() {
            queue!(stdout, cursor::MoveTo(0, y as u16 + CANVAS_OFFSET))?;
            for cell in row {
                let cs = to_content_style(&cell.style);
                queue!(
                    stdout,
                    style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
                )?;
            }
        }
        stdout.flush()?;
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout) -> Result<()> {
        let status_y = self.host.canvas().height() as u16 + CANVAS_OFFSET;
        let (_, term_h) = terminal::size()?;
        if status_y >= term_h {
            return Ok(());
        }

        let session = self.sketch.session();
        let mut flags = Vec::new();
        if self.sketch.is_stopped() {
            flags.push("game over");
        }
        if session.is_paused() {
            flags.push("paused");
        }
        if session.is_muted() {
            flags.push("muted");
        }
        let status = format!(
            " {:>6.1}s | {} sounds | {} ",
            self.host.millis() / 1000.0,
            session.mixer().len(),
            if flags.is_empty() { "playing".to_string() } else { flags.join(", ") },
        );

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);

        queue!(
            stdout,
            cursor::MoveTo(0, status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        stdout.flush()?;
        Ok(())
    }
}

/// The browser key name and key code a terminal key corresponds to.
pub fn browser_key(code: KeyCode) -> Option<(String, u32)> {
    let key = match code {
        KeyCode::Char(c) if c.is_ascii_digit() => (c.to_string(), c as u32),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => {
            (c.to_string(), c.to_ascii_uppercase() as u32)
        }
        KeyCode::Char(' ') => (" ".to_string(), 32),
        KeyCode::Char('-') => ("-".to_string(), 189),
        KeyCode::Char('+') => ("+".to_string(), 187),
        KeyCode::Char('/') => ("/".to_string(), 191),
        KeyCode::Left => ("ArrowLeft".to_string(), 37),
        KeyCode::Up => ("ArrowUp".to_string(), 38),
        KeyCode::Right => ("ArrowRight".to_string(), 39),
        KeyCode::Down => ("ArrowDown".to_string(), 40),
        KeyCode::Enter => ("Enter".to_string(), 13),
        KeyCode::Backspace => ("Backspace".to_string(), 8),
        KeyCode::Delete => ("Delete".to_string(), 46),
        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}
