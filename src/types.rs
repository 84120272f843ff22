//! Shared boundary types for the game bridge.
//!
//! This module defines the two key data contracts:
//! - Interpreter → core (rebuilt every frame): `VisualState`, `BoardState`, `SoundState`
//! - Renderer → host canvas (in-memory): `DrawCommand`
//!
//! The interpreter-facing records use camelCase on the wire because the remote
//! game server pushes them as JSON.

use serde::{Deserialize, Serialize};

/// Identity of an object living inside the interpreted program.
pub type Id = String;

// ---------------------------------------------------------------------------
// Interpreter → core
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Grid units, already rounded.
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Milliseconds of frame clock until which `message` stays visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

impl VisualState {
    pub fn at(x: f64, y: f64) -> Self {
        VisualState {
            image: None,
            position: Position { x, y },
            message: None,
            message_time: None,
            text: None,
            text_color: None,
        }
    }

    /// The message to draw this frame, if any. Expiry is strict: a message
    /// whose time equals the clock is already gone.
    pub fn active_message(&self, clock: f64) -> Option<&str> {
        match (&self.message, self.message_time) {
            (Some(message), Some(time)) if time > clock => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    pub cell_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_ground: Option<String>,
    pub ground: String,
    pub width: f64,
    pub height: f64,
}

impl BoardState {
    /// Canvas size in pixels: the grid is rounded before scaling by the cell size.
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width.round() * self.cell_size,
            height: self.height.round() * self.cell_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundStatus {
    Played,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundState {
    pub id: Id,
    pub file: String,
    pub status: SoundStatus,
    pub volume: f64,
    #[serde(rename = "loop")]
    pub looped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: f64,
    pub height: f64,
}

/// A named media file pushed by the remote game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub url: String,
}

/// A media asset resolvable under several lookup paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub possible_paths: Vec<String>,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Renderer → host canvas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Normal,
    Bold,
    Italic,
}

/// One primitive canvas operation, in pixel space with y growing downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawCommand {
    Image {
        /// Key into the host's image table.
        image: String,
        x: f64,
        y: f64,
        /// Stretch target; natural size when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        style: TextStyle,
        h_align: HAlign,
        v_align: VAlign,
        color: String,
        stroke: String,
    },
}

// ---------------------------------------------------------------------------
// Terminal host primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// Parse a canvas colour: `#rrggbb` or one of the basic colour names.
    pub fn parse(css: &str) -> Option<Color> {
        if let Some(hex) = css.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            return Some(Color::Rgb {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
            });
        }
        let named = match css.to_ascii_lowercase().as_str() {
            "black" => NamedColor::Black,
            "red" => NamedColor::Red,
            "green" => NamedColor::Green,
            "yellow" => NamedColor::Yellow,
            "blue" => NamedColor::Blue,
            "magenta" => NamedColor::Magenta,
            "cyan" => NamedColor::Cyan,
            "white" => NamedColor::White,
            _ => return None,
        };
        Some(Color::Named(named))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}
