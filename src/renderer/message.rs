//! Speech bubbles for transient visual messages.
//!
//! A bubble sits above its visual's anchor and is pushed back inside the
//! canvas when it would overflow. The bubble image is picked so its tail
//! keeps pointing at the visual: `speech.png` for the default placement,
//! `speech2.png` when pushed left, `speech3.png` when pushed down and
//! `speech4.png` when pushed both ways.

use crate::types::{DrawCommand, HAlign, Resolution, TextStyle, VAlign};

pub const MESSAGE_TEXT_SIZE: f64 = 14.0;
const MESSAGE_TEXT_COLOR: &str = "black";
const MESSAGE_MAX_CHARS: usize = 24;
const CHAR_WIDTH: f64 = MESSAGE_TEXT_SIZE * 0.6;
const LINE_HEIGHT: f64 = MESSAGE_TEXT_SIZE * 1.2;
const PADDING: f64 = 8.0;
const TAIL: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawableMessage {
    pub message: String,
    /// Pixel anchor of the visual that speaks.
    pub x: f64,
    pub y: f64,
}

pub fn draw_message(
    commands: &mut Vec<DrawCommand>,
    message: &DrawableMessage,
    canvas: Resolution,
) {
    let lines = wrap_message(&message.message, MESSAGE_MAX_CHARS);
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = longest as f64 * CHAR_WIDTH + 2.0 * PADDING;
    let height = lines.len() as f64 * LINE_HEIGHT + 2.0 * PADDING + TAIL;

    let mut x = message.x;
    let mut y = message.y - height;
    let pushed_left = x + width > canvas.width;
    if pushed_left {
        x = (canvas.width - width).max(0.0);
    }
    let pushed_down = y < 0.0;
    if pushed_down {
        y = 0.0;
    }

    let bubble = match (pushed_left, pushed_down) {
        (false, false) => "speech.png",
        (true, false) => "speech2.png",
        (false, true) => "speech3.png",
        (true, true) => "speech4.png",
    };
    commands.push(DrawCommand::Image {
        image: bubble.to_string(),
        x,
        y,
        width: Some(width),
        height: Some(height),
    });

    // The tail eats the bottom of the bubble unless it points upward.
    let text_top = if pushed_down { y + TAIL + PADDING } else { y + PADDING };
    for (i, line) in lines.into_iter().enumerate() {
        commands.push(DrawCommand::Text {
            text: line,
            x: x + PADDING,
            y: text_top + i as f64 * LINE_HEIGHT,
            size: MESSAGE_TEXT_SIZE,
            style: TextStyle::Normal,
            h_align: HAlign::Left,
            v_align: VAlign::Top,
            color: MESSAGE_TEXT_COLOR.to_string(),
            stroke: MESSAGE_TEXT_COLOR.to_string(),
        });
    }
}

/// Word-wrap a message to `width` characters.
///
/// Breaks happen at spaces, and the space at a break is consumed. A word
/// longer than `width` is hard-broken. Explicit newlines are kept.
pub fn wrap_message(message: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for line in message.split('\n') {
        let mut row = String::new();
        for word in line.split(' ').filter(|w| !w.is_empty()) {
            let mut word: Vec<char> = word.chars().collect();
            let row_len = row.chars().count();

            if row_len > 0 && row_len + 1 + word.len() <= width {
                row.push(' ');
                row.extend(word.iter());
                continue;
            }
            if row_len > 0 {
                rows.push(std::mem::take(&mut row));
            }
            while word.len() > width {
                rows.push(word.drain(..width).collect());
            }
            row.extend(word.iter());
        }
        rows.push(row);
    }

    rows
}
