use std::io::Write;

use crossterm::{queue, style};

use crate::config::KeyBindings;

/// A piece of a menu item: key hints in `[...]` are bold, the rest is dim.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    Label(&'a str),
}

fn segments(item: &str) -> Vec<Segment<'_>> {
    let mut parts = Vec::new();
    let mut rest = item;
    while !rest.is_empty() {
        let Some(open) = rest.find('[') else {
            parts.push(Segment::Label(rest));
            break;
        };
        if open > 0 {
            parts.push(Segment::Label(&rest[..open]));
        }
        rest = &rest[open..];
        match rest.find(']') {
            Some(close) => {
                parts.push(Segment::Key(&rest[..=close]));
                rest = &rest[close + 1..];
            }
            None => {
                parts.push(Segment::Label(rest));
                break;
            }
        }
    }
    parts
}

pub fn menu_items(bindings: &KeyBindings) -> Vec<String> {
    vec![
        format!("[{}] pause", bindings.pause),
        format!("[{}] mute", bindings.mute),
        format!("[{}] quit", bindings.quit),
    ]
}

/// Print the menu bar items on the current line, two spaces apart.
pub fn print_menu<W: Write>(out: &mut W, items: &[String]) -> anyhow::Result<()> {
    queue!(out, style::Print(" "))?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            queue!(out, style::Print("  "))?;
        }
        for segment in segments(item) {
            let (attribute, text) = match segment {
                Segment::Key(text) => (style::Attribute::Bold, text),
                Segment::Label(text) => (style::Attribute::Dim, text),
            };
            queue!(
                out,
                style::SetAttribute(attribute),
                style::Print(text),
                style::SetAttribute(style::Attribute::Reset),
            )?;
        }
    }
    Ok(())
}
