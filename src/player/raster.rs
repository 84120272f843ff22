//! Character-grid rasteriser for canvas draw commands.
//!
//! Each board cell becomes two terminal columns by one row, which keeps
//! cells roughly square in most terminal fonts.

use crate::assets::PLACEHOLDER_IMAGE;
use crate::types::{
    Cell, Color, DrawCommand, HAlign, NamedColor, Resolution, Style, TextStyle, VAlign,
};

pub const COLUMNS_PER_CELL: usize = 2;

const GROUND: char = '·';
const SPEECH_PREFIX: &str = "speech";

pub struct CharCanvas {
    grid: Vec<Vec<Cell>>,
    px_per_col: f64,
    px_per_row: f64,
}

impl CharCanvas {
    pub fn new(size: Resolution, cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let columns = (size.width / cell_size).ceil().max(0.0) as usize * COLUMNS_PER_CELL;
        let rows = (size.height / cell_size).ceil().max(0.0) as usize;
        CharCanvas {
            grid: vec![vec![Cell::default(); columns]; rows],
            px_per_col: cell_size / COLUMNS_PER_CELL as f64,
            px_per_row: cell_size,
        }
    }

    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    pub fn row_text(&self, row: usize) -> String {
        self.grid
            .get(row)
            .map(|cells| cells.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Repaint the whole grid from one frame's commands.
    pub fn paint(&mut self, commands: &[DrawCommand]) {
        for row in self.grid.iter_mut() {
            row.fill(Cell::default());
        }
        for command in commands {
            match command {
                DrawCommand::Image {
                    image,
                    x,
                    y,
                    width: Some(width),
                    height: Some(height),
                } => self.fill_ground(image, *x, *y, *width, *height),
                DrawCommand::Image { image, x, y, .. } => self.put_sprite(image, *x, *y),
                DrawCommand::Text {
                    text,
                    x,
                    y,
                    style,
                    h_align,
                    v_align,
                    color,
                    ..
                } => {
                    let style = Style {
                        fg: Color::parse(color),
                        bold: *style == TextStyle::Bold,
                        ..Style::default()
                    };
                    self.put_text(text, *x, *y, *h_align, *v_align, style);
                }
            }
        }
    }

    fn column(&self, x: f64) -> isize {
        (x / self.px_per_col).floor() as isize
    }

    fn row(&self, y: f64) -> isize {
        (y / self.px_per_row).floor() as isize
    }

    fn cell_mut(&mut self, column: isize, row: isize) -> Option<&mut Cell> {
        if column < 0 || row < 0 {
            return None;
        }
        self.grid
            .get_mut(row as usize)
            .and_then(|cells| cells.get_mut(column as usize))
    }

    fn fill_ground(&mut self, image: &str, x: f64, y: f64, width: f64, height: f64) {
        if image.starts_with(SPEECH_PREFIX) {
            return;
        }
        let style = Style {
            fg: Some(Color::Named(NamedColor::Green)),
            dim: true,
            ..Style::default()
        };
        for row in self.row(y)..self.row(y + height) {
            for column in self.column(x)..self.column(x + width) {
                if let Some(cell) = self.cell_mut(column, row) {
                    *cell = Cell { ch: GROUND, style };
                }
            }
        }
    }

    fn put_sprite(&mut self, image: &str, x: f64, y: f64) {
        // Bubbles are drawn through their text only.
        if image.starts_with(SPEECH_PREFIX) {
            return;
        }
        let (glyph, color) = if image == PLACEHOLDER_IMAGE {
            (['?', '?'], NamedColor::Red)
        } else {
            (sprite_glyph(image), NamedColor::Yellow)
        };
        let style = Style {
            fg: Some(Color::Named(color)),
            bold: true,
            ..Style::default()
        };
        let (column, row) = (self.column(x), self.row(y));
        for (offset, ch) in glyph.into_iter().enumerate() {
            if let Some(cell) = self.cell_mut(column + offset as isize, row) {
                *cell = Cell { ch, style };
            }
        }
    }

    fn put_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        h_align: HAlign,
        v_align: VAlign,
        style: Style,
    ) {
        let lines: Vec<&str> = text.lines().collect();
        let count = lines.len() as isize;
        let top = match v_align {
            VAlign::Top => self.row(y),
            VAlign::Center => self.row(y) - count / 2,
            VAlign::Bottom => self.row(y) - count + 1,
        };
        for (index, line) in lines.iter().enumerate() {
            let length = line.chars().count() as isize;
            let left = match h_align {
                HAlign::Left => self.column(x),
                HAlign::Center => self.column(x) - length / 2,
                HAlign::Right => self.column(x) - length,
            };
            for (offset, ch) in line.chars().enumerate() {
                if let Some(cell) = self.cell_mut(left + offset as isize, top + index as isize) {
                    // Text keeps whatever background it lands on.
                    cell.ch = ch;
                    cell.style.fg = style.fg;
                    cell.style.bold = style.bold;
                    cell.style.dim = false;
                }
            }
        }
    }
}

/// Two characters standing in for an image: the first letters of its name.
fn sprite_glyph(image: &str) -> [char; 2] {
    let name = image.rsplit('/').next().unwrap_or(image);
    let mut letters = name.chars().filter(|c| c.is_alphanumeric());
    let first = letters.next().map_or('@', |c| c.to_ascii_uppercase());
    let second = letters.next().unwrap_or(' ');
    [first, second]
}
