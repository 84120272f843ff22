//! Renderer — board and visual states into canvas draw commands.
//!
//! The renderer is pure and stateless. Given the same board, visuals, image
//! table and clock it always produces the same commands. It knows nothing
//! about the interpreter or about audio.
//!
//! Grid y grows upward while pixel y grows downward, so every placement
//! flips against the canvas height.

pub mod message;

use crate::assets::{ImageTable, ResolvedImage};
use crate::projection::hexa_to_color;
use crate::types::{BoardState, DrawCommand, HAlign, Resolution, TextStyle, VAlign, VisualState};

use message::{DrawableMessage, draw_message};

pub const TEXT_SIZE: f64 = 20.0;
pub const TEXT_STYLE: TextStyle = TextStyle::Bold;
const DEFAULT_TEXT_COLOR: &str = "blue";
const TEXT_STROKE: &str = "#1c1c1c";
const NOT_FOUND_TEXT: &str = "IMAGE\n  NOT\nFOUND";
const NOT_FOUND_COLOR: &str = "black";

pub struct Renderer;

/// An image to blit, plus whether it stands in for a missing one.
struct Drawable {
    image: ResolvedImage,
    not_found: bool,
}

impl Renderer {
    /// Render one frame.
    ///
    /// Visuals are drawn in the given order, so later ones land on top.
    /// Messages still visible at `clock` are drawn after every visual.
    pub fn render(
        board: &BoardState,
        visuals: &[VisualState],
        images: &ImageTable,
        canvas: Resolution,
        clock: f64,
    ) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        Self::draw_ground(&mut commands, board, images, canvas);

        let cell = board.cell_size;
        let mut messages = Vec::new();

        for visual in visuals {
            let position = visual.position;
            let mut x = position.x * cell;
            let mut y = canvas.height - (position.y + 1.0) * cell;

            if let Some(path) = &visual.image {
                let drawable = Self::base_drawable(images, path, cell);
                x = position.x * cell;
                y = canvas.height - position.y * cell - drawable.image.info.height;
                commands.push(DrawCommand::Image {
                    image: drawable.image.key,
                    x,
                    y,
                    width: None,
                    height: None,
                });
                if drawable.not_found {
                    commands.push(DrawCommand::Text {
                        text: NOT_FOUND_TEXT.to_string(),
                        x,
                        y,
                        size: TEXT_SIZE,
                        style: TEXT_STYLE,
                        h_align: HAlign::Left,
                        v_align: VAlign::Top,
                        color: NOT_FOUND_COLOR.to_string(),
                        stroke: TEXT_STROKE.to_string(),
                    });
                }
            }

            if let Some(message) = visual.active_message(clock) {
                messages.push(DrawableMessage {
                    message: message.to_string(),
                    x,
                    y,
                });
            }

            if let Some(text) = &visual.text {
                let color = hexa_to_color(visual.text_color.as_deref())
                    .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string());
                commands.push(DrawCommand::Text {
                    text: text.clone(),
                    x: (position.x + 0.5) * cell,
                    y: canvas.height - (position.y + 0.5) * cell,
                    size: TEXT_SIZE,
                    style: TEXT_STYLE,
                    h_align: HAlign::Center,
                    v_align: VAlign::Center,
                    color,
                    stroke: TEXT_STROKE.to_string(),
                });
            }
        }

        for message in &messages {
            draw_message(&mut commands, message, canvas);
        }

        commands
    }

    fn draw_ground(
        commands: &mut Vec<DrawCommand>,
        board: &BoardState,
        images: &ImageTable,
        canvas: Resolution,
    ) {
        let cell = board.cell_size;

        if let Some(board_ground) = &board.board_ground {
            let image = Self::base_drawable(images, board_ground, cell).image;
            commands.push(DrawCommand::Image {
                image: image.key,
                x: 0.0,
                y: 0.0,
                width: Some(canvas.width),
                height: Some(canvas.height),
            });
            return;
        }

        let ground = Self::base_drawable(images, &board.ground, cell).image;
        let columns = board.width.round().max(0.0) as usize;
        let rows = board.height.round().max(0.0) as usize;
        for row in 0..rows {
            for column in 0..columns {
                commands.push(DrawCommand::Image {
                    image: ground.key.clone(),
                    x: column as f64 * cell,
                    y: row as f64 * cell,
                    width: Some(cell),
                    height: Some(cell),
                });
            }
        }
    }

    fn base_drawable(images: &ImageTable, path: &str, cell: f64) -> Drawable {
        match images.get(path) {
            Some(image) => Drawable {
                image,
                not_found: false,
            },
            None => {
                log::debug!("image {path} not available, drawing placeholder");
                Drawable {
                    image: images.placeholder(cell),
                    not_found: true,
                }
            }
        }
    }
}

/// Scale factor that fits the game canvas inside its parent while keeping
/// its aspect ratio.
pub fn fit_to_parent(game: Resolution, parent: Resolution) -> f64 {
    (parent.width / game.width).min(parent.height / game.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{ImageInfo, Pending};

    fn board() -> BoardState {
        BoardState {
            cell_size: 50.0,
            board_ground: None,
            ground: "ground.png".into(),
            width: 3.0,
            height: 2.0,
        }
    }

    fn canvas() -> Resolution {
        Resolution {
            width: 150.0,
            height: 100.0,
        }
    }

    fn images() -> ImageTable {
        let mut table = ImageTable::new();
        let cell = ImageInfo {
            width: 50.0,
            height: 50.0,
        };
        table.insert("ground.png", Pending::ready(cell));
        table.insert("wko.png", Pending::ready(cell));
        table.insert(
            "pepita.png",
            Pending::ready(ImageInfo {
                width: 40.0,
                height: 70.0,
            }),
        );
        table
    }

    fn image_positions(commands: &[DrawCommand], key: &str) -> Vec<(f64, f64)> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { image, x, y, .. } if image == key => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_ground_tiles_row_major() {
        let commands = Renderer::render(&board(), &[], &images(), canvas(), 0.0);

        assert_eq!(
            image_positions(&commands, "ground.png"),
            vec![
                (0.0, 0.0),
                (50.0, 0.0),
                (100.0, 0.0),
                (0.0, 50.0),
                (50.0, 50.0),
                (100.0, 50.0)
            ]
        );
    }

    #[test]
    fn test_board_ground_replaces_tiles() {
        let mut board = board();
        board.board_ground = Some("ground.png".into());
        let commands = Renderer::render(&board, &[], &images(), canvas(), 0.0);

        assert_eq!(
            commands,
            vec![DrawCommand::Image {
                image: "ground.png".into(),
                x: 0.0,
                y: 0.0,
                width: Some(150.0),
                height: Some(100.0),
            }]
        );
    }

    #[test]
    fn test_image_anchored_bottom_left() {
        let mut visual = VisualState::at(1.0, 0.0);
        visual.image = Some("pepita.png".into());
        let commands = Renderer::render(&board(), &[visual], &images(), canvas(), 0.0);

        assert_eq!(image_positions(&commands, "pepita.png"), vec![(50.0, 30.0)]);
    }

    #[test]
    fn test_missing_image_draws_placeholder_and_label() {
        let mut visual = VisualState::at(0.0, 1.0);
        visual.image = Some("nope.png".into());
        let commands = Renderer::render(&board(), &[visual], &images(), canvas(), 0.0);

        assert_eq!(image_positions(&commands, "wko.png"), vec![(0.0, 0.0)]);
        assert!(commands.iter().any(|c| matches!(
            c,
            DrawCommand::Text { text, .. } if text == NOT_FOUND_TEXT
        )));
    }

    #[test]
    fn test_text_centered_in_cell_with_color() {
        let mut visual = VisualState::at(2.0, 1.0);
        visual.text = Some("score".into());
        visual.text_color = Some("FF0000".into());
        let commands = Renderer::render(&board(), &[visual], &images(), canvas(), 0.0);

        let text = commands.last().unwrap();
        match text {
            DrawCommand::Text { x, y, color, h_align, .. } => {
                assert_eq!((*x, *y), (125.0, 25.0));
                assert_eq!(color, "#FF0000");
                assert_eq!(*h_align, HAlign::Center);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_fit_to_parent() {
        let game = Resolution {
            width: 500.0,
            height: 250.0,
        };
        let parent = Resolution {
            width: 1000.0,
            height: 1000.0,
        };
        assert_eq!(fit_to_parent(game, parent), 2.0);
    }
}
