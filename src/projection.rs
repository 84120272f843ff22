//! State projection — live interpreter objects into plain per-frame records.
//!
//! Every function here reads through the `Interpreter` capability and returns
//! fresh data. Nothing is cached between frames; the only side effects are
//! ordinary message sends.

use crate::interpreter::{GAME_FQN, IO_FQN, InnerValue, Interpreter, RuntimeError};
use crate::types::{BoardState, Id, Position, Resolution, SoundState, SoundStatus, VisualState};

/// Translate a raw browser key code into the identifier the interpreted
/// program listens for. Unknown codes map to the empty string.
///
/// Codes follow <http://keycode.info/>.
pub fn w_key_code(key_name: &str, key_code: u32) -> String {
    match key_code {
        48..=57 => format!("Digit{key_name}"),
        65..=90 => format!("Key{}", key_name.to_uppercase()),
        18 => "AltLeft".into(),
        225 => "AltRight".into(),
        8 => "Backspace".into(),
        17 => "Control".into(),
        46 => "Delete".into(),
        37..=40 => key_name.to_string(),
        13 => "Enter".into(),
        189 => "Minus".into(),
        187 => "Plus".into(),
        191 => "Slash".into(),
        32 => "Space".into(),
        16 => "Shift".into(),
        _ => String::new(),
    }
}

/// Interpreted colours are bare hex digits.
pub fn hexa_to_color(text_color: Option<&str>) -> Option<String> {
    match text_color {
        Some(color) if !color.is_empty() => Some(format!("#{color}")),
        _ => None,
    }
}

pub fn visual_state<I: Interpreter + ?Sized>(
    interpreter: &mut I,
    visual: &Id,
) -> Result<VisualState, RuntimeError> {
    let image = invoke_method(interpreter, visual, "image")?;
    let text = invoke_method(interpreter, visual, "text")?;
    let text_color = invoke_method(interpreter, visual, "textColor")?;

    let position = interpreter.send("position", visual, &[])?;
    let rounded = interpreter.send("round", &position, &[])?;
    let position = Position {
        x: number_field(interpreter, &rounded, "x")?,
        y: number_field(interpreter, &rounded, "y")?,
    };

    let message = interpreter
        .get(visual, "message")
        .and_then(|m| interpreter.inner_string(&m));
    let message_time = interpreter
        .get(visual, "messageTime")
        .and_then(|t| interpreter.inner_number(&t));

    Ok(VisualState {
        image,
        position,
        message,
        message_time,
        text,
        text_color,
    })
}

pub fn board_state<I: Interpreter + ?Sized>(
    interpreter: &I,
    game: &Id,
) -> Result<BoardState, RuntimeError> {
    Ok(BoardState {
        cell_size: number_field(interpreter, game, "cellSize")?,
        board_ground: interpreter
            .get(game, "boardGround")
            .and_then(|g| interpreter.inner_string(&g)),
        ground: string_field(interpreter, game, "ground")?,
        width: number_field(interpreter, game, "width")?,
        height: number_field(interpreter, game, "height")?,
    })
}

pub fn sound_state<I: Interpreter + ?Sized>(
    interpreter: &I,
    sound: &Id,
) -> Result<SoundState, RuntimeError> {
    let status = match string_field(interpreter, sound, "status")?.as_str() {
        "played" => SoundStatus::Played,
        "paused" => SoundStatus::Paused,
        "stopped" => SoundStatus::Stopped,
        _ => {
            return Err(RuntimeError::BadField {
                field: "status".into(),
                expected: "sound status",
            });
        }
    };
    Ok(SoundState {
        id: sound.clone(),
        file: string_field(interpreter, sound, "file")?,
        status,
        volume: number_field(interpreter, sound, "volume")?,
        looped: boolean_field(interpreter, sound, "loop")?,
    })
}

pub fn canvas_resolution<I: Interpreter + ?Sized>(
    interpreter: &I,
) -> Result<Resolution, RuntimeError> {
    let game = interpreter.object(GAME_FQN)?;
    let cell_size = number_field(interpreter, &game, "cellSize")?;
    let width = number_field(interpreter, &game, "width")?;
    let height = number_field(interpreter, &game, "height")?;
    Ok(Resolution {
        width: width.round() * cell_size,
        height: height.round() * cell_size,
    })
}

/// A `["keypress", code]` list, as the io object expects it.
pub fn build_key_press_event<I: Interpreter + ?Sized>(interpreter: &mut I, key_code: &str) -> Id {
    let kind = interpreter.reify(InnerValue::String("keypress".into()));
    let code = interpreter.reify(InnerValue::String(key_code.to_string()));
    interpreter.list(vec![kind, code])
}

pub fn queue_event<I: Interpreter + ?Sized>(
    interpreter: &mut I,
    events: &[Id],
) -> Result<(), RuntimeError> {
    let io = interpreter.object(IO_FQN)?;
    for event in events {
        interpreter.send("queueEvent", &io, std::slice::from_ref(event))?;
    }
    Ok(())
}

pub fn flush_events<I: Interpreter + ?Sized>(
    interpreter: &mut I,
    ms: f64,
) -> Result<(), RuntimeError> {
    let game = interpreter.object(GAME_FQN)?;
    let ms = interpreter.reify(InnerValue::Number(ms));
    interpreter.send("flushEvents", &game, &[ms])?;
    Ok(())
}

fn invoke_method<I: Interpreter + ?Sized>(
    interpreter: &mut I,
    object: &Id,
    method: &str,
) -> Result<Option<String>, RuntimeError> {
    if !interpreter.responds_to(object, method, 0) {
        return Ok(None);
    }
    let result = interpreter.send(method, object, &[])?;
    Ok(interpreter.inner_string(&result))
}

fn number_field<I: Interpreter + ?Sized>(
    interpreter: &I,
    object: &Id,
    field: &str,
) -> Result<f64, RuntimeError> {
    interpreter
        .get(object, field)
        .and_then(|value| interpreter.inner_number(&value))
        .ok_or_else(|| bad_field(field, "number"))
}

fn string_field<I: Interpreter + ?Sized>(
    interpreter: &I,
    object: &Id,
    field: &str,
) -> Result<String, RuntimeError> {
    interpreter
        .get(object, field)
        .and_then(|value| interpreter.inner_string(&value))
        .ok_or_else(|| bad_field(field, "string"))
}

fn boolean_field<I: Interpreter + ?Sized>(
    interpreter: &I,
    object: &Id,
    field: &str,
) -> Result<bool, RuntimeError> {
    interpreter
        .get(object, field)
        .and_then(|value| interpreter.inner_boolean(&value))
        .ok_or_else(|| bad_field(field, "boolean"))
}

fn bad_field(field: &str, expected: &'static str) -> RuntimeError {
    RuntimeError::BadField {
        field: field.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::memory::Heap;

    #[test]
    fn test_digits_and_letters() {
        for code in 48..=57u32 {
            let digit = char::from_u32(code).unwrap().to_string();
            assert_eq!(w_key_code(&digit, code), format!("Digit{digit}"));
        }
        for code in 65..=90u32 {
            let upper = char::from_u32(code).unwrap();
            let lower = upper.to_ascii_lowercase().to_string();
            assert_eq!(w_key_code(&lower, code), format!("Key{upper}"));
        }
    }

    #[test]
    fn test_fixed_codes_and_arrows() {
        assert_eq!(w_key_code("Alt", 18), "AltLeft");
        assert_eq!(w_key_code("AltGraph", 225), "AltRight");
        assert_eq!(w_key_code("Enter", 13), "Enter");
        assert_eq!(w_key_code(" ", 32), "Space");
        assert_eq!(w_key_code("-", 189), "Minus");
        assert_eq!(w_key_code("ArrowLeft", 37), "ArrowLeft");
        assert_eq!(w_key_code("ArrowDown", 40), "ArrowDown");
    }

    #[test]
    fn test_unknown_codes_are_empty() {
        assert_eq!(w_key_code("F1", 112), "");
        assert_eq!(w_key_code("", 0), "");
        assert_eq!(w_key_code("Tab", 9), "");
    }

    #[test]
    fn test_hexa_to_color() {
        assert_eq!(hexa_to_color(Some("FF0000")).as_deref(), Some("#FF0000"));
        assert_eq!(hexa_to_color(None), None);
    }

    #[test]
    fn test_visual_state_rounds_and_keeps_optionals_absent() {
        let mut heap = Heap::new();
        let position = heap.position(2.5, 0.4);
        let visual = heap.instance("birds.Bird", &[("position", position)]);

        let state = visual_state(&mut heap, &visual).unwrap();

        assert_eq!(state.position, Position { x: 3.0, y: 0.0 });
        assert_eq!(state.image, None);
        assert_eq!(state.text, None);
        assert_eq!(state.text_color, None);
        assert_eq!(state.message, None);
        assert_eq!(state.message_time, None);
    }

    #[test]
    fn test_visual_state_reads_every_field() {
        let mut heap = Heap::new();
        let position = heap.position(1.0, 2.0);
        let image = heap.string("pepita.png");
        let text = heap.string("hola");
        let color = heap.string("00FF00");
        let message = heap.string("hi");
        let time = heap.number(1000.0);
        let visual = heap.instance(
            "birds.Bird",
            &[
                ("position", position),
                ("image", image),
                ("text", text),
                ("textColor", color),
                ("message", message),
                ("messageTime", time),
            ],
        );

        let state = visual_state(&mut heap, &visual).unwrap();

        assert_eq!(state.image.as_deref(), Some("pepita.png"));
        assert_eq!(state.text.as_deref(), Some("hola"));
        assert_eq!(state.text_color.as_deref(), Some("00FF00"));
        assert_eq!(state.message.as_deref(), Some("hi"));
        assert_eq!(state.message_time, Some(1000.0));
    }

    #[test]
    fn test_visual_without_position_propagates_runtime_error() {
        let mut heap = Heap::new();
        let visual = heap.instance("birds.Bird", &[]);

        assert!(matches!(
            visual_state(&mut heap, &visual),
            Err(RuntimeError::MessageNotUnderstood { .. })
        ));
    }

    #[test]
    fn test_board_and_canvas_resolution() {
        let mut heap = Heap::new();
        let game = heap.install_game(10.4, 5.0, 50.0, "ground.png");

        let board = board_state(&heap, &game).unwrap();
        assert_eq!(board.ground, "ground.png");
        assert_eq!(board.board_ground, None);

        let resolution = canvas_resolution(&heap).unwrap();
        assert_eq!(resolution, Resolution { width: 500.0, height: 250.0 });
    }

    #[test]
    fn test_sound_state() {
        let mut heap = Heap::new();
        let sound = heap.sound("music.mp3", SoundStatus::Paused, 0.5, true);

        let state = sound_state(&heap, &sound).unwrap();

        assert_eq!(state.id, sound);
        assert_eq!(state.file, "music.mp3");
        assert_eq!(state.status, SoundStatus::Paused);
        assert_eq!(state.volume, 0.5);
        assert!(state.looped);
    }
}
