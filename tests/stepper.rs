use std::cell::RefCell;
use std::rc::Rc;

use wollok_bridge::assets::{ImageInfo, Pending};
use wollok_bridge::config::{DEFAULT_ASSETS_DIR, GameConfig};
use wollok_bridge::game::{GameError, LocalGame};
use wollok_bridge::interpreter::memory::Heap;
use wollok_bridge::interpreter::{InnerValue, Interpreter};
use wollok_bridge::project::{GameProject, ProjectError};
use wollok_bridge::sketch::{Host, Sketch};
use wollok_bridge::sound::AudioClip;
use wollok_bridge::types::{DrawCommand, Id, MediaFile, Resolution, SoundStatus};

const MAIN: &str = "games.pepita";

#[derive(Debug, Clone, Default)]
struct RecordingClip {
    calls: Rc<RefCell<Vec<String>>>,
}

impl RecordingClip {
    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn transitions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c.as_str(), "play" | "pause" | "stop"))
            .collect()
    }
}

impl AudioClip for RecordingClip {
    fn is_loaded(&self) -> bool {
        true
    }
    fn play(&mut self) {
        self.calls.borrow_mut().push("play".into());
    }
    fn pause(&mut self) {
        self.calls.borrow_mut().push("pause".into());
    }
    fn stop(&mut self) {
        self.calls.borrow_mut().push("stop".into());
    }
    fn set_loop(&mut self, looped: bool) {
        self.calls.borrow_mut().push(format!("loop {looped}"));
    }
    fn set_volume(&mut self, volume: f64) {
        self.calls.borrow_mut().push(format!("volume {volume}"));
    }
}

#[derive(Default)]
struct RecordingHost {
    clock: f64,
    parent: Option<Resolution>,
    canvas: Option<Resolution>,
    scale: Option<f64>,
    image_urls: Vec<String>,
    clip: RecordingClip,
    frames: Vec<Vec<DrawCommand>>,
}

impl Host for RecordingHost {
    type Clip = RecordingClip;

    fn millis(&self) -> f64 {
        self.clock
    }

    fn load_image(&mut self, url: &str) -> Pending<ImageInfo> {
        self.image_urls.push(url.to_string());
        Pending::ready(ImageInfo {
            width: 50.0,
            height: 50.0,
        })
    }

    fn load_sound(&mut self, _url: &str) -> RecordingClip {
        self.clip.clone()
    }

    fn create_canvas(&mut self, size: Resolution) {
        self.canvas = Some(size);
    }

    fn parent_size(&self) -> Option<Resolution> {
        self.parent
    }

    fn set_display_scale(&mut self, scale: f64) {
        self.scale = Some(scale);
    }

    fn draw(&mut self, commands: &[DrawCommand]) {
        self.frames.push(commands.to_vec());
    }
}

struct Fixture {
    heap: Heap,
    bird: Id,
}

fn fixture() -> Fixture {
    let mut heap = Heap::new();
    heap.install_game(3.0, 2.0, 50.0, "ground.png");
    let image = heap.string("pepita.png");
    let position = heap.position(1.0, 0.0);
    let bird = heap.declare_object(MAIN, "pepita", &[("image", image), ("position", position)]);
    heap.add_visual(bird.clone()).unwrap();
    heap.declare_program(MAIN, "juego");
    Fixture { heap, bird }
}

fn project() -> GameProject {
    let mut project = GameProject::headless(MAIN);
    project.images.push(MediaFile {
        possible_paths: vec!["assets/pepita.png".into(), "pepita.png".into()],
        url: "data:image/png;base64,AA==".into(),
    });
    project.sounds.push(MediaFile {
        possible_paths: vec!["music.mp3".into()],
        url: "http://host/music.mp3".into(),
    });
    project
}

fn sketch(heap: Heap, config: &GameConfig) -> Sketch<LocalGame<Heap>, RecordingClip> {
    Sketch::new(LocalGame::new(project(), heap), config)
}

fn images(frame: &[DrawCommand], key: &str) -> usize {
    frame
        .iter()
        .filter(|c| matches!(c, DrawCommand::Image { image, .. } if image == key))
        .count()
}

fn texts(frame: &[DrawCommand]) -> Vec<&str> {
    frame
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn play_music(heap: &mut Heap) -> Id {
    let sound = heap.sound("music.mp3", SoundStatus::Played, 0.7, true);
    heap.add_sound(sound.clone()).unwrap();
    sound
}

#[test]
fn test_start_without_program_fails_before_any_frame() {
    let mut heap = Heap::new();
    heap.install_game(3.0, 2.0, 50.0, "ground.png");
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();

    let result = sketch.start(&mut host);

    assert!(matches!(
        result,
        Err(GameError::Project(ProjectError::NoProgram(_)))
    ));
    assert!(host.canvas.is_none());
    assert!(host.frames.is_empty());
}

#[test]
fn test_start_runs_program_preloads_and_sets_up() {
    let Fixture { heap, .. } = fixture();
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost {
        clock: 12.0,
        parent: Some(Resolution {
            width: 300.0,
            height: 400.0,
        }),
        ..Default::default()
    };

    sketch.start(&mut host).unwrap();

    assert_eq!(sketch.game().interpreter().executed_programs(), ["games.pepita.juego"]);
    assert!(host.image_urls.contains(&format!("{DEFAULT_ASSETS_DIR}speech4.png")));
    assert!(host.image_urls.contains(&"data:image/png;base64,AA==".to_string()));
    assert_eq!(
        host.canvas,
        Some(Resolution {
            width: 150.0,
            height: 100.0
        })
    );
    assert_eq!(host.scale, Some(2.0));
    assert_eq!(sketch.session().sounds.len(), 1);
}

#[test]
fn test_frame_draws_ground_then_visuals_in_order() {
    let Fixture { mut heap, .. } = fixture();
    let other = heap.string("alpiste.png");
    let position = heap.position(1.0, 0.0);
    let seed = heap.declare_object(MAIN, "alpiste", &[("image", other), ("position", position)]);
    heap.add_visual(seed).unwrap();
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();

    assert!(sketch.draw(&mut host).unwrap());

    let frame = &host.frames[0];
    assert_eq!(images(frame, "ground.png"), 6);
    let order: Vec<&str> = frame
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Image { image, width: None, .. } => Some(image.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec!["pepita.png", "wko.png"]);
    assert!(texts(frame).contains(&"IMAGE\n  NOT\nFOUND"));
}

#[test]
fn test_message_visible_until_its_time() {
    let Fixture { mut heap, bird } = fixture();
    heap.assign(&bird, "message", InnerValue::String("hi".into())).unwrap();
    heap.assign(&bird, "messageTime", InnerValue::Number(1000.0)).unwrap();
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();

    host.clock = 999.0;
    sketch.draw(&mut host).unwrap();
    host.clock = 1000.0;
    sketch.draw(&mut host).unwrap();

    assert_eq!(texts(&host.frames[0]), vec!["hi"]);
    assert_eq!(images(&host.frames[0], "speech.png"), 1);
    assert!(texts(&host.frames[1]).is_empty());
}

#[test]
fn test_key_presses_flushed_with_frame_clock() {
    let Fixture { heap, .. } = fixture();
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();

    sketch.key_pressed("a", 65).unwrap();
    host.clock = 250.0;
    sketch.draw(&mut host).unwrap();

    let dispatched = sketch.game().interpreter().dispatched();
    assert_eq!(dispatched.len(), 2);
    assert_eq!(dispatched[0].event, vec!["keypress", "KeyA"]);
    assert_eq!(dispatched[1].event, vec!["keypress", "ANY"]);
    assert!(dispatched.iter().all(|e| e.time == 250.0));
}

#[test]
fn test_sound_plays_once_across_frames() {
    let Fixture { mut heap, .. } = fixture();
    play_music(&mut heap);
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();

    for _ in 0..3 {
        sketch.draw(&mut host).unwrap();
    }

    assert_eq!(host.clip.transitions(), vec!["play"]);
    assert_eq!(sketch.session().mixer().len(), 1);
}

#[test]
fn test_removed_sound_is_stopped_and_forgotten() {
    let Fixture { mut heap, .. } = fixture();
    let sound = play_music(&mut heap);
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();
    sketch.draw(&mut host).unwrap();

    sketch.game_mut().interpreter_mut().remove_sound(&sound).unwrap();
    sketch.draw(&mut host).unwrap();
    sketch.draw(&mut host).unwrap();

    assert_eq!(host.clip.transitions(), vec!["play", "stop"]);
    assert!(sketch.session().mixer().is_empty());
}

#[test]
fn test_pause_quiets_audio_and_skips_frames() {
    let Fixture { mut heap, .. } = fixture();
    play_music(&mut heap);
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();
    sketch.draw(&mut host).unwrap();

    sketch.session_mut().toggle_pause();
    sketch.key_pressed("a", 65).unwrap();
    sketch.draw(&mut host).unwrap();

    assert_eq!(host.frames.len(), 1);
    assert_eq!(host.clip.transitions(), vec!["play", "stop"]);
    assert!(sketch.game().interpreter().dispatched().is_empty());

    sketch.session_mut().toggle_pause();
    sketch.draw(&mut host).unwrap();

    assert_eq!(host.frames.len(), 2);
    assert_eq!(host.clip.transitions(), vec!["play", "stop", "play"]);
}

#[test]
fn test_muted_session_forces_zero_volume() {
    let Fixture { mut heap, .. } = fixture();
    play_music(&mut heap);
    let config = GameConfig {
        start_muted: true,
        ..GameConfig::default()
    };
    let mut sketch = sketch(heap, &config);
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();

    sketch.draw(&mut host).unwrap();
    sketch.draw(&mut host).unwrap();

    let volumes: Vec<String> = host
        .clip
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("volume"))
        .collect();
    assert_eq!(volumes, vec!["volume 0", "volume 0"]);
}

#[test]
fn test_stops_stepping_when_game_ends() {
    let Fixture { heap, .. } = fixture();
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();

    let game = sketch.game().interpreter().object("wollok.game.game").unwrap();
    sketch
        .game_mut()
        .interpreter_mut()
        .assign(&game, "running", InnerValue::Boolean(false))
        .unwrap();

    assert!(!sketch.draw(&mut host).unwrap());
    assert!(sketch.is_stopped());
    assert!(host.frames.is_empty());
}

#[test]
fn test_unload_stops_every_sound() {
    let Fixture { mut heap, .. } = fixture();
    play_music(&mut heap);
    let mut sketch = sketch(heap, &GameConfig::default());
    let mut host = RecordingHost::default();
    sketch.start(&mut host).unwrap();
    sketch.draw(&mut host).unwrap();

    sketch.unload();

    assert!(sketch.session().mixer().is_empty());
    assert!(sketch.session().sounds.is_empty());
    assert!(host.clip.transitions().ends_with(&["stop".to_string()]));
}
