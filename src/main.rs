use std::path::Path;
use std::{fs, process};

use anyhow::{Context, Result, bail};
use serde_json::json;

use wollok_bridge::{
    assets::{DEFAULT_IMAGES, ImageInfo, ImageTable, Pending},
    config::GameConfig,
    diagram,
    game::{Game, LocalGame},
    interpreter::memory::Heap,
    player::Player,
    project::{GameProject, build_game_project, read_project_dir},
    renderer::Renderer,
};

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const DIAGRAM_USAGE: &str = "wollok-bridge diagram <heap.json> [root package]";
const FRAME_USAGE: &str = "wollok-bridge frame <heap.json> [clock ms]";
const PLAY_USAGE: &str = "wollok-bridge play <heap.json> <main package>";
const PROJECT_USAGE: &str = "wollok-bridge project <dir> [program file]";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("diagram") => {
            let path = args.next().context(DIAGRAM_USAGE)?;
            show_diagram(&path, args.next().as_deref())
        }
        Some("frame") => {
            let path = args.next().context(FRAME_USAGE)?;
            let clock = match args.next() {
                Some(ms) => ms
                    .parse()
                    .with_context(|| format!("Invalid clock '{ms}'\n\n{FRAME_USAGE}"))?,
                None => 0.0,
            };
            frame(&path, clock)
        }
        Some("play") => {
            let path = args.next().context(PLAY_USAGE)?;
            let main = args.next().context(PLAY_USAGE)?;
            play(&path, &main)
        }
        Some("project") => {
            let dir = args.next().context(PROJECT_USAGE)?;
            project(&dir, args.next().as_deref())
        }
        _ => bail!(
            "Wollok Bridge — game loop and object diagrams for a running program\n\nUsage:\n  {DIAGRAM_USAGE}\n  {FRAME_USAGE}\n  {PLAY_USAGE}\n  {PROJECT_USAGE}"
        ),
    }
}

fn load_heap(path: &str) -> Result<Heap> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    Heap::from_json(&json).with_context(|| format!("Failed to parse {path}"))
}

fn show_diagram(path: &str, root: Option<&str>) -> Result<()> {
    let heap = load_heap(path)?;
    let elements = diagram::extract(&heap, root).elements();
    println!("{}", serde_json::to_string_pretty(&elements)?);
    Ok(())
}

fn frame(path: &str, clock: f64) -> Result<()> {
    let heap = load_heap(path)?;
    let mut game = LocalGame::new(GameProject::headless(""), heap);

    let board = game.board()?;
    let visuals = game.visuals()?;
    let canvas = game.canvas_resolution()?;

    // Every referenced image counts as loaded at one cell.
    let cell = ImageInfo {
        width: board.cell_size,
        height: board.cell_size,
    };
    let mut referenced: Vec<&str> = DEFAULT_IMAGES.to_vec();
    referenced.push(&board.ground);
    referenced.extend(board.board_ground.as_deref());
    referenced.extend(visuals.iter().filter_map(|v| v.image.as_deref()));
    let mut images = ImageTable::new();
    for image in referenced {
        images.insert(image, Pending::ready(cell));
    }

    let commands = Renderer::render(&board, &visuals, &images, canvas, clock);
    println!("{}", serde_json::to_string_pretty(&commands)?);
    Ok(())
}

fn play(path: &str, main: &str) -> Result<()> {
    let heap = load_heap(path)?;
    let game = LocalGame::new(GameProject::headless(main), heap);
    let mut player = Player::new(game, GameConfig::load())?;
    player.play()
}

fn project(dir: &str, program: Option<&str>) -> Result<()> {
    let files = read_project_dir(Path::new(dir)).with_context(|| format!("Failed to read {dir}"))?;
    let project = build_game_project(&files, program)?;

    let aliases = |media: &[wollok_bridge::types::MediaFile]| -> Vec<String> {
        media.iter().flat_map(|m| m.possible_paths.clone()).collect()
    };
    let summary = json!({
        "main": project.main,
        "description": project.description,
        "sources": project.sources.iter().map(|s| &s.name).collect::<Vec<_>>(),
        "images": aliases(&project.images),
        "sounds": aliases(&project.sounds),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
