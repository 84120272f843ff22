//! The source and media files a game is started from.
//!
//! A project has exactly one program entry point. Media files are
//! registered under every path a program may use to refer to them, and are
//! served back as `data:` URLs.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{VALID_IMAGE_EXTENSIONS, VALID_SOUND_EXTENSIONS};
use crate::types::MediaFile;

pub const WOLLOK_FILE_EXTENSION: &str = "wlk";
pub const PROGRAM_FILE_EXTENSION: &str = "wpgm";
const NO_DESCRIPTION: &str = "## No description found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProject {
    /// Package holding the program to run, e.g. `games.pepita`.
    pub main: String,
    pub sources: Vec<SourceFile>,
    pub description: String,
    pub images: Vec<MediaFile>,
    pub sounds: Vec<MediaFile>,
}

impl GameProject {
    /// A project whose sources are already loaded into the interpreter.
    pub fn headless(main: &str) -> Self {
        GameProject {
            main: main.to_string(),
            sources: Vec::new(),
            description: NO_DESCRIPTION.to_string(),
            images: Vec::new(),
            sounds: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("program not found: {0}")]
    NoProgram(String),
    #[error("this project has more than one program: {}", .programs.join(", "))]
    MultiProgram {
        programs: Vec<String>,
        files: Vec<String>,
    },
    #[error("failed to read project files: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a project from its files. With `program_name` the program file is
/// picked by name; otherwise the project must contain exactly one program.
pub fn build_game_project(
    files: &[File],
    program_name: Option<&str>,
) -> Result<GameProject, ProjectError> {
    let sources: Vec<SourceFile> = files
        .iter()
        .filter(|f| has_extension(&f.name, &[WOLLOK_FILE_EXTENSION, PROGRAM_FILE_EXTENSION]))
        .map(normalize_source)
        .collect();

    let program = match program_name {
        Some(name) => sources.iter().find(|s| s.name == name),
        None => {
            let programs: Vec<&SourceFile> = sources
                .iter()
                .filter(|s| has_extension(&s.name, &[PROGRAM_FILE_EXTENSION]))
                .collect();
            if programs.len() > 1 {
                return Err(ProjectError::MultiProgram {
                    programs: programs.iter().map(|p| p.name.clone()).collect(),
                    files: files.iter().map(|f| f.name.clone()).collect(),
                });
            }
            programs.first().copied()
        }
    };
    let program = program.ok_or_else(|| {
        ProjectError::NoProgram(program_name.unwrap_or("program file").to_string())
    })?;

    let main = program
        .name
        .strip_suffix(&format!(".{PROGRAM_FILE_EXTENSION}"))
        .unwrap_or(&program.name)
        .replace('/', ".");
    let description = files
        .iter()
        .find(|f| f.name.ends_with("README.md"))
        .map(|f| String::from_utf8_lossy(&f.content).into_owned())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    log::info!("built project {main} from {} files", files.len());

    Ok(GameProject {
        main,
        sources,
        description,
        images: media_files(files, &VALID_IMAGE_EXTENSIONS, "image/png"),
        sounds: media_files(files, &VALID_SOUND_EXTENSIONS, "audio/mp3"),
    })
}

/// Read every file under `root`, named by its `/`-separated relative path.
pub fn read_project_dir(root: &Path) -> Result<Vec<File>, ProjectError> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<File>) -> Result<(), ProjectError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, files)?;
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push(File {
            name,
            content: fs::read(&path)?,
        });
    }
    Ok(())
}

fn media_files(files: &[File], extensions: &[&str], mime: &str) -> Vec<MediaFile> {
    files
        .iter()
        .filter(|f| has_extension(&f.name, extensions))
        .map(|f| MediaFile {
            possible_paths: possible_paths(&f.name),
            url: format!("data:{mime};base64,{}", STANDARD.encode(&f.content)),
        })
        .collect()
}

/// Every path the file can be referred to by: its full path minus each
/// enclosing directory prefix, the full path included.
pub fn possible_paths(file_path: &str) -> Vec<String> {
    let mut paths = vec![file_path.to_string()];
    paths.extend(
        file_path
            .match_indices('/')
            .map(|(i, _)| file_path[i + 1..].to_string())
            .filter(|p| !p.is_empty()),
    );
    paths
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    extensions
        .iter()
        .any(|extension| name.ends_with(&format!(".{extension}")))
}

/// Rename the reserved `game` program and rewrite `++`/`--`, which the
/// interpreter does not parse.
fn normalize_source(file: &File) -> SourceFile {
    let content = String::from_utf8_lossy(&file.content)
        .replace("++", "+=1")
        .replace("--", "-=1")
        .replacen("program game", "program _juego_", 1);
    SourceFile {
        name: file.name.replacen("game.wpgm", "_juego_.wpgm", 1),
        content,
    }
}
