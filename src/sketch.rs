//! Sketch — the host-facing lifecycle of one game session.
//!
//! The host owns the canvas, the clock and the audio/image decoders. It
//! calls `start` once, then `draw` on every frame until it returns `false`,
//! forwards key presses to `key_pressed`, and finally calls `unload`.

use crate::assets::{DEFAULT_IMAGES, ImageInfo, Pending};
use crate::config::GameConfig;
use crate::game::{Game, GameError};
use crate::projection::w_key_code;
use crate::renderer::fit_to_parent;
use crate::sound::AudioClip;
use crate::stepper::Session;
use crate::types::{DrawCommand, MediaFile, Resolution};

/// Event code queued alongside every specific key press.
pub const ANY_KEY: &str = "ANY";

/// The rendering and audio capability a game is played on.
pub trait Host {
    type Clip: AudioClip;

    /// Milliseconds since the sketch started.
    fn millis(&self) -> f64;

    /// Start loading an image. The returned slot settles later.
    fn load_image(&mut self, url: &str) -> Pending<ImageInfo>;

    fn load_sound(&mut self, url: &str) -> Self::Clip;

    fn create_canvas(&mut self, size: Resolution);

    /// Size of the area the canvas is embedded in, when there is one.
    fn parent_size(&self) -> Option<Resolution>;

    fn set_display_scale(&mut self, scale: f64);

    fn draw(&mut self, commands: &[DrawCommand]);
}

pub struct Sketch<G, C> {
    game: G,
    session: Session<C>,
    assets_dir: String,
    stopped: bool,
}

impl<G: Game, C: AudioClip> Sketch<G, C> {
    pub fn new(game: G, config: &GameConfig) -> Self {
        Sketch {
            game,
            session: Session::new(config.start_muted),
            assets_dir: config.assets_dir.clone(),
            stopped: false,
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<C> {
        &mut self.session
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Run the game's program, then preload its media and set up the canvas.
    /// A project without a runnable program fails here, before any frame.
    pub fn start<H: Host<Clip = C>>(&mut self, host: &mut H) -> Result<(), GameError> {
        self.game.start()?;
        self.preload(host);
        self.setup(host)
    }

    pub fn preload<H: Host<Clip = C>>(&mut self, host: &mut H) {
        for name in DEFAULT_IMAGES {
            let load = host.load_image(&format!("{}{name}", self.assets_dir));
            self.session.images.insert(name, load);
        }

        let cache_buster = host.millis() as u64;
        for image in self.game.images() {
            let url = with_cache_buster(&image.url, cache_buster);
            let load = host.load_image(&url);
            for path in &image.possible_paths {
                self.session.images.insert(path, load.clone());
            }
        }

        for sound in self.game.sounds() {
            load_sound(&mut self.session, host, &sound);
        }

        log::info!(
            "preloaded {} image paths and {} sound paths",
            self.session.images.len(),
            self.session.sounds.len()
        );
    }

    pub fn setup<H: Host<Clip = C>>(&mut self, host: &mut H) -> Result<(), GameError> {
        let resolution = self.game.canvas_resolution()?;
        host.create_canvas(resolution);
        if let Some(parent) = host.parent_size() {
            host.set_display_scale(fit_to_parent(resolution, parent));
        }
        log::info!("canvas set up at {}x{}", resolution.width, resolution.height);
        Ok(())
    }

    /// Step one frame. Returns `false` once the program has stopped running.
    pub fn draw<H: Host<Clip = C>>(&mut self, host: &mut H) -> Result<bool, GameError> {
        if self.stopped {
            return Ok(false);
        }
        if !self.game.running()? {
            log::info!("game stopped running");
            self.stopped = true;
            return Ok(false);
        }
        self.session.step(&mut self.game, host)?;
        Ok(true)
    }

    /// Queue a key press for the program. Ignored while paused.
    pub fn key_pressed(&mut self, key: &str, key_code: u32) -> Result<(), GameError> {
        if self.session.is_paused() {
            return Ok(());
        }
        let code = w_key_code(key, key_code);
        self.game.queue_event(&[&code, ANY_KEY])
    }

    pub fn unload(&mut self) {
        self.session.unload();
    }
}

fn load_sound<C: AudioClip, H: Host<Clip = C>>(
    session: &mut Session<C>,
    host: &mut H,
    sound: &MediaFile,
) {
    let clip = host.load_sound(&sound.url);
    for path in &sound.possible_paths {
        session.sounds.insert(path, clip.clone());
    }
}

fn with_cache_buster(url: &str, millis: u64) -> String {
    if url.starts_with("data:") {
        url.to_string()
    } else {
        format!("{url}?cb={millis}")
    }
}
