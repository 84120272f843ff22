//! Frame stepper — one discrete step per host draw callback.
//!
//! A `Session` is the per-game context: the loaded image and sound tables,
//! the tracked sounds and the paused/muted flags. It lives exactly as long
//! as one game session and is passed to every step.

use crate::assets::ImageTable;
use crate::game::{Game, GameError};
use crate::renderer::Renderer;
use crate::sketch::Host;
use crate::sound::{AudioClip, SoundLibrary, SoundMixer};

pub struct Session<C> {
    pub images: ImageTable,
    pub sounds: SoundLibrary<C>,
    mixer: SoundMixer<C>,
    paused: bool,
    muted: bool,
}

impl<C: AudioClip> Session<C> {
    pub fn new(muted: bool) -> Self {
        Session {
            images: ImageTable::new(),
            sounds: SoundLibrary::new(),
            mixer: SoundMixer::new(),
            paused: false,
            muted,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        log::info!("game {}", if self.paused { "paused" } else { "resumed" });
        self.paused
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        log::info!("sound {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }

    pub fn mixer(&self) -> &SoundMixer<C> {
        &self.mixer
    }

    /// Advance the game by one frame.
    ///
    /// While paused only the sounds are reconciled, against an empty list, so
    /// audio goes quiet and no events or frames are produced.
    pub fn step<G, H>(&mut self, game: &mut G, host: &mut H) -> Result<(), GameError>
    where
        G: Game + ?Sized,
        H: Host<Clip = C> + ?Sized,
    {
        if self.paused {
            self.mixer.reconcile(&[], &self.sounds, self.muted);
            return Ok(());
        }

        let clock = host.millis();
        game.flush_events(clock)?;

        let sound_states = game.sound_states()?;
        self.mixer.reconcile(&sound_states, &self.sounds, self.muted);

        self.images.settle();
        let board = game.board()?;
        let visuals = game.visuals()?;
        let canvas = game.canvas_resolution()?;
        let commands = Renderer::render(&board, &visuals, &self.images, canvas, clock);
        host.draw(&commands);
        Ok(())
    }

    /// Stop every tracked sound and release the loaded clips.
    pub fn unload(&mut self) {
        self.mixer.release_all();
        self.sounds.unload();
        log::info!("session unloaded");
    }
}
