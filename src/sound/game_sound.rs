use crate::types::{SoundState, SoundStatus};

use super::AudioClip;

/// Runtime mirror of one sound object of the interpreted program.
///
/// A status change is only issued to the clip when it differs from the last
/// applied one, or when the clip has never been started, and only once the
/// clip reports it is loaded.
#[derive(Debug)]
pub struct GameSound<C> {
    last_state: SoundState,
    clip: C,
    started: bool,
}

impl<C: AudioClip> GameSound<C> {
    pub fn new(state: SoundState, clip: C) -> Self {
        GameSound {
            last_state: state,
            clip,
            started: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.clip.is_loaded()
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn last_state(&self) -> &SoundState {
        &self.last_state
    }

    pub fn can_be_played(&self, state: &SoundState) -> bool {
        (self.last_state.status != state.status || !self.started) && self.is_loaded()
    }

    /// Apply loop and volume unconditionally, then issue the status
    /// transition if there is one to issue.
    pub fn update(&mut self, state: SoundState) {
        self.clip.set_loop(state.looped);
        self.clip.set_volume(state.volume);
        let playable = self.can_be_played(&state);
        self.last_state = state;

        if playable {
            self.started = true;
            log::debug!("sound {} -> {:?}", self.last_state.id, self.last_state.status);
            match self.last_state.status {
                SoundStatus::Played => self.clip.play(),
                SoundStatus::Paused => self.clip.pause(),
                SoundStatus::Stopped => self.clip.stop(),
            }
        }
    }

    pub fn stop(&mut self) {
        self.clip.stop();
    }
}
