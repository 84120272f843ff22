//! Sound lifecycle: one `GameSound` per sound identity the program reports.
//!
//! Each reconciliation pass compares the tracked sounds with the latest
//! `SoundState` list: identities that vanished are stopped and evicted, new
//! identities get a `GameSound` bound to their clip, and every present sound
//! receives its loop/volume and, when due, its status transition.

mod game_sound;

use std::collections::HashMap;

pub use game_sound::GameSound;

use crate::types::{Id, SoundState};

/// A loaded (or loading) audio resource owned by the host.
///
/// Cloning must yield another handle to the same underlying resource.
pub trait AudioClip: Clone {
    fn is_loaded(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_loop(&mut self, looped: bool);
    fn set_volume(&mut self, volume: f64);

    /// Release the resource for good.
    fn unload(&mut self) {
        self.stop();
    }
}

/// Audio clips keyed by every path a program may use to refer to them.
#[derive(Debug, Clone)]
pub struct SoundLibrary<C> {
    clips: HashMap<String, C>,
}

impl<C> Default for SoundLibrary<C> {
    fn default() -> Self {
        SoundLibrary {
            clips: HashMap::new(),
        }
    }
}

impl<C: AudioClip> SoundLibrary<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, clip: C) {
        self.clips.insert(path.to_string(), clip);
    }

    pub fn get(&self, path: &str) -> Option<&C> {
        self.clips.get(path)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn unload(&mut self) {
        for clip in self.clips.values_mut() {
            clip.unload();
        }
        self.clips.clear();
    }
}

/// The tracked sounds of one game session.
#[derive(Debug)]
pub struct SoundMixer<C> {
    current: HashMap<Id, GameSound<C>>,
}

impl<C> Default for SoundMixer<C> {
    fn default() -> Self {
        SoundMixer {
            current: HashMap::new(),
        }
    }
}

impl<C: AudioClip> SoundMixer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&mut self, states: &[SoundState], library: &SoundLibrary<C>, muted: bool) {
        self.current.retain(|id, sound| {
            let present = states.iter().any(|state| &state.id == id);
            if !present {
                log::debug!("sound {id} is gone, stopping it");
                sound.stop();
            }
            present
        });

        for state in states {
            let mut state = state.clone();
            if muted {
                state.volume = 0.0;
            }

            if !self.current.contains_key(&state.id) {
                let Some(clip) = library.get(&state.file) else {
                    log::warn!("sound file {} not found, ignoring {}", state.file, state.id);
                    continue;
                };
                self.current
                    .insert(state.id.clone(), GameSound::new(state.clone(), clip.clone()));
            }

            if let Some(sound) = self.current.get_mut(&state.id) {
                sound.update(state);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&GameSound<C>> {
        self.current.get(id)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Stop every tracked sound and forget it.
    pub fn release_all(&mut self) {
        for (_, mut sound) in self.current.drain() {
            sound.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::types::SoundStatus;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Play,
        Pause,
        Stop,
        Volume(f64),
        Loop(bool),
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingClip {
        calls: Rc<RefCell<Vec<Call>>>,
        loaded: Rc<RefCell<bool>>,
    }

    impl RecordingClip {
        fn loaded() -> Self {
            let clip = RecordingClip::default();
            *clip.loaded.borrow_mut() = true;
            clip
        }

        fn transitions(&self) -> Vec<Call> {
            self.calls
                .borrow()
                .iter()
                .filter(|c| matches!(c, Call::Play | Call::Pause | Call::Stop))
                .cloned()
                .collect()
        }

        fn volumes(&self) -> Vec<f64> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Call::Volume(v) => Some(*v),
                    _ => None,
                })
                .collect()
        }
    }

    impl AudioClip for RecordingClip {
        fn is_loaded(&self) -> bool {
            *self.loaded.borrow()
        }
        fn play(&mut self) {
            self.calls.borrow_mut().push(Call::Play);
        }
        fn pause(&mut self) {
            self.calls.borrow_mut().push(Call::Pause);
        }
        fn stop(&mut self) {
            self.calls.borrow_mut().push(Call::Stop);
        }
        fn set_loop(&mut self, looped: bool) {
            self.calls.borrow_mut().push(Call::Loop(looped));
        }
        fn set_volume(&mut self, volume: f64) {
            self.calls.borrow_mut().push(Call::Volume(volume));
        }
    }

    fn state(id: &str, status: SoundStatus, volume: f64) -> SoundState {
        SoundState {
            id: id.into(),
            file: "music.mp3".into(),
            status,
            volume,
            looped: false,
        }
    }

    fn library(clip: &RecordingClip) -> SoundLibrary<RecordingClip> {
        let mut library = SoundLibrary::new();
        library.insert("music.mp3", clip.clone());
        library
    }

    #[test]
    fn test_unchanged_states_play_once() {
        let clip = RecordingClip::loaded();
        let library = library(&clip);
        let mut mixer = SoundMixer::new();
        let states = vec![state("s1", SoundStatus::Played, 1.0)];

        mixer.reconcile(&states, &library, false);
        mixer.reconcile(&states, &library, false);

        assert_eq!(clip.transitions(), vec![Call::Play]);
        assert!(mixer.get("s1").unwrap().has_started());
    }

    #[test]
    fn test_status_change_is_issued() {
        let clip = RecordingClip::loaded();
        let library = library(&clip);
        let mut mixer = SoundMixer::new();

        mixer.reconcile(&[state("s1", SoundStatus::Played, 1.0)], &library, false);
        mixer.reconcile(&[state("s1", SoundStatus::Paused, 1.0)], &library, false);
        mixer.reconcile(&[state("s1", SoundStatus::Paused, 1.0)], &library, false);

        assert_eq!(clip.transitions(), vec![Call::Play, Call::Pause]);
    }

    #[test]
    fn test_disappeared_sound_is_stopped_once_and_evicted() {
        let clip = RecordingClip::loaded();
        let library = library(&clip);
        let mut mixer = SoundMixer::new();

        mixer.reconcile(&[state("s1", SoundStatus::Played, 1.0)], &library, false);
        mixer.reconcile(&[], &library, false);
        mixer.reconcile(&[], &library, false);

        assert_eq!(clip.transitions(), vec![Call::Play, Call::Stop]);
        assert!(mixer.get("s1").is_none());
    }

    #[test]
    fn test_not_loaded_waits_until_loaded() {
        let clip = RecordingClip::default();
        let library = library(&clip);
        let mut mixer = SoundMixer::new();
        let states = vec![state("s1", SoundStatus::Played, 1.0)];

        mixer.reconcile(&states, &library, false);
        assert!(clip.transitions().is_empty());
        assert!(!mixer.get("s1").unwrap().has_started());

        *clip.loaded.borrow_mut() = true;
        mixer.reconcile(&states, &library, false);
        assert_eq!(clip.transitions(), vec![Call::Play]);
    }

    #[test]
    fn test_muted_forces_zero_volume() {
        let clip = RecordingClip::loaded();
        let library = library(&clip);
        let mut mixer = SoundMixer::new();

        for volume in [1.0, 0.3, 0.8] {
            mixer.reconcile(&[state("s1", SoundStatus::Played, volume)], &library, true);
        }

        assert_eq!(clip.volumes(), vec![0.0, 0.0, 0.0]);
        assert_eq!(mixer.get("s1").unwrap().last_state().volume, 0.0);
    }

    #[test]
    fn test_missing_file_creates_nothing() {
        let library = SoundLibrary::<RecordingClip>::new();
        let mut mixer = SoundMixer::new();

        mixer.reconcile(&[state("s1", SoundStatus::Played, 1.0)], &library, false);

        assert!(mixer.is_empty());
    }

    #[test]
    fn test_release_all_stops_everything() {
        let clip = RecordingClip::loaded();
        let library = library(&clip);
        let mut mixer = SoundMixer::new();
        mixer.reconcile(
            &[
                state("s1", SoundStatus::Played, 1.0),
                state("s2", SoundStatus::Paused, 1.0),
            ],
            &library,
            false,
        );

        mixer.release_all();

        assert!(mixer.is_empty());
        assert_eq!(clip.transitions().iter().filter(|c| **c == Call::Stop).count(), 2);
    }
}
