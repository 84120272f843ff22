use crate::interpreter::{GAME_FQN, Interpreter};
use crate::project::{GameProject, ProjectError};
use crate::projection::{
    board_state, build_key_press_event, canvas_resolution, flush_events, queue_event,
    sound_state, visual_state,
};
use crate::types::{BoardState, MediaFile, Resolution, SoundState, VisualState};

use super::{Game, GameError};

/// A game whose state is read live from an interpreter.
pub struct LocalGame<I> {
    project: GameProject,
    interpreter: I,
}

impl<I: Interpreter> LocalGame<I> {
    pub fn new(project: GameProject, interpreter: I) -> Self {
        LocalGame {
            project,
            interpreter,
        }
    }

    pub fn project(&self) -> &GameProject {
        &self.project
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut I {
        &mut self.interpreter
    }

    fn collection(&self, field: &str) -> Result<Vec<String>, GameError> {
        let game = self.interpreter.object(GAME_FQN)?;
        Ok(self
            .interpreter
            .get(&game, field)
            .and_then(|c| self.interpreter.inner_collection(&c))
            .unwrap_or_default())
    }
}

impl<I: Interpreter> Game for LocalGame<I> {
    fn start(&mut self) -> Result<(), GameError> {
        let program = self
            .interpreter
            .program_in(&self.project.main)
            .ok_or_else(|| ProjectError::NoProgram(self.project.main.clone()))?;
        log::info!("starting {program}");
        self.interpreter.exec_program(&program)?;
        Ok(())
    }

    fn running(&self) -> Result<bool, GameError> {
        let game = self.interpreter.object(GAME_FQN)?;
        Ok(self
            .interpreter
            .get(&game, "running")
            .and_then(|r| self.interpreter.inner_boolean(&r))
            .unwrap_or(false))
    }

    fn board(&self) -> Result<BoardState, GameError> {
        let game = self.interpreter.object(GAME_FQN)?;
        Ok(board_state(&self.interpreter, &game)?)
    }

    fn visuals(&mut self) -> Result<Vec<VisualState>, GameError> {
        let visuals = self.collection("visuals")?;
        let mut states = Vec::with_capacity(visuals.len());
        for visual in &visuals {
            states.push(visual_state(&mut self.interpreter, visual)?);
        }
        Ok(states)
    }

    fn sound_states(&self) -> Result<Vec<SoundState>, GameError> {
        self.collection("sounds")?
            .iter()
            .map(|sound| sound_state(&self.interpreter, sound).map_err(GameError::from))
            .collect()
    }

    fn canvas_resolution(&self) -> Result<Resolution, GameError> {
        Ok(canvas_resolution(&self.interpreter)?)
    }

    fn queue_event(&mut self, events: &[&str]) -> Result<(), GameError> {
        let events: Vec<_> = events
            .iter()
            .map(|code| build_key_press_event(&mut self.interpreter, code))
            .collect();
        Ok(queue_event(&mut self.interpreter, &events)?)
    }

    fn flush_events(&mut self, ms: f64) -> Result<(), GameError> {
        Ok(flush_events(&mut self.interpreter, ms)?)
    }

    fn images(&self) -> Vec<MediaFile> {
        self.project.images.clone()
    }

    fn sounds(&self) -> Vec<MediaFile> {
        self.project.sounds.clone()
    }
}
