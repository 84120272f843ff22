//! Where per-frame game state comes from.
//!
//! - `LocalGame`: computes state live from an interpreter it owns
//! - `SocketGame`: mirrors snapshots pushed by a remote game server
//!
//! Both implement `Game`; the host picks one at construction time.

mod local;
mod socket;

pub use local::LocalGame;
pub use socket::{RemoteLink, RemoteMessage, SocketGame};

use thiserror::Error;

use crate::interpreter::RuntimeError;
use crate::project::ProjectError;
use crate::types::{BoardState, MediaFile, Resolution, SoundState, VisualState};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error("interpreter failure: {0}")]
    Runtime(#[from] RuntimeError),
    #[error("no {0} received from the game server yet")]
    NoSnapshot(&'static str),
}

pub trait Game {
    /// Run the game's program. Fails before any frame is stepped when the
    /// program cannot be found.
    fn start(&mut self) -> Result<(), GameError>;

    fn running(&self) -> Result<bool, GameError>;

    fn board(&self) -> Result<BoardState, GameError>;

    /// Visual states in the program's collection order.
    fn visuals(&mut self) -> Result<Vec<VisualState>, GameError>;

    fn sound_states(&self) -> Result<Vec<SoundState>, GameError>;

    fn canvas_resolution(&self) -> Result<Resolution, GameError>;

    fn queue_event(&mut self, events: &[&str]) -> Result<(), GameError>;

    /// Deliver queued input events, stamped with the frame clock.
    fn flush_events(&mut self, ms: f64) -> Result<(), GameError>;

    fn images(&self) -> Vec<MediaFile>;

    fn sounds(&self) -> Vec<MediaFile>;
}
