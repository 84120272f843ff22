use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::{Asset, BoardState, MediaFile, Resolution, SoundState, VisualState};

use super::{Game, GameError};

/// Outgoing half of the connection to a remote game server.
pub trait RemoteLink {
    fn emit(&mut self, event: &str, payload: Value);
}

/// Messages pushed by the game server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RemoteMessage {
    Board(BoardState),
    Visuals(Vec<VisualState>),
    Sounds(Vec<SoundState>),
    Images(Vec<Asset>),
    Music(Vec<Asset>),
    Error(Value),
}

/// A game mirroring the snapshots a remote server pushes. Each message
/// overwrites the previous value of its part of the snapshot.
pub struct SocketGame<L> {
    link: L,
    board: Option<BoardState>,
    visuals: Vec<VisualState>,
    sound_states: Vec<SoundState>,
    images: Vec<MediaFile>,
    sounds: Vec<MediaFile>,
    running: bool,
}

impl<L: RemoteLink> SocketGame<L> {
    pub fn new(mut link: L) -> Self {
        link.emit("ready", Value::Null);
        SocketGame {
            link,
            board: None,
            visuals: Vec::new(),
            sound_states: Vec::new(),
            images: Vec::new(),
            sounds: Vec::new(),
            running: false,
        }
    }

    pub fn receive(&mut self, message: RemoteMessage) {
        match message {
            RemoteMessage::Board(board) => self.board = Some(board),
            RemoteMessage::Visuals(visuals) => self.visuals = visuals,
            RemoteMessage::Sounds(sounds) => self.sound_states = sounds,
            RemoteMessage::Images(assets) => self.images.extend(assets.into_iter().map(as_media)),
            RemoteMessage::Music(assets) => self.sounds.extend(assets.into_iter().map(as_media)),
            RemoteMessage::Error(error) => log::error!("game server error: {error}"),
        }
    }

    /// Decode and apply one raw `{"event": ..., "data": ...}` message.
    pub fn receive_json(&mut self, raw: &str) -> serde_json::Result<()> {
        let message = serde_json::from_str(raw)?;
        self.receive(message);
        Ok(())
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

fn as_media(asset: Asset) -> MediaFile {
    MediaFile {
        possible_paths: vec![asset.name],
        url: asset.url,
    }
}

impl<L: RemoteLink> Game for SocketGame<L> {
    fn start(&mut self) -> Result<(), GameError> {
        self.running = true;
        Ok(())
    }

    fn running(&self) -> Result<bool, GameError> {
        Ok(self.running)
    }

    fn board(&self) -> Result<BoardState, GameError> {
        self.board.clone().ok_or(GameError::NoSnapshot("board"))
    }

    fn visuals(&mut self) -> Result<Vec<VisualState>, GameError> {
        Ok(self.visuals.clone())
    }

    fn sound_states(&self) -> Result<Vec<SoundState>, GameError> {
        Ok(self.sound_states.clone())
    }

    fn canvas_resolution(&self) -> Result<Resolution, GameError> {
        Ok(self.board()?.resolution())
    }

    fn queue_event(&mut self, events: &[&str]) -> Result<(), GameError> {
        self.link.emit("keyPressed", json!(events));
        Ok(())
    }

    fn flush_events(&mut self, _ms: f64) -> Result<(), GameError> {
        // The server flushes its own events.
        Ok(())
    }

    fn images(&self) -> Vec<MediaFile> {
        self.images.clone()
    }

    fn sounds(&self) -> Vec<MediaFile> {
        self.sounds.clone()
    }
}
