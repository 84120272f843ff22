pub mod assets;
pub mod config;
pub mod diagram;
pub mod game;
pub mod interpreter;
pub mod menubar;
pub mod player;
pub mod project;
pub mod projection;
pub mod renderer;
pub mod sketch;
pub mod sound;
pub mod stepper;
pub mod types;
