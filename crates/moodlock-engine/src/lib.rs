//! moodlock-engine — Runs a mood session on its own thread behind an async handle.

pub mod config;
pub mod engine;

pub use config::{Config, ConfigError};
pub use engine::{spawn_engine, spawn_session, EngineError, EngineHandle, LockStatus};
