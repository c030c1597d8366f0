//! Crate-wide error wrapper.
//!
//! Steady-state per-frame paths (`World::get_block`, `World::set_block`,
//! dispatch, render) never return `Result` — per-module errors below are
//! only surfaced at construction, shutdown, and from the persistence
//! thread's internal recovery logging.

use crate::persistence::PersistenceError;
use crate::world::WorldError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
