//! Series and episode model shared by the history store and the emitter.

mod types;

pub use types::*;
