//! DSP: mood transforms over decoded PCM buffers.
//!
//! All processing is offline and deterministic given the RNG, so the same
//! code backs the WASM exports, the async pipeline and the CLI.

pub mod echo;
pub mod processor;
pub mod shaper;
pub mod smoothing;
pub mod stretch;

pub use processor::{MoodProcessor, ProcessorConfig};
