pub mod buffer;
pub mod catalog;
pub mod config;
pub mod decoder;
pub mod dsp;
pub mod error;
pub mod mood;
pub mod pipeline;
pub mod suggest;
pub mod wav;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

use crate::decoder::{AudioDecoder, DefaultDecoder};
use crate::dsp::MoodProcessor;
use crate::suggest::{EnergyHeuristic, MoodSuggester};

pub use crate::buffer::PcmBuffer;
pub use crate::catalog::{GeneratedSong, SongCatalog};
pub use crate::error::{AudioError, CatalogError, PipelineError};
pub use crate::mood::Mood;
pub use crate::pipeline::{GenerationState, Generator};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the moodwalker-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Decode a recording and apply a mood, returning WAV bytes.
/// Unknown mood labels leave the audio unchanged.
pub fn transform_recording(bytes: &[u8], mood: &str, seed: u64) -> Result<Vec<u8>, AudioError> {
    let buffer = DefaultDecoder.decode(bytes)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let out = MoodProcessor::default().transform_label(&buffer, mood, &mut rng)?;
    wav::encode(&out)
}

/// WASM-exposed: transform an encoded recording into a WAV byte array.
#[wasm_bindgen]
pub fn generate_mood_wav(bytes: &[u8], mood: &str, seed: u64) -> Result<Vec<u8>, JsValue> {
    transform_recording(bytes, mood, seed).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: suggest a mood for a recording as `{ mood, confidence }`.
#[wasm_bindgen]
pub fn suggest_mood(bytes: &[u8], seed: u64) -> Result<JsValue, JsValue> {
    let buffer = DefaultDecoder
        .decode(bytes)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let suggestion = EnergyHeuristic::default().suggest(&buffer, &mut rng);
    serde_wasm_bindgen::to_value(&suggestion).map_err(|e| JsValue::from_str(&format!("{e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(core_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn transform_recording_outputs_wav() {
        let input = wav::encode(&PcmBuffer::mono(8000, vec![0.2; 800])).unwrap();
        let out = transform_recording(&input, "sad", 1).unwrap();
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(wav::decode(&out).unwrap().frames(), 800);
    }

    #[test]
    fn unknown_label_round_trips_audio() {
        let src = PcmBuffer::mono(8000, vec![0.25, -0.5, 0.75]);
        let input = wav::encode(&src).unwrap();
        let out = transform_recording(&input, "melancholy", 1).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            transform_recording(b"nope", "happy", 0),
            Err(AudioError::Decode(_))
        ));
    }
}
