use thiserror::Error;

use crate::catalog::RenderedAudio;

/// Errors raised by the audio layer: decoding, buffer validation, encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid audio buffer: {0}")]
    InvalidAudioBuffer(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Errors raised by the song catalog and its playback resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("song '{0}' not found")]
    NotFound(String),

    #[error("no playback handle available ({live} live, limit {limit})")]
    HandleExhausted { live: usize, limit: usize },
}

/// Typed failures surfaced at the generation pipeline boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    #[error("could not read the recording: {0}")]
    Decode(String),

    #[error("invalid audio buffer: {0}")]
    InvalidAudioBuffer(String),

    #[error("could not encode WAV output: {0}")]
    Encoding(String),

    #[error("generation failed: {0}")]
    GenerationFailure(String),

    /// The song was rendered but could not be cataloged. The rendered audio
    /// is handed back so the caller can still offer it for download.
    #[error("generated song could not be saved: {message}")]
    SaveFailure {
        message: String,
        audio: RenderedAudio,
    },
}

impl PipelineError {
    /// Contract violations (bad buffer shape) rather than user-recoverable failures.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidAudioBuffer(_) | PipelineError::Encoding(_)
        )
    }

    /// Rendered bytes carried by a save failure, if any.
    pub fn recovered_audio(&self) -> Option<&RenderedAudio> {
        match self {
            PipelineError::SaveFailure { audio, .. } => Some(audio),
            _ => None,
        }
    }
}

impl From<AudioError> for PipelineError {
    fn from(e: AudioError) -> Self {
        match e {
            AudioError::Decode(msg) => PipelineError::Decode(msg),
            AudioError::InvalidAudioBuffer(msg) => PipelineError::InvalidAudioBuffer(msg),
            AudioError::Encoding(msg) => PipelineError::Encoding(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_errors_map_to_pipeline_taxonomy() {
        let e: PipelineError = AudioError::Decode("bad header".into()).into();
        assert!(matches!(e, PipelineError::Decode(ref m) if m == "bad header"));
        assert!(!e.is_defect());

        let e: PipelineError = AudioError::InvalidAudioBuffer("no channels".into()).into();
        assert!(e.is_defect());

        let e: PipelineError = AudioError::Encoding("zero sample rate".into()).into();
        assert!(e.is_defect());
    }

    #[test]
    fn messages_are_human_readable() {
        let e = PipelineError::MissingInput("mood");
        assert_eq!(e.to_string(), "missing input: mood");

        let e = CatalogError::HandleExhausted { live: 3, limit: 3 };
        assert_eq!(e.to_string(), "no playback handle available (3 live, limit 3)");
    }
}
