//! Generation pipeline: decode, transform, encode, catalog.
//!
//! A run walks `Idle → Analyzing → ExtractingFeatures → Generating →
//! Complete`, or drops to `Failed` from any active state. The catalog is
//! touched only by the final commit, so a failed or abandoned run never
//! leaves a partial entry behind.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use rand::{Rng, RngCore};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::buffer::PcmBuffer;
use crate::catalog::{GeneratedSong, MemoryPlayback, PlaybackProvider, RenderedAudio, SongCatalog};
use crate::config::GeneratorConfig;
use crate::decoder::{AudioDecoder, DefaultDecoder};
use crate::dsp::MoodProcessor;
use crate::error::PipelineError;
use crate::mood::Mood;
use crate::suggest::{MoodSuggester, MoodSuggestion};
use crate::wav;

// ── State machine ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationState {
    Idle,
    Analyzing,
    ExtractingFeatures,
    Generating,
    Complete,
    Failed,
}

impl GenerationState {
    /// Presentation hint, 0–100.
    pub fn progress(self) -> u8 {
        match self {
            GenerationState::Idle | GenerationState::Failed => 0,
            GenerationState::Analyzing => 15,
            GenerationState::ExtractingFeatures => 40,
            GenerationState::Generating => 70,
            GenerationState::Complete => 100,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GenerationState::Complete | GenerationState::Failed)
    }

    pub fn can_transition_to(self, next: GenerationState) -> bool {
        use GenerationState::*;
        match (self, next) {
            (Idle, Analyzing)
            | (Analyzing, ExtractingFeatures)
            | (ExtractingFeatures, Generating)
            | (Generating, Complete) => true,
            (Analyzing | ExtractingFeatures | Generating, Failed) => true,
            _ => false,
        }
    }
}

/// Receives every state change of a run.
pub trait ProgressObserver: Send + Sync {
    fn on_state(&self, state: GenerationState, progress: u8);
}

impl<F> ProgressObserver for F
where
    F: Fn(GenerationState, u8) + Send + Sync,
{
    fn on_state(&self, state: GenerationState, progress: u8) {
        self(state, progress)
    }
}

/// Tracks one pipeline run.
struct Run {
    id: Uuid,
    state: GenerationState,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl Run {
    fn new(id: Uuid, observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        Run {
            id,
            state: GenerationState::Idle,
            observer,
        }
    }

    fn advance(&mut self, next: GenerationState) {
        if !self.state.can_transition_to(next) {
            error!(run = %self.id, from = ?self.state, to = ?next, "illegal state transition");
            return;
        }
        debug!(run = %self.id, from = ?self.state, to = ?next, "state change");
        self.state = next;
        if let Some(obs) = &self.observer {
            obs.on_state(next, next.progress());
        }
    }

    fn fail(&mut self, err: PipelineError) -> PipelineError {
        if err.is_defect() {
            error!(run = %self.id, stage = ?self.state, "pipeline defect: {err}");
        } else {
            warn!(run = %self.id, stage = ?self.state, "generation failed: {err}");
        }
        self.advance(GenerationState::Failed);
        err
    }
}

/// Summary statistics taken between decoding and generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: usize,
    pub peak: f32,
    pub rms: f32,
}

impl AudioFeatures {
    pub fn extract(buffer: &PcmBuffer) -> Self {
        AudioFeatures {
            duration_seconds: buffer.duration_seconds(),
            sample_rate: buffer.sample_rate,
            channels: buffer.channel_count(),
            peak: buffer.peak(),
            rms: buffer.rms(),
        }
    }
}

// ── Generator ───────────────────────────────────────────────

/// Owns the collaborators of a generation and the process-wide catalog.
pub struct Generator {
    decoder: Arc<dyn AudioDecoder>,
    processor: MoodProcessor,
    catalog: Arc<SongCatalog>,
    playback: Arc<dyn PlaybackProvider>,
    suggester: Arc<dyn MoodSuggester>,
    observer: Option<Arc<dyn ProgressObserver>>,
    title_template: String,
    /// Serializes handle acquisition, catalog append and release of the
    /// evicted handle, so at most one new handle is staged at a time.
    commit: Mutex<()>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let catalog = SongCatalog::with_capacity(config.catalog_capacity);
        // A full catalog holds `capacity` handles and one more is staged
        // before the oldest song is evicted.
        let min_handles = catalog.capacity() + 1;
        if config.max_playback_handles < min_handles {
            warn!(
                configured = config.max_playback_handles,
                required = min_handles,
                "raising playback handle limit to fit the catalog"
            );
        }
        let handles = config.max_playback_handles.max(min_handles);

        Generator {
            decoder: Arc::new(DefaultDecoder),
            processor: MoodProcessor::new(config.processor),
            catalog: Arc::new(catalog),
            playback: Arc::new(MemoryPlayback::new(handles)),
            suggester: Arc::new(config.suggester),
            observer: None,
            title_template: config.title_template,
            commit: Mutex::new(()),
        }
    }

    pub fn with_decoder(mut self, decoder: impl AudioDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn with_playback(mut self, playback: Arc<dyn PlaybackProvider>) -> Self {
        self.playback = playback;
        self
    }

    pub fn with_suggester(mut self, suggester: impl MoodSuggester + 'static) -> Self {
        self.suggester = Arc::new(suggester);
        self
    }

    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn catalog(&self) -> &Arc<SongCatalog> {
        &self.catalog
    }

    pub fn playback(&self) -> &Arc<dyn PlaybackProvider> {
        &self.playback
    }

    pub fn title_for(&self, mood: Mood) -> String {
        self.title_template.replace("{mood}", mood.display_name())
    }

    fn require<'a>(
        source: Option<&'a [u8]>,
        mood: Option<Mood>,
    ) -> Result<(&'a [u8], Mood), PipelineError> {
        let source = source
            .filter(|s| !s.is_empty())
            .ok_or(PipelineError::MissingInput("no audio recording provided"))?;
        let mood = mood.ok_or(PipelineError::MissingInput("no mood selected"))?;
        Ok((source, mood))
    }

    /// Run the whole pipeline on the calling thread.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        source: Option<&[u8]>,
        mood: Option<Mood>,
        rng: &mut R,
    ) -> Result<Arc<GeneratedSong>, PipelineError> {
        let (source, mood) = Self::require(source, mood)?;
        let mut run = Run::new(Uuid::new_v4(), self.observer.clone());
        info!(run = %run.id, %mood, bytes = source.len(), "generation started");

        let rendered = match self.render(&mut run, source, mood, rng) {
            Ok(r) => r,
            Err(e) => return Err(run.fail(e)),
        };
        self.finish(run, rendered)
    }

    /// Run the pipeline with decode, DSP and encoding on tokio's blocking
    /// pool. Dropping the returned future before it resolves discards the
    /// work without touching the catalog.
    #[cfg(feature = "pipeline")]
    pub async fn generate_async(
        self: &Arc<Self>,
        source: Option<Vec<u8>>,
        mood: Option<Mood>,
        seed: Option<u64>,
    ) -> Result<Arc<GeneratedSong>, PipelineError> {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let (_, mood) = Self::require(source.as_deref(), mood)?;
        let source = source.unwrap_or_default();
        let run_id = Uuid::new_v4();
        info!(run = %run_id, %mood, bytes = source.len(), "generation started");

        let this = Arc::clone(self);
        let observer = self.observer.clone();
        let job = tokio::task::spawn_blocking(move || {
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            };
            let mut run = Run::new(run_id, this.observer.clone());
            let result = this.render(&mut run, &source, mood, &mut rng);
            (run, result)
        });

        match job.await {
            Ok((run, Ok(rendered))) => self.finish(run, rendered),
            Ok((mut run, Err(e))) => Err(run.fail(e)),
            Err(join) => {
                let mut run = Run::new(run_id, observer);
                run.state = GenerationState::Generating;
                Err(run.fail(PipelineError::GenerationFailure(format!(
                    "worker task ended abnormally: {join}"
                ))))
            }
        }
    }

    /// Decode and analyse a recording, then ask the suggester for a mood.
    pub fn suggest(
        &self,
        source: &[u8],
        rng: &mut dyn RngCore,
    ) -> Result<MoodSuggestion, PipelineError> {
        let buffer = self.decoder.decode(source)?;
        Ok(self.suggester.suggest(&buffer, rng))
    }

    /// Analyzing → ExtractingFeatures → Generating. Produces WAV bytes but
    /// does not catalog them.
    fn render<R: Rng + ?Sized>(
        &self,
        run: &mut Run,
        source: &[u8],
        mood: Mood,
        rng: &mut R,
    ) -> Result<RenderedAudio, PipelineError> {
        run.advance(GenerationState::Analyzing);
        let buffer = self.decoder.decode(source)?;

        run.advance(GenerationState::ExtractingFeatures);
        buffer.validate()?;
        let features = AudioFeatures::extract(&buffer);
        debug!(run = %run.id, ?features, "extracted features");

        run.advance(GenerationState::Generating);
        let processor = &self.processor;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let transformed = processor.transform(&buffer, mood, &mut *rng)?;
            wav::encode(&transformed)
        }));
        let wav = match outcome {
            Ok(result) => result?,
            Err(_) => {
                return Err(PipelineError::GenerationFailure(
                    "mood transform panicked".to_string(),
                ));
            }
        };

        Ok(RenderedAudio::new(mood, wav, features.duration_seconds))
    }

    /// Acquire a playback handle, catalog the song, release whatever the
    /// catalog evicted. Only this step mutates shared state, and it runs
    /// under `commit` so overlapping runs never compete for the spare handle.
    fn finish(
        &self,
        mut run: Run,
        rendered: RenderedAudio,
    ) -> Result<Arc<GeneratedSong>, PipelineError> {
        let commit = self.commit.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = match self.playback.acquire(Arc::clone(&rendered.wav)) {
            Ok(h) => h,
            Err(e) => {
                drop(commit);
                return Err(run.fail(PipelineError::SaveFailure {
                    message: e.to_string(),
                    audio: rendered,
                }));
            }
        };

        let title = self.title_for(rendered.mood);
        let song = Arc::new(GeneratedSong::new(rendered, title, handle));
        if let Some(evicted) = self.catalog.append(Arc::clone(&song)) {
            debug!(song = %evicted.id, "evicted oldest song");
            self.playback.release(&evicted.handle);
        }
        drop(commit);

        run.advance(GenerationState::Complete);
        info!(
            run = %run.id,
            song = %song.id,
            mood = %song.mood,
            bytes = song.wav.len(),
            "generation complete"
        );
        Ok(song)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Generator::new(GeneratorConfig::default())
    }
}
