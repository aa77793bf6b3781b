//! Mood signal processor: per-channel, per-sample mood transforms.
//!
//! Every transform reads an immutable `PcmBuffer` and produces a new buffer
//! with the same sample rate, channel count and length. Channels are
//! processed independently; nothing is shared between them except the
//! caller's RNG, which only the happy transform draws from.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::echo::{EchoTap, TapEcho};
use super::shaper::{limit, pulse_boost, sign_power, soft_clip, BeatGate};
use super::smoothing::OutputSmoother;
use super::stretch::{stretch, stretch_index};
use crate::buffer::PcmBuffer;
use crate::error::AudioError;
use crate::mood::Mood;

// ── Per-mood parameters ─────────────────────────────────────

/// Brightening: faster index stretch, gain drop, sparkle dither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HappyParams {
    /// Index stretch rate, 1.05–1.15.
    pub rate: f64,
    /// Output gain.
    pub gain: f32,
    /// Uniform dither amplitude; noise is drawn from `[-dither, dither]`.
    pub dither: f32,
}

impl Default for HappyParams {
    fn default() -> Self {
        Self {
            rate: 1.1,
            gain: 0.8,
            dither: 0.05,
        }
    }
}

/// Smoothing: slow stretch, recursive low-pass, normalized decaying echo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalmParams {
    /// Index stretch rate, 0.75–0.95.
    pub rate: f64,
    /// Weight of the incoming sample in the low-pass.
    pub smoothing_current: f32,
    /// Share of the feedback weight given to `y[-1]` (the rest goes to `y[-2]`).
    pub smoothing_recent_share: f32,
    /// Spacing between echo taps in seconds.
    pub echo_spacing: f64,
    /// Number of echo taps (0 disables the echo).
    pub echo_taps: usize,
    /// Gain of the first echo tap.
    pub echo_gain: f32,
    /// Gain ratio between consecutive taps.
    pub echo_decay: f32,
    /// Level applied to the dry/echo average.
    pub level: f32,
    /// Output ceiling, at most 0.9.
    pub ceiling: f32,
}

impl Default for CalmParams {
    fn default() -> Self {
        Self {
            rate: 0.85,
            smoothing_current: 0.4,
            smoothing_recent_share: 0.35 / 0.6,
            echo_spacing: 0.2,
            echo_taps: 3,
            echo_gain: 0.3,
            echo_decay: 0.5,
            level: 0.85,
            ceiling: 0.9,
        }
    }
}

/// Drive: fast stretch, tanh saturation, periodic beat boost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnergeticParams {
    pub rate: f64,
    /// Saturation drive, 1.25–1.5.
    pub drive: f32,
    /// Beat period in seconds.
    pub beat_period: f64,
    /// Fraction of each period the boost is active.
    pub beat_duty: f64,
    /// Beat boost gain, 1.2–1.4.
    pub beat_boost: f32,
}

impl Default for EnergeticParams {
    fn default() -> Self {
        Self {
            rate: 1.2,
            drive: 1.4,
            beat_period: 0.33,
            beat_duty: 0.25,
            beat_boost: 1.3,
        }
    }
}

/// Droop: slow stretch, gain drop, one echo from the unstretched signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SadParams {
    /// Index stretch rate, 0.85–0.9.
    pub rate: f64,
    pub gain: f32,
    /// Echo delay in seconds, 0.3–0.45.
    pub echo_delay: f64,
    /// Echo gain, 0.3–0.35.
    pub echo_gain: f32,
}

impl Default for SadParams {
    fn default() -> Self {
        Self {
            rate: 0.88,
            gain: 0.7,
            echo_delay: 0.35,
            echo_gain: 0.3,
        }
    }
}

/// Aggression: power-curve distortion, bass pulses, aperiodic beat gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AngryParams {
    /// Exponent of `sign(x)·|x|^p`.
    pub exponent: f32,
    /// Boost every n-th sample (2 or 3).
    pub bass_every: usize,
    /// Bass pulse gain, 1.3–1.4.
    pub bass_boost: f32,
    /// Gate period in seconds; deliberately not a whole number of samples.
    pub gate_period: f64,
    /// Active window at the start of each gate period, in seconds.
    pub gate_window: f64,
    pub gate_boost: f32,
}

impl Default for AngryParams {
    fn default() -> Self {
        Self {
            exponent: 0.7,
            bass_every: 3,
            bass_boost: 1.35,
            gate_period: 0.2137,
            gate_window: 0.05,
            gate_boost: 1.25,
        }
    }
}

/// Parameters for all five mood transforms.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessorConfig {
    pub happy: HappyParams,
    pub calm: CalmParams,
    pub energetic: EnergeticParams,
    pub sad: SadParams,
    pub angry: AngryParams,
}

impl ProcessorConfig {
    /// Clamp every parameter into the range its transform is defined for.
    pub fn sanitized(mut self) -> Self {
        let h = &mut self.happy;
        h.rate = h.rate.clamp(1.05, 1.15);
        h.gain = h.gain.clamp(0.0, 1.0);
        h.dither = h.dither.clamp(0.0, 0.05);

        let c = &mut self.calm;
        c.rate = c.rate.clamp(0.75, 0.95);
        c.smoothing_current = c.smoothing_current.clamp(0.05, 1.0);
        c.smoothing_recent_share = c.smoothing_recent_share.clamp(0.0, 1.0);
        c.echo_spacing = c.echo_spacing.clamp(0.0, 2.0);
        c.echo_taps = c.echo_taps.min(3);
        c.echo_gain = c.echo_gain.clamp(0.0, 0.5);
        c.echo_decay = c.echo_decay.clamp(0.0, 1.0);
        c.level = c.level.clamp(0.0, 1.0);
        c.ceiling = c.ceiling.clamp(0.0, 0.9);

        let e = &mut self.energetic;
        e.rate = e.rate.clamp(0.5, 2.0);
        e.drive = e.drive.clamp(1.25, 1.5);
        e.beat_period = e.beat_period.clamp(0.01, 4.0);
        e.beat_duty = e.beat_duty.clamp(0.0, 1.0);
        e.beat_boost = e.beat_boost.clamp(1.2, 1.4);

        let s = &mut self.sad;
        s.rate = s.rate.clamp(0.85, 0.9);
        s.gain = s.gain.clamp(0.0, 1.0);
        s.echo_delay = s.echo_delay.clamp(0.3, 0.45);
        s.echo_gain = s.echo_gain.clamp(0.3, 0.35);

        let a = &mut self.angry;
        a.exponent = a.exponent.clamp(0.1, 1.0);
        a.bass_every = a.bass_every.clamp(2, 3);
        a.bass_boost = a.bass_boost.clamp(1.3, 1.4);
        a.gate_period = a.gate_period.clamp(0.01, 4.0);
        a.gate_window = a.gate_window.clamp(0.0, a.gate_period);
        a.gate_boost = a.gate_boost.clamp(1.0, 2.0);

        self
    }
}

// ── Processor ───────────────────────────────────────────────

/// Applies one mood transform to every channel of a buffer.
#[derive(Debug, Clone, Default)]
pub struct MoodProcessor {
    config: ProcessorConfig,
}

impl MoodProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        MoodProcessor {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Transform `input` for `mood`. The RNG feeds the happy dither and is
    /// left untouched by every other mood.
    pub fn transform<R: Rng + ?Sized>(
        &self,
        input: &PcmBuffer,
        mood: Mood,
        rng: &mut R,
    ) -> Result<PcmBuffer, AudioError> {
        input.validate()?;
        debug!(
            %mood,
            channels = input.channel_count(),
            frames = input.frames(),
            sample_rate = input.sample_rate,
            "applying mood transform"
        );

        let sr = input.sample_rate;
        let channels = input
            .channels
            .iter()
            .map(|ch| match mood {
                Mood::Happy => happy(ch, &self.config.happy, &mut *rng),
                Mood::Calm => calm(ch, sr, &self.config.calm),
                Mood::Energetic => energetic(ch, sr, &self.config.energetic),
                Mood::Sad => sad(ch, sr, &self.config.sad),
                Mood::Angry => angry(ch, sr, &self.config.angry),
            })
            .collect();

        Ok(PcmBuffer::new(sr, channels))
    }

    /// Transform by free-form label. Labels outside the mood set pass the
    /// audio through unchanged.
    pub fn transform_label<R: Rng + ?Sized>(
        &self,
        input: &PcmBuffer,
        label: &str,
        rng: &mut R,
    ) -> Result<PcmBuffer, AudioError> {
        match Mood::parse_lenient(label) {
            Some(mood) => self.transform(input, mood, rng),
            None => {
                input.validate()?;
                warn!(label, "unrecognized mood, passing audio through");
                Ok(input.clone())
            }
        }
    }
}

fn happy<R: Rng + ?Sized>(src: &[f32], p: &HappyParams, rng: &mut R) -> Vec<f32> {
    let n = src.len();
    (0..n)
        .map(|i| {
            let x = src[stretch_index(i, p.rate, n)] * p.gain;
            let noise = if p.dither > 0.0 {
                rng.random_range(-p.dither..=p.dither)
            } else {
                0.0
            };
            limit(x + noise, 1.0)
        })
        .collect()
}

fn calm(src: &[f32], sample_rate: u32, p: &CalmParams) -> Vec<f32> {
    let stretched = stretch(src, p.rate);
    let mut smoother = OutputSmoother::new(p.smoothing_current, p.smoothing_recent_share);
    if let Some(&first) = stretched.first() {
        smoother.prime(first);
    }
    let filtered = smoother.process_block(&stretched);

    // Dry and echo are mixed as a weighted average, so the output never
    // changes faster from one sample to the next than `filtered` does.
    let echo = TapEcho::decaying(sample_rate, p.echo_spacing, p.echo_taps, p.echo_gain, p.echo_decay);
    let scale = p.level / (1.0 + echo.total_gain());

    filtered
        .iter()
        .enumerate()
        .map(|(i, &y)| limit((y + echo.wet_held(&filtered, i)) * scale, p.ceiling))
        .collect()
}

fn energetic(src: &[f32], sample_rate: u32, p: &EnergeticParams) -> Vec<f32> {
    let n = src.len();
    let gate = BeatGate::with_duty(sample_rate, p.beat_period, p.beat_duty, p.beat_boost);
    (0..n)
        .map(|i| {
            let x = src[stretch_index(i, p.rate, n)];
            limit(soft_clip(x, p.drive) * gate.gain(i), 1.0)
        })
        .collect()
}

fn sad(src: &[f32], sample_rate: u32, p: &SadParams) -> Vec<f32> {
    let n = src.len();
    // The echo reads the original channel, not the stretched one.
    let echo = TapEcho::new(
        sample_rate,
        &[EchoTap {
            delay: p.echo_delay,
            gain: p.echo_gain,
        }],
    );
    (0..n)
        .map(|i| {
            let x = src[stretch_index(i, p.rate, n)] * p.gain;
            limit(x + echo.wet(src, i), 1.0)
        })
        .collect()
}

fn angry(src: &[f32], sample_rate: u32, p: &AngryParams) -> Vec<f32> {
    let gate = BeatGate::new(sample_rate, p.gate_period, p.gate_window, p.gate_boost);
    src.iter()
        .enumerate()
        .map(|(i, &x)| {
            let y = sign_power(x, p.exponent)
                * pulse_boost(i, p.bass_every, p.bass_boost)
                * gate.gain(i);
            limit(y, 1.0)
        })
        .collect()
}
