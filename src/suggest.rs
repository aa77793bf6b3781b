//! Mood suggestion: advisory guess at a recording's mood.
//!
//! The pipeline never depends on a suggestion; callers may show it and let
//! the user pick. [`EnergyHeuristic`] is a stand-in for a real classifier
//! and can be swapped for anything implementing [`MoodSuggester`].

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::PcmBuffer;
use crate::mood::Mood;

/// A suggested mood and how sure the suggester is, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodSuggestion {
    pub mood: Mood,
    pub confidence: f32,
}

pub trait MoodSuggester: Send + Sync {
    fn suggest(&self, buffer: &PcmBuffer, rng: &mut dyn RngCore) -> MoodSuggestion;
}

/// Loudness and brightness features of the first channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyProfile {
    /// Mean of `x²`.
    pub energy: f32,
    /// Fraction of adjacent sample pairs that change sign.
    pub zero_crossing_rate: f32,
    /// Energy of the loudest tenth of the signal over the mean energy.
    pub peak_ratio: f32,
}

impl EnergyProfile {
    pub fn measure(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return EnergyProfile {
                energy: 0.0,
                zero_crossing_rate: 0.0,
                peak_ratio: 0.0,
            };
        }
        let squares: Vec<f32> = samples.iter().map(|s| s * s).collect();
        let energy = squares.iter().sum::<f32>() / squares.len() as f32;

        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        let zero_crossing_rate = crossings as f32 / (samples.len().max(2) - 1) as f32;

        let mut sorted = squares;
        sorted.sort_by(|a, b| b.total_cmp(a));
        let top = (sorted.len() / 10).max(1);
        let top_energy = sorted[..top].iter().sum::<f32>() / top as f32;
        let peak_ratio = if energy > 0.0 { top_energy / energy } else { 0.0 };

        EnergyProfile {
            energy,
            zero_crossing_rate,
            peak_ratio,
        }
    }
}

/// Threshold rules over [`EnergyProfile`] plus a random override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnergyHeuristic {
    /// Mean energy above which a recording counts as loud.
    pub loud_energy: f32,
    /// Mean energy below which a recording counts as quiet.
    pub quiet_energy: f32,
    /// Zero-crossing rate above which a recording counts as bright.
    pub bright_zcr: f32,
    /// Peak-to-mean energy ratio above which loud material counts as spiky.
    pub spiky_ratio: f32,
    /// Probability of replacing the rule-based answer with a random mood.
    pub override_chance: f64,
}

impl Default for EnergyHeuristic {
    fn default() -> Self {
        Self {
            loud_energy: 0.1,
            quiet_energy: 0.005,
            bright_zcr: 0.1,
            spiky_ratio: 4.0,
            override_chance: 0.2,
        }
    }
}

impl EnergyHeuristic {
    fn classify(&self, p: &EnergyProfile) -> MoodSuggestion {
        let (mood, confidence) = if p.energy >= self.loud_energy {
            if p.peak_ratio >= self.spiky_ratio {
                (Mood::Angry, 0.8)
            } else {
                (Mood::Energetic, 0.85)
            }
        } else if p.energy <= self.quiet_energy {
            if p.zero_crossing_rate >= self.bright_zcr {
                (Mood::Calm, 0.7)
            } else {
                (Mood::Sad, 0.75)
            }
        } else if p.zero_crossing_rate >= self.bright_zcr {
            (Mood::Happy, 0.7)
        } else {
            (Mood::Calm, 0.6)
        };
        MoodSuggestion { mood, confidence }
    }
}

impl MoodSuggester for EnergyHeuristic {
    fn suggest(&self, buffer: &PcmBuffer, rng: &mut dyn RngCore) -> MoodSuggestion {
        let samples = buffer.channels.first().map(Vec::as_slice).unwrap_or(&[]);
        let profile = EnergyProfile::measure(samples);
        let mut suggestion = self.classify(&profile);

        if self.override_chance > 0.0 && rng.random_bool(self.override_chance.clamp(0.0, 1.0)) {
            suggestion = MoodSuggestion {
                mood: Mood::ALL[rng.random_range(0..Mood::ALL.len())],
                confidence: rng.random_range(0.5..=0.7),
            };
        }
        suggestion.confidence = suggestion.confidence.clamp(0.0, 1.0);

        debug!(?profile, ?suggestion, "mood suggestion");
        suggestion
    }
}
