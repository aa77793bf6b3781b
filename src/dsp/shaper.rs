//! Waveshaping and amplitude-modulation primitives.

/// Soft clipper using tanh to prevent harsh digital clipping.
#[inline]
pub fn soft_clip(x: f32, drive: f32) -> f32 {
    (x * drive).tanh()
}

/// Sign-preserving power curve, `sign(x)·|x|^p`. With `p < 1` quiet
/// material is pushed up hard while zero stays zero.
#[inline]
pub fn sign_power(x: f32, exponent: f32) -> f32 {
    if x == 0.0 {
        return 0.0;
    }
    x.signum() * x.abs().powf(exponent)
}

/// Hard limit to `[-ceiling, ceiling]`. NaN becomes silence.
#[inline]
pub fn limit(x: f32, ceiling: f32) -> f32 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(-ceiling, ceiling)
}

/// Periodic gain window: `boost` during the first `duty` fraction of each
/// `period`, 1.0 otherwise. Periods may be fractional sample counts; the
/// phase is computed with a float modulo, so a non-integer period drifts
/// against the sample grid and the emphasis lands irregularly.
#[derive(Debug, Clone, Copy)]
pub struct BeatGate {
    period: f64,
    window: f64,
    boost: f32,
}

impl BeatGate {
    /// `period` and `window` are in seconds.
    pub fn new(sample_rate: u32, period: f64, window: f64, boost: f32) -> Self {
        let sr = sample_rate as f64;
        let period = (period * sr).max(1.0);
        BeatGate {
            period,
            window: (window * sr).clamp(0.0, period),
            boost,
        }
    }

    /// Gate where the active window is a fraction of the period.
    pub fn with_duty(sample_rate: u32, period: f64, duty: f64, boost: f32) -> Self {
        BeatGate::new(sample_rate, period, period * duty.clamp(0.0, 1.0), boost)
    }

    #[inline]
    pub fn gain(&self, i: usize) -> f32 {
        if (i as f64) % self.period < self.window {
            self.boost
        } else {
            1.0
        }
    }
}

/// Boost every `every`-th sample, starting at 0.
#[inline]
pub fn pulse_boost(i: usize, every: usize, boost: f32) -> f32 {
    if every > 0 && i % every == 0 { boost } else { 1.0 }
}
