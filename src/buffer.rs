//! Multi-channel floating-point PCM buffer.

use crate::error::AudioError;

/// Decoded audio: one `Vec<f32>` per channel, samples roughly in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Per-channel sample data. Every channel must have the same length.
    pub channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        PcmBuffer {
            sample_rate,
            channels,
        }
    }

    /// Single-channel buffer.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        PcmBuffer::new(sample_rate, vec![samples])
    }

    /// A buffer of `frames` zero samples on every channel.
    pub fn silent(sample_rate: u32, channel_count: usize, frames: usize) -> Self {
        PcmBuffer::new(sample_rate, vec![vec![0.0; frames]; channel_count])
    }

    /// Split interleaved samples (frame-major) into per-channel arrays.
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        if channel_count == 0 {
            return PcmBuffer::new(sample_rate, Vec::new());
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in frame.iter().enumerate() {
                channels[ch].push(s);
            }
        }
        PcmBuffer::new(sample_rate, channels)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel (N). Zero if there are no channels.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Frame-major interleaving: s0c0, s0c1, ..., s1c0, ...
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channel_count());
        for i in 0..frames {
            for ch in &self.channels {
                out.push(ch.get(i).copied().unwrap_or(0.0));
            }
        }
        out
    }

    /// Check the shape invariants the processor relies on.
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidAudioBuffer(
                "sample rate must be positive".to_string(),
            ));
        }
        let Some(first) = self.channels.first() else {
            return Err(AudioError::InvalidAudioBuffer(
                "buffer has no channels".to_string(),
            ));
        };
        if first.is_empty() {
            return Err(AudioError::InvalidAudioBuffer(
                "channel 0 is empty".to_string(),
            ));
        }
        let n = first.len();
        for (idx, ch) in self.channels.iter().enumerate().skip(1) {
            if ch.len() != n {
                return Err(AudioError::InvalidAudioBuffer(format!(
                    "channel {idx} has {} samples, expected {n}",
                    ch.len()
                )));
            }
        }
        Ok(())
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// Root-mean-square level across all channels.
    pub fn rms(&self) -> f32 {
        let count: usize = self.channels.iter().map(Vec::len).sum();
        if count == 0 {
            return 0.0;
        }
        let sum_sq: f64 = self
            .channels
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        (sum_sq / count as f64).sqrt() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_roundtrip() {
        let buf = PcmBuffer::new(8000, vec![vec![0.1, 0.2, 0.3], vec![-0.1, -0.2, -0.3]]);
        let inter = buf.interleaved();
        assert_eq!(inter, vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
        assert_eq!(PcmBuffer::from_interleaved(&inter, 2, 8000), buf);
    }

    #[test]
    fn partial_frame_dropped() {
        let buf = PcmBuffer::from_interleaved(&[0.1, 0.2, 0.3], 2, 8000);
        assert_eq!(buf.frames(), 1);
        assert_eq!(buf.channels[1], vec![0.2]);
    }

    #[test]
    fn validate_accepts_well_formed_buffer() {
        assert!(PcmBuffer::silent(44100, 2, 10).validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let cases = [
            PcmBuffer::new(44100, vec![]),
            PcmBuffer::new(0, vec![vec![0.0; 4]]),
            PcmBuffer::new(44100, vec![vec![]]),
            PcmBuffer::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]),
        ];
        for buf in cases {
            assert!(
                matches!(buf.validate(), Err(AudioError::InvalidAudioBuffer(_))),
                "expected rejection for {buf:?}"
            );
        }
    }

    #[test]
    fn duration_and_levels() {
        let buf = PcmBuffer::mono(4, vec![0.5, -0.5, 0.5, -1.0]);
        assert!((buf.duration_seconds() - 1.0).abs() < 1e-12);
        assert_eq!(buf.peak(), 1.0);
        let expected = ((0.25 * 3.0 + 1.0) / 4.0f64).sqrt() as f32;
        assert!((buf.rms() - expected).abs() < 1e-6);
    }
}
