//! Index-stretch resampling.
//!
//! Reads the source at `floor(i × rate) mod N`. The modulo is taken against
//! the source length, so any rate stays in bounds; rates above 1.0 wrap
//! around and repeat the head of the channel.

/// Source index for output sample `i` at the given stretch rate.
#[inline]
pub fn stretch_index(i: usize, rate: f64, len: usize) -> usize {
    debug_assert!(len > 0);
    let pos = (i as f64 * rate).floor();
    if pos <= 0.0 {
        return 0;
    }
    (pos as usize) % len
}

/// Resample a whole channel to the same length by index stretching.
pub fn stretch(source: &[f32], rate: f64) -> Vec<f32> {
    let n = source.len();
    if n == 0 {
        return Vec::new();
    }
    (0..n).map(|i| source[stretch_index(i, rate, n)]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_rate_is_identity() {
        let src = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(stretch(&src, 1.0), src.to_vec());
    }

    #[test]
    fn fast_rate_wraps_against_source_length() {
        // 5 samples at 1.5x: 0, 1.5, 3, 4.5, 6 -> 0, 1, 3, 4, 1
        let src = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(stretch(&src, 1.5), vec![0.0, 1.0, 3.0, 4.0, 1.0]);
    }

    #[test]
    fn slow_rate_repeats_samples() {
        let src = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(stretch(&src, 0.5), vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn tiny_buffers_never_read_out_of_range() {
        for len in 1..8 {
            for &rate in &[0.75, 0.85, 1.05, 1.15, 1.2, 3.7] {
                for i in 0..64 {
                    assert!(stretch_index(i, rate, len) < len);
                }
            }
        }
    }
}
