//! WAV codec: canonical 16-bit PCM encoder and a `hound`-backed reader.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use crate::buffer::PcmBuffer;
use crate::error::AudioError;

/// Size of the canonical RIFF/fmt/data header.
pub const HEADER_LEN: usize = 44;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Convert a float sample to i16: clamp to [-1, 1], scale negatives by
/// 32768 and non-negatives by 32767, round to nearest.
#[inline]
pub fn float_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Inverse of [`float_to_i16`].
#[inline]
pub fn i16_to_float(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32768.0
    } else {
        sample as f32 / 32767.0
    }
}

/// Encode a PCM buffer as a canonical 16-bit PCM WAV byte stream.
pub fn encode(buffer: &PcmBuffer) -> Result<Vec<u8>, AudioError> {
    let channels = buffer.channel_count();
    if channels == 0 {
        return Err(AudioError::Encoding("channel count must be positive".to_string()));
    }
    if buffer.sample_rate == 0 {
        return Err(AudioError::Encoding("sample rate must be positive".to_string()));
    }
    let frames = buffer.frames();
    if buffer.channels.iter().any(|ch| ch.len() != frames) {
        return Err(AudioError::Encoding("channels differ in length".to_string()));
    }
    let channels = u16::try_from(channels)
        .map_err(|_| AudioError::Encoding(format!("{channels} channels exceed the WAV limit")))?;

    let block_align = channels as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let data_size = u32::try_from(frames as u64 * block_align as u64)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| AudioError::Encoding("audio too long for a WAV container".to_string()))?;
    let byte_rate = buffer
        .sample_rate
        .checked_mul(block_align)
        .ok_or_else(|| AudioError::Encoding("byte rate overflows".to_string()))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&buffer.sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&(block_align as u16).to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk, frame-major interleave
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for sample in buffer.interleaved() {
        buf.extend_from_slice(&float_to_i16(sample).to_le_bytes());
    }

    Ok(buf)
}

/// Decode a WAV byte stream (integer 8–32 bit or 32-bit float) into a
/// PCM buffer. 16-bit data uses the exact inverse of [`float_to_i16`].
pub fn decode(bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| AudioError::Decode(format!("invalid WAV: {e}")))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::Decode("WAV declares zero channels".to_string()));
    }

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(format!("corrupt WAV data: {e}")))?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(i16_to_float))
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(format!("corrupt WAV data: {e}")))?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let full = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|v| {
                        if v < 0 {
                            v as f32 / full
                        } else {
                            v as f32 / (full - 1.0)
                        }
                    })
                })
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode(format!("corrupt WAV data: {e}")))?
        }
        (format, bits) => {
            return Err(AudioError::Decode(format!(
                "unsupported WAV sample format {format:?} at {bits} bits"
            )));
        }
    };

    Ok(PcmBuffer::from_interleaved(
        &samples,
        spec.channels as usize,
        spec.sample_rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(b: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([b[at], b[at + 1]])
    }

    fn u32_at(b: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
    }

    #[test]
    fn wav_header_valid() {
        let buf = PcmBuffer::new(44100, vec![vec![0.0; 10], vec![0.0; 10]]);
        let wav = encode(&buf).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + 40);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 2);
        assert_eq!(u32_at(&wav, 24), 44100);
        assert_eq!(u32_at(&wav, 28), 44100 * 2 * 2);
        assert_eq!(u16_at(&wav, 32), 4);
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 40);
        assert_eq!(wav.len(), HEADER_LEN + 40);
    }

    #[test]
    fn payload_is_interleaved() {
        let buf = PcmBuffer::new(8000, vec![vec![1.0, 0.0], vec![-1.0, 0.5]]);
        let wav = encode(&buf).unwrap();
        let data: Vec<i16> = wav[HEADER_LEN..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(data, vec![32767, -32768, 0, 16384]);
    }

    #[test]
    fn conversion_is_asymmetric_and_clamped() {
        assert_eq!(float_to_i16(1.0), 32767);
        assert_eq!(float_to_i16(-1.0), -32768);
        assert_eq!(float_to_i16(3.0), 32767);
        assert_eq!(float_to_i16(-3.0), -32768);
        assert_eq!(float_to_i16(0.0), 0);
        assert_eq!(float_to_i16(f32::NAN), 0);
        assert_eq!(float_to_i16(-0.5), -16384);
    }

    #[test]
    fn rejects_invalid_shapes() {
        assert!(matches!(encode(&PcmBuffer::new(44100, vec![])), Err(AudioError::Encoding(_))));
        assert!(matches!(encode(&PcmBuffer::silent(0, 1, 4)), Err(AudioError::Encoding(_))));
        assert!(matches!(
            encode(&PcmBuffer::new(44100, vec![vec![0.0; 3], vec![0.0; 2]])),
            Err(AudioError::Encoding(_))
        ));
    }

    #[test]
    fn empty_channels_encode_to_header_only() {
        let wav = encode(&PcmBuffer::new(22050, vec![vec![]])).unwrap();
        assert_eq!(wav.len(), HEADER_LEN);
        assert_eq!(u32_at(&wav, 4), 36);
    }

    #[test]
    fn decode_recovers_header_and_samples() {
        let left: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.05).sin() * 0.9).collect();
        let right: Vec<f32> = left.iter().map(|s| -s * 0.5).collect();
        let buf = PcmBuffer::new(48000, vec![left, right]);

        let decoded = decode(&encode(&buf).unwrap()).unwrap();
        assert_eq!(decoded.sample_rate, 48000);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frames(), 500);
        for (a, b) in buf.channels.iter().flatten().zip(decoded.channels.iter().flatten()) {
            assert!((a - b).abs() <= 1.0 / 32767.0, "{a} vs {b}");
        }
    }

    #[test]
    fn hound_reads_our_header() {
        let wav = encode(&PcmBuffer::silent(16000, 1, 32)).unwrap();
        let reader = WavReader::new(Cursor::new(&wav[..])).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(reader.len(), 32);
    }

    #[test]
    fn decodes_float_wav_written_by_hound() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in [0.25f32, -0.5, 0.75] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        let decoded = decode(cursor.get_ref()).unwrap();
        assert_eq!(decoded.channels[0], vec![0.25, -0.5, 0.75]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode(b"not a wav file"), Err(AudioError::Decode(_))));
    }
}
