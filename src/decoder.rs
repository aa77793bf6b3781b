//! PCM source adapter: turns an encoded recording into a `PcmBuffer`.

use tracing::debug;

use crate::buffer::PcmBuffer;
use crate::error::AudioError;
use crate::wav;

/// Container formats recognized by [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Wav,
    Mp3,
    Unknown,
}

/// Guess the container from its leading bytes.
pub fn sniff(bytes: &[u8]) -> ContainerKind {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        ContainerKind::Wav
    } else if bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0) {
        ContainerKind::Mp3
    } else {
        ContainerKind::Unknown
    }
}

/// Decodes an opaque encoded audio blob into PCM at its native rate.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioError>;
}

impl<F> AudioDecoder for F
where
    F: Fn(&[u8]) -> Result<PcmBuffer, AudioError> + Send + Sync,
{
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
        self(bytes)
    }
}

/// WAV via `hound`, MP3 via `minimp3` when the `mp3` feature is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecoder;

impl AudioDecoder for DefaultDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
        if bytes.is_empty() {
            return Err(AudioError::Decode("recording is empty".to_string()));
        }
        let kind = sniff(bytes);
        let buffer = match kind {
            ContainerKind::Wav => wav::decode(bytes)?,
            ContainerKind::Mp3 => decode_mp3(bytes)?,
            ContainerKind::Unknown => {
                return Err(AudioError::Decode("unrecognized audio container".to_string()));
            }
        };
        if buffer.frames() == 0 {
            return Err(AudioError::Decode("recording contains no audio frames".to_string()));
        }
        debug!(
            ?kind,
            channels = buffer.channel_count(),
            frames = buffer.frames(),
            sample_rate = buffer.sample_rate,
            "decoded recording"
        );
        Ok(buffer)
    }
}

#[cfg(feature = "mp3")]
fn decode_mp3(bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
    use minimp3::{Decoder, Error, Frame};

    let mut decoder = Decoder::new(std::io::Cursor::new(bytes));
    let mut interleaved: Vec<f32> = Vec::new();
    let mut format: Option<(usize, u32)> = None;

    loop {
        match decoder.next_frame() {
            Ok(Frame {
                data,
                sample_rate,
                channels,
                ..
            }) => {
                if channels == 0 || sample_rate <= 0 {
                    continue;
                }
                let this = (channels, sample_rate as u32);
                match format {
                    None => format = Some(this),
                    // A mid-stream format change would misalign channels; stop there.
                    Some(f) if f != this => break,
                    Some(_) => {}
                }
                interleaved.extend(data.into_iter().map(wav::i16_to_float));
            }
            Err(Error::Eof) => break,
            Err(Error::SkippedData) => continue,
            Err(e) => return Err(AudioError::Decode(format!("invalid MP3: {e}"))),
        }
    }

    let (channels, sample_rate) =
        format.ok_or_else(|| AudioError::Decode("no MP3 frames found".to_string()))?;
    Ok(PcmBuffer::from_interleaved(&interleaved, channels, sample_rate))
}

#[cfg(not(feature = "mp3"))]
fn decode_mp3(_bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
    Err(AudioError::Decode(
        "MP3 support is not enabled in this build".to_string(),
    ))
}
