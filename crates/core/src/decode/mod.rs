use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

#[cfg(feature = "ffmpeg-sidecar")]
mod ffmpeg;

#[cfg(feature = "ffmpeg-sidecar")]
pub use ffmpeg::FfmpegAudioDecoder;

/// Sample rate every decoded clip is resampled to.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// A decoded clip: mono f32 PCM at a fixed sample rate.
///
/// Immutable once constructed; owned by one analysis call and dropped when
/// the call returns.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("empty audio payload")]
    EmptyInput,

    #[error("ffmpeg unavailable: {0}")]
    FfmpegUnavailable(String),

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("invalid pcm output: {0}")]
    InvalidPcm(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Decodes a finite audio byte payload (any common container) into a
/// mono waveform at [`TARGET_SAMPLE_RATE`].
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, payload: Bytes) -> BoxFuture<'_, Result<Waveform>>;
}

#[cfg(feature = "ffmpeg-sidecar")]
pub(crate) fn parse_f32le_mono(raw: &[u8]) -> Result<Vec<f32>> {
    if raw.len() % 4 != 0 {
        return Err(DecodeError::InvalidPcm(format!(
            "f32le byte length must be multiple of 4, got {}",
            raw.len()
        )));
    }
    let mut out = Vec::with_capacity(raw.len() / 4);
    for chunk in raw.chunks_exact(4) {
        out.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_duration_sec_matches_sample_count() {
        let wave = Waveform::new(vec![0.0; 8_000], TARGET_SAMPLE_RATE);
        assert!((wave.duration_sec() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_rate_waveform_has_zero_duration() {
        let wave = Waveform::new(vec![0.0; 100], 0);
        assert_eq!(wave.duration_sec(), 0.0);
    }

    #[cfg(feature = "ffmpeg-sidecar")]
    #[test]
    fn parse_f32le_rejects_truncated_input() {
        let err = parse_f32le_mono(&[0, 1, 2]).unwrap_err();
        assert!(err.to_string().contains("multiple of 4"));
    }

    #[cfg(feature = "ffmpeg-sidecar")]
    #[test]
    fn parse_f32le_recovers_samples() {
        let input = [0.0f32, -0.5f32, 1.0f32];
        let mut raw = Vec::new();
        for f in input {
            raw.extend_from_slice(&f.to_le_bytes());
        }
        let out = parse_f32le_mono(&raw).unwrap();
        assert_eq!(out.len(), 3);
        for (a, b) in out.iter().zip(input.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
