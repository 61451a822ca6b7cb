#[cfg(feature = "whisper-rs")]
mod whisper;

use crate::decode::Waveform;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

#[cfg(feature = "whisper-rs")]
pub use whisper::WhisperAsrBackend;

pub const DEFAULT_MAX_OUTPUT_LEN: usize = 448;
pub const DEFAULT_BEAM_WIDTH: usize = 5;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_TOP_K: usize = 50;

/// Pre-emphasis coefficient for the ASR high-pass filter.
const PRE_EMPHASIS_COEF: f32 = 0.97;

/// Decoding/search knobs of the external speech-to-text capability.
///
/// These are passed through to the backend, not interpreted here; a backend
/// ignores knobs its engine has no equivalent for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionConfig {
    pub beam_width: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: usize,
    pub max_output_len: usize,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AsrError {
    #[error("failed to load speech model: {0}")]
    ModelLoad(String),

    #[error("unsupported waveform format: expected mono {expected} Hz, got {got} Hz")]
    UnsupportedFormat { expected: u32, got: u32 },

    #[error("speech recognition failed: {0}")]
    Backend(String),
}

/// External speech-to-text capability.
///
/// Implementations must be safe for concurrent read access; the model handle
/// is loaded once at process start and shared across analysis calls.
pub trait AsrBackend: Send + Sync {
    fn transcribe(
        &self,
        audio: Waveform,
        config: TranscriptionConfig,
    ) -> BoxFuture<'_, Result<String, AsrError>>;
}

/// Prepares a waveform for recognition: peak-normalize amplitude, then apply
/// a pre-emphasis high-pass boost for consonant-heavy speech.
///
/// Only the transcription stage sees this; prosody and tone analysis consume
/// the raw decoded waveform.
pub fn preprocess_for_asr(wave: &Waveform) -> Waveform {
    let mut samples = wave.samples().to_vec();

    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if peak > 0.0 {
        let gain = 1.0 / peak;
        for s in &mut samples {
            *s *= gain;
        }
    }

    // y[n] = x[n] - 0.97 * x[n-1]
    let mut prev = 0.0f32;
    for s in &mut samples {
        let cur = *s;
        *s = cur - PRE_EMPHASIS_COEF * prev;
        prev = cur;
    }

    Waveform::new(samples, wave.sample_rate())
}
