//! Orchestrates one analysis call: decode → transcribe → fillers → prosody
//! → tone, merged into a single [`AnalysisRecord`].
//!
//! Failure policy is two-tier. Decode problems and unexpected internal
//! numeric failures abort the call with [`AnalysisError`]; the external ASR
//! and emotion capabilities are expected to be flaky and degrade in place
//! (empty transcript, unknown tone) without failing the call. A call never
//! returns a partial record.

use crate::asr::{preprocess_for_asr, AsrBackend, TranscriptionConfig};
use crate::decode::{AudioDecoder, DecodeError};
use crate::emotion::{EmotionClassifier, Tone, ToneReading};
use crate::fillers::{self, FillerLexicon};
use crate::prosody;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("audio decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("analysis failed: {0}")]
    Internal(String),
}

/// Complete output of one analysis call; fully populated before return and
/// never mutated afterwards.
///
/// `filler_rate_per_minute` is actually fillers per 100 words (the literal
/// reference computation); the name is kept for output compatibility.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub transcript: String,
    pub duration_sec: f64,
    pub word_count: u32,
    pub tempo_bpm: f64,
    pub pause_count: u32,
    pub pauses_per_min: f64,
    pub avg_pause_sec: f64,
    pub energy_variation: f64,
    pub tone: Tone,
    pub emotion: String,
    pub confidence: f64,
    pub filler_words: BTreeMap<String, u32>,
    pub total_fillers: u32,
    pub filler_rate_per_minute: f64,
    pub unique_fillers: u32,
}

/// The analysis pipeline with its injected collaborators.
///
/// Built once at process start; the decoder, model handles and lexicon are
/// shared read-only, so concurrent calls on different clips are safe. All
/// per-call buffers are call-local.
#[derive(Clone)]
pub struct SpeechAnalyzer {
    decoder: Arc<dyn AudioDecoder>,
    asr: Arc<dyn AsrBackend>,
    classifier: Arc<dyn EmotionClassifier>,
    lexicon: Arc<FillerLexicon>,
    transcription: TranscriptionConfig,
}

impl SpeechAnalyzer {
    pub fn new(
        decoder: Arc<dyn AudioDecoder>,
        asr: Arc<dyn AsrBackend>,
        classifier: Arc<dyn EmotionClassifier>,
    ) -> Self {
        Self {
            decoder,
            asr,
            classifier,
            lexicon: Arc::new(FillerLexicon::default()),
            transcription: TranscriptionConfig::default(),
        }
    }

    pub fn with_lexicon(mut self, lexicon: FillerLexicon) -> Self {
        self.lexicon = Arc::new(lexicon);
        self
    }

    pub fn with_transcription_config(mut self, config: TranscriptionConfig) -> Self {
        self.transcription = config;
        self
    }

    /// Analyze one finite audio clip.
    pub async fn analyze(&self, payload: Bytes) -> Result<AnalysisRecord, AnalysisError> {
        let wave = self.decoder.decode(payload).await?;
        let duration_sec = wave.duration_sec();
        tracing::debug!(
            samples = wave.len(),
            duration_sec,
            "clip decoded"
        );

        let transcript = match self
            .asr
            .transcribe(preprocess_for_asr(&wave), self.transcription.clone())
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "transcription degraded to empty transcript");
                String::new()
            }
        };
        let word_count = transcript.split_whitespace().count() as u32;

        let filler = fillers::analyze(&transcript, &self.lexicon);
        let rhythm = prosody::analyze(&wave);

        let reading = match self.classifier.classify(wave).await {
            Ok(scores) => ToneReading::from_scores(&scores),
            Err(e) => {
                tracing::warn!(error = %e, "tone classification degraded to sentinel");
                ToneReading::unknown()
            }
        };

        Ok(AnalysisRecord {
            transcript,
            duration_sec: round_to(finite("duration_sec", duration_sec)?, 2),
            word_count,
            tempo_bpm: finite("tempo_bpm", rhythm.tempo_bpm)?,
            pause_count: rhythm.pause_count,
            pauses_per_min: round_to(finite("pauses_per_min", rhythm.pauses_per_min)?, 2),
            avg_pause_sec: round_to(finite("avg_pause_sec", rhythm.avg_pause_sec)?, 3),
            energy_variation: round_to(finite("energy_variation", rhythm.energy_variation)?, 6),
            tone: reading.tone,
            emotion: reading.emotion,
            confidence: round_to(finite("confidence", reading.confidence)?, 3),
            filler_words: filler.filler_words,
            total_fillers: filler.total_fillers,
            filler_rate_per_minute: finite(
                "filler_rate_per_minute",
                filler.filler_rate_per_minute,
            )?,
            unique_fillers: filler.unique_fillers,
        })
    }
}

/// A non-finite metric means a pipeline bug, not external flakiness; it
/// surfaces instead of being silently zeroed.
fn finite(name: &str, value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::Internal(format!(
            "metric {name} is not finite: {value}"
        )))
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
