use crate::asr::{AsrBackend, AsrError, TranscriptionConfig};
use crate::decode::{Waveform, TARGET_SAMPLE_RATE};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper-backed ASR. The model is loaded once at construction and the
/// context is shared read-only across calls; each call gets its own state.
///
/// `top_p`/`top_k` have no whisper.cpp equivalent and are ignored here.
#[derive(Clone)]
pub struct WhisperAsrBackend {
    ctx: Arc<WhisperContext>,
}

impl WhisperAsrBackend {
    pub fn new(model_path: &str) -> Result<Self, AsrError> {
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| AsrError::ModelLoad(e.to_string()))?;
        Ok(Self { ctx: Arc::new(ctx) })
    }

    fn run(&self, audio: &Waveform, config: &TranscriptionConfig) -> Result<String, AsrError> {
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| AsrError::Backend(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: config.beam_width as i32,
            patience: -1.0,
        });
        params.set_temperature(config.temperature);
        params.set_max_tokens(config.max_output_len as i32);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_suppress_blank(true);

        state
            .full(params, audio.samples())
            .map_err(|e| AsrError::Backend(e.to_string()))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| AsrError::Backend(e.to_string()))?;

        let mut transcript = String::new();
        for i in 0..num_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| AsrError::Backend(e.to_string()))?;
            if !transcript.is_empty() {
                transcript.push(' ');
            }
            transcript.push_str(segment.trim());
        }

        Ok(transcript.trim().to_owned())
    }
}

impl AsrBackend for WhisperAsrBackend {
    fn transcribe(
        &self,
        audio: Waveform,
        config: TranscriptionConfig,
    ) -> BoxFuture<'_, Result<String, AsrError>> {
        async move {
            if audio.sample_rate() != TARGET_SAMPLE_RATE {
                return Err(AsrError::UnsupportedFormat {
                    expected: TARGET_SAMPLE_RATE,
                    got: audio.sample_rate(),
                });
            }
            self.run(&audio, &config)
        }
        .boxed()
    }
}
