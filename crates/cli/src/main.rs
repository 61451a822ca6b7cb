#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use speak_coach_core::asr::{
    TranscriptionConfig, DEFAULT_BEAM_WIDTH, DEFAULT_MAX_OUTPUT_LEN, DEFAULT_TEMPERATURE,
    DEFAULT_TOP_K, DEFAULT_TOP_P,
};
use speak_coach_core::config::DEFAULT_LOG_LEVEL;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "speak-coach")]
#[command(about = "Analyze a recorded speech clip: transcript, delivery metrics, tone")]
struct Args {
    /// Recorded audio clip (any common container).
    #[arg(long)]
    input: PathBuf,

    /// Whisper model path; falls back to SPEAK_COACH_WHISPER_MODEL.
    #[arg(long)]
    model: Option<String>,

    #[arg(long, default_value_t = DEFAULT_BEAM_WIDTH)]
    beam_width: usize,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    #[arg(long, default_value_t = DEFAULT_TOP_P)]
    top_p: f32,

    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_LEN)]
    max_output_len: usize,

    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let payload = std::fs::read(&args.input)
        .with_context(|| format!("failed to read clip {:?}", args.input))?;

    let record = run_analysis(args, payload.into()).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

#[cfg(feature = "whisper-rs")]
async fn run_analysis(
    args: Args,
    payload: speak_coach_core::Bytes,
) -> anyhow::Result<speak_coach_core::analyzer::AnalysisRecord> {
    use speak_coach_core::analyzer::SpeechAnalyzer;
    use speak_coach_core::asr::WhisperAsrBackend;
    use speak_coach_core::config::{resolve_model_path, StdEnv};
    use speak_coach_core::decode::FfmpegAudioDecoder;
    use speak_coach_core::emotion::BasicEmotionClassifier;
    use std::sync::Arc;

    let env = StdEnv;
    let model = resolve_model_path(args.model.clone(), &env)?
        .context("no whisper model: pass --model or set SPEAK_COACH_WHISPER_MODEL")?;

    tracing::info!(model = model.as_str(), "loading speech model");
    let asr = WhisperAsrBackend::new(model.as_str())?;

    let analyzer = SpeechAnalyzer::new(
        Arc::new(FfmpegAudioDecoder::new()),
        Arc::new(asr),
        Arc::new(BasicEmotionClassifier::new()),
    )
    .with_transcription_config(transcription_config(&args));

    Ok(analyzer.analyze(payload).await?)
}

#[cfg(not(feature = "whisper-rs"))]
async fn run_analysis(
    _args: Args,
    _payload: speak_coach_core::Bytes,
) -> anyhow::Result<speak_coach_core::analyzer::AnalysisRecord> {
    anyhow::bail!("built without ASR support; rebuild with the whisper-rs feature")
}

#[cfg_attr(not(feature = "whisper-rs"), allow(dead_code))]
fn transcription_config(args: &Args) -> TranscriptionConfig {
    TranscriptionConfig {
        beam_width: args.beam_width,
        temperature: args.temperature,
        top_p: args.top_p,
        top_k: args.top_k,
        max_output_len: args.max_output_len,
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knob_defaults_match_core() {
        let args = Args::parse_from(["speak-coach", "--input", "clip.wav"]);
        let cfg = transcription_config(&args);
        assert_eq!(cfg, TranscriptionConfig::default());
    }

    #[test]
    fn knobs_override_defaults() {
        let args = Args::parse_from([
            "speak-coach",
            "--input",
            "clip.wav",
            "--beam-width",
            "3",
            "--temperature",
            "0.2",
        ]);
        let cfg = transcription_config(&args);
        assert_eq!(cfg.beam_width, 3);
        assert!((cfg.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(cfg.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn model_resolution_prefers_cli_value() {
        use speak_coach_core::config::{resolve_model_path, MapEnv, ENV_WHISPER_MODEL_PATH};

        let env = MapEnv::default().with_var(ENV_WHISPER_MODEL_PATH, "/env.bin");
        let path = resolve_model_path(Some("/cli.bin".to_owned()), &env)
            .unwrap()
            .unwrap();
        assert_eq!(path.as_str(), "/cli.bin");
    }
}
