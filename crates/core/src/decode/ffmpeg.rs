use super::{parse_f32le_mono, AudioDecoder, DecodeError, Result, Waveform, TARGET_SAMPLE_RATE};
use bytes::Bytes;
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Decodes arbitrary container bytes by piping them through an ffmpeg
/// process that mixes to mono and resamples to [`TARGET_SAMPLE_RATE`].
#[derive(Clone, Debug, Default)]
pub struct FfmpegAudioDecoder;

impl FfmpegAudioDecoder {
    pub fn new() -> Self {
        Self
    }

    fn ensure_ffmpeg_available(&self) -> Result<()> {
        download::auto_download().map_err(|e| DecodeError::FfmpegUnavailable(e.to_string()))
    }

    async fn run_ffmpeg(&self, payload: Bytes) -> Result<Vec<f32>> {
        let mut child = tokio::process::Command::new(ffmpeg_path())
            .args([
                "-hide_banner",
                "-nostdin",
                "-loglevel",
                "error",
                "-i",
                "pipe:0",
                "-vn",
                "-sn",
                "-dn",
                "-ac",
                "1",
                "-ar",
                "16000",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "pipe:1",
            ])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            DecodeError::FfmpegFailed("ffmpeg stdin unavailable (pipe not created)".to_owned())
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            DecodeError::FfmpegFailed("ffmpeg stdout unavailable (pipe not created)".to_owned())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            DecodeError::FfmpegFailed("ffmpeg stderr unavailable (pipe not created)".to_owned())
        })?;

        let stdin_task = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            stdin.write_all(&payload).await?;
            stdin.shutdown().await?;
            Ok::<(), std::io::Error>(())
        });

        let stdout_task = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await?;
            Ok::<Vec<u8>, std::io::Error>(buf)
        });

        let stderr_task = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await?;
            Ok::<Vec<u8>, std::io::Error>(buf)
        });

        let status = child
            .wait()
            .await
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        stdin_task
            .await
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        let stdout_bytes = stdout_task
            .await
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        let stderr_bytes = stderr_task
            .await
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        if !status.success() {
            let stderr_s = String::from_utf8_lossy(&stderr_bytes).trim().to_owned();
            return Err(DecodeError::FfmpegFailed(format!(
                "exit_code={:?} stderr={stderr_s}",
                status.code()
            )));
        }

        parse_f32le_mono(&stdout_bytes)
    }
}

impl AudioDecoder for FfmpegAudioDecoder {
    fn decode(&self, payload: Bytes) -> BoxFuture<'_, Result<Waveform>> {
        let this = self.clone();
        async move {
            if payload.is_empty() {
                return Err(DecodeError::EmptyInput);
            }
            this.ensure_ffmpeg_available()?;
            let samples = this.run_ffmpeg(payload).await?;
            if samples.is_empty() {
                return Err(DecodeError::InvalidPcm(
                    "container held no audio samples".to_owned(),
                ));
            }
            Ok(Waveform::new(samples, TARGET_SAMPLE_RATE))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_payload_is_rejected_before_spawning_ffmpeg() {
        let decoder = FfmpegAudioDecoder::new();
        let err = decoder.decode(Bytes::new()).await.unwrap_err();
        assert!(matches!(err, DecodeError::EmptyInput));
    }

    // Minimal RIFF/WAVE wrapper around 16-bit mono PCM.
    fn wav_payload(samples: &[i16], sample_rate: u32) -> Bytes {
        let data_len = (samples.len() * 2) as u32;
        let mut buf = Vec::with_capacity(44 + samples.len() * 2);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            buf.extend_from_slice(&s.to_le_bytes());
        }
        Bytes::from(buf)
    }

    // Requires an ffmpeg binary (or network access to download one).
    #[tokio::test]
    #[ignore]
    async fn decodes_a_wav_clip_to_16k_mono() {
        let samples: Vec<i16> = (0..16_000)
            .map(|i| {
                let t = i as f64 / 16_000.0;
                ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 10_000.0) as i16
            })
            .collect();

        let decoder = FfmpegAudioDecoder::new();
        let wave = decoder
            .decode(wav_payload(&samples, 16_000))
            .await
            .expect("ffmpeg decode");

        assert_eq!(wave.sample_rate(), TARGET_SAMPLE_RATE);
        assert!((wave.duration_sec() - 1.0).abs() < 0.05);
    }
}
