use crate::decode::Waveform;
use crate::emotion::{EmotionClassifier, EmotionError, EmotionScore, EMOTION_LABELS};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Voiced-speech energy threshold; below it the clip reads as subdued.
const LOUD_ENERGY_RMS: f64 = 0.1;

/// Pitch bounds for the autocorrelation search.
const PITCH_MIN_HZ: f64 = 50.0;
const PITCH_MAX_HZ: f64 = 400.0;

/// Minimum normalized autocorrelation for a lag to count as voiced.
const VOICING_THRESHOLD: f64 = 0.5;

/// Analysis window for the pitch estimate (samples).
const PITCH_WINDOW: usize = 4096;

/// Heuristic production classifier: scores the fixed label set from global
/// energy and an autocorrelation pitch estimate, normalized into a
/// probability distribution. Deterministic for identical input; a model-based
/// capability plugs in through the same trait.
#[derive(Clone, Debug, Default)]
pub struct BasicEmotionClassifier;

impl BasicEmotionClassifier {
    pub fn new() -> Self {
        Self
    }

    fn score(&self, audio: &Waveform) -> Vec<EmotionScore> {
        let energy = rms_energy(audio.samples());
        let pitch = estimate_pitch_hz(audio.samples(), audio.sample_rate());

        // Dominant label per the energy/pitch bands; everything else shares
        // the remaining probability mass evenly.
        let dominant = if energy > LOUD_ENERGY_RMS {
            match pitch {
                Some(p) if p > 200.0 => "happy",
                Some(p) if p < 100.0 => "sad",
                Some(_) => "neutral",
                None => "excited",
            }
        } else {
            "neutral"
        };

        let weight = 0.35 + energy.min(0.3);
        let base = (1.0 - weight) / EMOTION_LABELS.len() as f64;
        EMOTION_LABELS
            .iter()
            .map(|&label| EmotionScore {
                label: label.to_owned(),
                score: if label == dominant {
                    base + weight
                } else {
                    base
                },
            })
            .collect()
    }
}

impl EmotionClassifier for BasicEmotionClassifier {
    fn classify(&self, audio: Waveform) -> BoxFuture<'_, Result<Vec<EmotionScore>, EmotionError>> {
        async move {
            if audio.sample_rate() == 0 {
                return Err(EmotionError::ClassificationFailed(
                    "waveform has no sample rate".to_owned(),
                ));
            }
            Ok(self.score(&audio))
        }
        .boxed()
    }
}

fn rms_energy(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Autocorrelation pitch estimate over the leading window; `None` when the
/// signal is too short, too quiet or no lag clears the voicing threshold.
fn estimate_pitch_hz(samples: &[f32], sample_rate: u32) -> Option<f64> {
    if sample_rate == 0 {
        return None;
    }
    let window: Vec<f64> = samples
        .iter()
        .take(PITCH_WINDOW)
        .map(|&x| f64::from(x))
        .collect();

    let min_lag = (f64::from(sample_rate) / PITCH_MAX_HZ).floor() as usize;
    let max_lag = (f64::from(sample_rate) / PITCH_MIN_HZ).ceil() as usize;
    if window.len() < min_lag * 2 || min_lag == 0 {
        return None;
    }

    let energy: f64 = window.iter().map(|x| x * x).sum();
    if energy <= f64::EPSILON {
        return None;
    }

    let mut correlations = Vec::new();
    for lag in min_lag..=max_lag.min(window.len() - 1) {
        let n = window.len() - lag;
        let mut corr = 0.0f64;
        let mut e0 = 0.0f64;
        let mut e1 = 0.0f64;
        for i in 0..n {
            corr += window[i] * window[i + lag];
            e0 += window[i] * window[i];
            e1 += window[i + lag] * window[i + lag];
        }
        let norm = (e0 * e1).sqrt();
        if norm <= f64::EPSILON {
            continue;
        }
        correlations.push((lag, corr / norm));
    }

    let best_corr = correlations
        .iter()
        .map(|&(_, c)| c)
        .fold(0.0f64, f64::max);
    if best_corr < VOICING_THRESHOLD {
        return None;
    }

    // Lags at period multiples correlate almost as well as the fundamental;
    // take the smallest lag close to the best to avoid octave errors.
    let lag = correlations
        .iter()
        .find(|&&(_, c)| c >= 0.98 * best_corr)
        .map(|&(lag, _)| lag)?;
    Some(f64::from(sample_rate) / lag as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::TARGET_SAMPLE_RATE;
    use crate::emotion::ToneReading;
    use futures::executor::block_on;

    fn sine(freq: f64, amplitude: f32, seconds: f64) -> Waveform {
        let rate = f64::from(TARGET_SAMPLE_RATE);
        let samples: Vec<f32> = (0..(rate * seconds) as usize)
            .map(|i| {
                let t = i as f64 / rate;
                amplitude * (2.0 * std::f64::consts::PI * freq * t).sin() as f32
            })
            .collect();
        Waveform::new(samples, TARGET_SAMPLE_RATE)
    }

    #[test]
    fn scores_form_a_probability_distribution() {
        let classifier = BasicEmotionClassifier::new();
        let scores = block_on(classifier.classify(sine(150.0, 0.5, 1.0))).unwrap();
        assert_eq!(scores.len(), EMOTION_LABELS.len());
        let sum: f64 = scores.iter().map(|s| s.score).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(scores.iter().all(|s| s.score > 0.0));
    }

    #[test]
    fn loud_high_pitched_audio_reads_happy() {
        let classifier = BasicEmotionClassifier::new();
        let scores = block_on(classifier.classify(sine(300.0, 0.5, 1.0))).unwrap();
        let reading = ToneReading::from_scores(&scores);
        assert_eq!(reading.emotion, "happy");
    }

    #[test]
    fn loud_low_pitched_audio_reads_sad() {
        let classifier = BasicEmotionClassifier::new();
        let scores = block_on(classifier.classify(sine(80.0, 0.5, 1.0))).unwrap();
        let reading = ToneReading::from_scores(&scores);
        assert_eq!(reading.emotion, "sad");
    }

    #[test]
    fn quiet_audio_reads_neutral() {
        let classifier = BasicEmotionClassifier::new();
        let scores = block_on(classifier.classify(sine(300.0, 0.01, 1.0))).unwrap();
        let reading = ToneReading::from_scores(&scores);
        assert_eq!(reading.emotion, "neutral");
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = BasicEmotionClassifier::new();
        let a = block_on(classifier.classify(sine(220.0, 0.4, 0.5))).unwrap();
        let b = block_on(classifier.classify(sine(220.0, 0.4, 0.5))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn pitch_estimate_finds_the_fundamental() {
        let wave = sine(200.0, 0.5, 0.5);
        let pitch = estimate_pitch_hz(wave.samples(), TARGET_SAMPLE_RATE).unwrap();
        assert!((pitch - 200.0).abs() < 10.0, "estimated {pitch:.1} Hz");
    }

    #[test]
    fn silence_has_no_pitch() {
        let samples = vec![0.0f32; 8_000];
        assert!(estimate_pitch_hz(&samples, TARGET_SAMPLE_RATE).is_none());
    }
}
