//! Prosody analysis over the raw decoded waveform: RMS energy envelope,
//! pause statistics and a rhythmic tempo estimate.
//!
//! Pause detection sets the silence threshold at the 10th percentile of the
//! energy envelope and counts quiet-frame time gaps strictly greater than
//! [`PAUSE_GAP_SEC`] as pause events, so frame-to-frame jitter inside one
//! silence does not inflate the count.

mod tempo;

use crate::decode::Waveform;
use serde::{Deserialize, Serialize};

pub use tempo::estimate_tempo_bpm;

/// Frame size for the energy envelope (samples).
pub const FRAME_SIZE: usize = 2048;

/// Hop between consecutive envelope frames (samples).
pub const HOP_SIZE: usize = 512;

/// Quiet-frame gaps must exceed this to count as a pause event.
pub const PAUSE_GAP_SEC: f64 = 0.2;

/// Percentile of the energy envelope used as the silence threshold.
pub const SILENCE_PERCENTILE: f64 = 10.0;

/// One envelope frame: RMS energy at a timestamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergyFrame {
    pub time_sec: f64,
    pub rms: f64,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PauseStats {
    pub pause_count: u32,
    pub pauses_per_min: f64,
    pub avg_pause_sec: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProsodyMetrics {
    pub tempo_bpm: f64,
    pub pause_count: u32,
    pub pauses_per_min: f64,
    pub avg_pause_sec: f64,
    pub energy_variation: f64,
}

/// Root-mean-square energy over overlapping frames.
///
/// A waveform shorter than one frame yields an empty envelope; every metric
/// derived from it is then zero.
pub fn energy_envelope(wave: &Waveform) -> Vec<EnergyFrame> {
    let samples = wave.samples();
    let sample_rate = wave.sample_rate();
    if samples.len() < FRAME_SIZE || sample_rate == 0 {
        return Vec::new();
    }

    let num_frames = (samples.len() - FRAME_SIZE) / HOP_SIZE + 1;
    let mut envelope = Vec::with_capacity(num_frames);
    for i in 0..num_frames {
        let start = i * HOP_SIZE;
        let frame = &samples[start..start + FRAME_SIZE];
        let sum_sq: f64 = frame.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
        envelope.push(EnergyFrame {
            time_sec: (start as f64) / f64::from(sample_rate),
            rms: (sum_sq / FRAME_SIZE as f64).sqrt(),
        });
    }
    envelope
}

/// Population variance of the envelope energies (0 for an empty envelope).
pub fn energy_variance(envelope: &[EnergyFrame]) -> f64 {
    if envelope.is_empty() {
        return 0.0;
    }
    let n = envelope.len() as f64;
    let mean = envelope.iter().map(|f| f.rms).sum::<f64>() / n;
    envelope.iter().map(|f| (f.rms - mean).powi(2)).sum::<f64>() / n
}

/// Linear-interpolation percentile over the envelope energies, matching the
/// numpy convention the reference thresholds were tuned against.
pub fn silence_threshold(envelope: &[EnergyFrame]) -> f64 {
    percentile(envelope.iter().map(|f| f.rms).collect(), SILENCE_PERCENTILE)
}

fn percentile(mut values: Vec<f64>, pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (values.len() - 1) as f64 * pct / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return values[lo];
    }
    let weight = rank - lo as f64;
    values[lo] * (1.0 - weight) + values[hi] * weight
}

/// Durations of quiet-frame gaps strictly greater than [`PAUSE_GAP_SEC`].
///
/// `quiet_times` are the timestamps of frames below the silence threshold,
/// in ascending order. Fewer than two quiet frames yield no pauses.
pub fn pause_durations(quiet_times: &[f64]) -> Vec<f64> {
    if quiet_times.len() < 2 {
        return Vec::new();
    }
    quiet_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&gap| gap > PAUSE_GAP_SEC)
        .collect()
}

/// Pause statistics for a waveform of the given duration.
pub fn detect_pauses(envelope: &[EnergyFrame], duration_sec: f64) -> PauseStats {
    let threshold = silence_threshold(envelope);
    let quiet_times: Vec<f64> = envelope
        .iter()
        .filter(|f| f.rms < threshold)
        .map(|f| f.time_sec)
        .collect();

    let durations = pause_durations(&quiet_times);
    let pause_count = durations.len() as u32;
    let avg_pause_sec = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };
    let pauses_per_min = if duration_sec > 0.0 {
        f64::from(pause_count) / (duration_sec / 60.0)
    } else {
        0.0
    };

    PauseStats {
        pause_count,
        pauses_per_min,
        avg_pause_sec,
    }
}

/// Full prosody pass: tempo, pause statistics and energy variation.
pub fn analyze(wave: &Waveform) -> ProsodyMetrics {
    let envelope = energy_envelope(wave);
    tracing::debug!(frames = envelope.len(), "energy envelope computed");

    let pauses = detect_pauses(&envelope, wave.duration_sec());
    ProsodyMetrics {
        tempo_bpm: estimate_tempo_bpm(&envelope),
        pause_count: pauses.pause_count,
        pauses_per_min: pauses.pauses_per_min,
        avg_pause_sec: pauses.avg_pause_sec,
        energy_variation: energy_variance(&envelope),
    }
}
