//! Rhythmic tempo estimation from the energy envelope.
//!
//! Onsets are picked from the positive frame-to-frame energy derivative
//! (energy flux) and the tempo is the median inter-onset interval converted
//! to beats per minute, folded into a plausible range. The exact value is
//! not contractual; the estimate only has to be non-negative and stable for
//! identical input.

use super::EnergyFrame;

/// Flux peaks below this fraction of the maximum flux are ignored (-20 dB).
const FLUX_THRESHOLD_RATIO: f64 = 0.1;

const MIN_BPM: f64 = 40.0;
const MAX_BPM: f64 = 240.0;

/// Onset timestamps from energy-flux peak picking.
///
/// flux[n] = max(0, E[n+1] - E[n]); a peak is a local maximum above the
/// threshold. The onset time is the timestamp of the rising frame.
pub(super) fn detect_onsets(envelope: &[EnergyFrame]) -> Vec<f64> {
    if envelope.len() < 3 {
        return Vec::new();
    }

    let flux: Vec<f64> = envelope
        .windows(2)
        .map(|w| (w[1].rms - w[0].rms).max(0.0))
        .collect();

    let max_flux = flux.iter().copied().fold(0.0f64, f64::max);
    if max_flux <= 0.0 {
        return Vec::new();
    }
    let threshold = max_flux * FLUX_THRESHOLD_RATIO;

    let mut onsets = Vec::new();
    for i in 1..flux.len() - 1 {
        if flux[i] > threshold && flux[i] > flux[i - 1] && flux[i] >= flux[i + 1] {
            onsets.push(envelope[i + 1].time_sec);
        }
    }
    // The first flux value has no left neighbour; treat it as a peak when it
    // dominates its right neighbour.
    if flux.len() > 1 && flux[0] > threshold && flux[0] >= flux[1] {
        onsets.insert(0, envelope[1].time_sec);
    }
    onsets
}

/// Tempo estimate in BPM; 0.0 when fewer than two onsets are found.
pub fn estimate_tempo_bpm(envelope: &[EnergyFrame]) -> f64 {
    let onsets = detect_onsets(envelope);
    if onsets.len() < 2 {
        return 0.0;
    }

    let mut intervals: Vec<f64> = onsets.windows(2).map(|w| w[1] - w[0]).collect();
    intervals.sort_by(|a, b| a.total_cmp(b));
    let median = intervals[intervals.len() / 2];
    if median <= 0.0 {
        return 0.0;
    }

    let mut bpm = 60.0 / median;
    while bpm < MIN_BPM {
        bpm *= 2.0;
    }
    while bpm > MAX_BPM {
        bpm /= 2.0;
    }
    bpm
}
