mod classifier;

use crate::decode::Waveform;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use classifier::BasicEmotionClassifier;

/// Label set of the external emotion classification capability.
pub const EMOTION_LABELS: &[&str] = &[
    "angry", "sad", "neutral", "happy", "excited", "fearful", "disgust", "surprise",
];

/// Coarse delivery category derived from a raw emotion label.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Tense,
    Calm,
    Confident,
    Energetic,
    Nervous,
    Neutral,
    Unknown,
}

impl Tone {
    /// Fixed mapping from a raw classifier label (case-insensitive) to a
    /// tone. Labels outside the table map to `Neutral`.
    pub fn from_emotion_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "angry" | "disgust" => Self::Tense,
            "sad" => Self::Calm,
            "neutral" | "happy" => Self::Confident,
            "excited" | "surprise" => Self::Energetic,
            "fearful" => Self::Nervous,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tense => "tense",
            Self::Calm => "calm",
            Self::Confident => "confident",
            Self::Energetic => "energetic",
            Self::Nervous => "nervous",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

/// One label's probability from the classifier.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionScore {
    pub label: String,
    pub score: f64,
}

/// Tone stage output: coarse tone, raw label and arg-max probability.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToneReading {
    pub tone: Tone,
    pub emotion: String,
    pub confidence: f64,
}

impl ToneReading {
    /// Sentinel used when the classification capability fails.
    pub fn unknown() -> Self {
        Self {
            tone: Tone::Unknown,
            emotion: "unknown".to_owned(),
            confidence: 0.0,
        }
    }

    /// Arg-max over the score distribution; empty scores degrade to the
    /// sentinel.
    pub fn from_scores(scores: &[EmotionScore]) -> Self {
        let Some(best) = scores
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
        else {
            return Self::unknown();
        };
        Self {
            tone: Tone::from_emotion_label(&best.label),
            emotion: best.label.clone(),
            confidence: best.score,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum EmotionError {
    #[error("emotion classification failed: {0}")]
    ClassificationFailed(String),
}

/// External audio-emotion classification capability.
///
/// Returns a probability distribution over [`EMOTION_LABELS`]. Handles must
/// be safe for concurrent read access across analysis calls.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, audio: Waveform) -> BoxFuture<'_, Result<Vec<EmotionScore>, EmotionError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_mapping_table() {
        assert_eq!(Tone::from_emotion_label("angry"), Tone::Tense);
        assert_eq!(Tone::from_emotion_label("sad"), Tone::Calm);
        assert_eq!(Tone::from_emotion_label("neutral"), Tone::Confident);
        assert_eq!(Tone::from_emotion_label("happy"), Tone::Confident);
        assert_eq!(Tone::from_emotion_label("excited"), Tone::Energetic);
        assert_eq!(Tone::from_emotion_label("fearful"), Tone::Nervous);
        assert_eq!(Tone::from_emotion_label("disgust"), Tone::Tense);
        assert_eq!(Tone::from_emotion_label("surprise"), Tone::Energetic);
    }

    #[test]
    fn tone_mapping_is_case_insensitive() {
        assert_eq!(Tone::from_emotion_label("ANGRY"), Tone::Tense);
        assert_eq!(Tone::from_emotion_label("Happy"), Tone::Confident);
    }

    #[test]
    fn unlisted_labels_map_to_neutral() {
        assert_eq!(Tone::from_emotion_label("bored"), Tone::Neutral);
        assert_eq!(Tone::from_emotion_label(""), Tone::Neutral);
    }

    #[test]
    fn reading_picks_the_arg_max_label() {
        let scores = vec![
            EmotionScore {
                label: "sad".to_owned(),
                score: 0.2,
            },
            EmotionScore {
                label: "excited".to_owned(),
                score: 0.7,
            },
            EmotionScore {
                label: "neutral".to_owned(),
                score: 0.1,
            },
        ];
        let reading = ToneReading::from_scores(&scores);
        assert_eq!(reading.tone, Tone::Energetic);
        assert_eq!(reading.emotion, "excited");
        assert!((reading.confidence - 0.7).abs() < 1e-12);
    }

    #[test]
    fn empty_distribution_degrades_to_sentinel() {
        let reading = ToneReading::from_scores(&[]);
        assert_eq!(reading.tone, Tone::Unknown);
        assert_eq!(reading.emotion, "unknown");
        assert_eq!(reading.confidence, 0.0);
    }

    #[test]
    fn tone_serializes_lowercase() {
        let json = serde_json::to_string(&Tone::Energetic).unwrap();
        assert_eq!(json, "\"energetic\"");
    }
}
