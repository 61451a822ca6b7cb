//! Lexical filler-word analysis over a transcript.
//!
//! The lexicon is fixed at process start and shared read-only by every
//! analysis call. Matching is case-insensitive; surrounding punctuation is
//! stripped from single tokens only, and 2–3 word phrases are matched over
//! the raw lowercased tokens. Overlapping matches count independently: a
//! single-word filler inside a matched phrase still increments its own
//! counter.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Punctuation stripped from the ends of a single token before lookup.
const TOKEN_TRIM: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '{', '}',
];

/// Filler terms the reference coaching model was tuned against: hesitation
/// sounds, single-word crutches and short disfluent phrases.
pub const DEFAULT_FILLER_TERMS: &[&str] = &[
    // Hesitation sounds
    "uh", "er", "ah", "um", "eh", "oh", "hmm", "huh", "hm", "mm",
    // Common filler words
    "like", "so", "well", "you know", "right", "okay", "anyway", "basically",
    "actually", "literally", "really", "very", "essentially", "honestly",
    "just", "sort of", "kind of", "i mean", "i guess", "needless to say",
];

/// Read-only set of filler terms, built once and shared by all calls.
#[derive(Clone, Debug)]
pub struct FillerLexicon {
    terms: HashSet<String>,
}

impl FillerLexicon {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.into().to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for FillerLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_FILLER_TERMS.iter().copied())
    }
}

/// Filler statistics for one transcript.
///
/// `filler_rate_per_minute` keeps the reference computation
/// `total_fillers / (word_count / 100)`: despite the name it is a rate per
/// 100 words, preserved as-is for score compatibility.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FillerStats {
    pub filler_words: BTreeMap<String, u32>,
    pub total_fillers: u32,
    pub filler_rate_per_minute: f64,
    pub unique_fillers: u32,
}

/// Scan a transcript against the lexicon.
///
/// Every token position is checked three ways: the punctuation-stripped
/// single token, and the 2- and 3-word phrases starting there. An empty
/// transcript yields the canonical all-zero result.
pub fn analyze(transcript: &str, lexicon: &FillerLexicon) -> FillerStats {
    if transcript.is_empty() {
        return FillerStats::default();
    }

    let lowered = transcript.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let word_count = words.len();

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for i in 0..words.len() {
        let token = words[i].trim_matches(TOKEN_TRIM);
        if lexicon.contains(token) {
            *counts.entry(token.to_owned()).or_insert(0) += 1;
        }

        for phrase_len in 2..=3 {
            if i + phrase_len <= words.len() {
                let phrase = words[i..i + phrase_len].join(" ");
                if lexicon.contains(&phrase) {
                    *counts.entry(phrase).or_insert(0) += 1;
                }
            }
        }
    }

    let total_fillers: u32 = counts.values().sum();
    let unique_fillers = counts.len() as u32;
    let filler_rate_per_minute = if word_count > 0 {
        f64::from(total_fillers) / (word_count as f64 / 100.0)
    } else {
        0.0
    };

    FillerStats {
        filler_words: counts,
        total_fillers,
        filler_rate_per_minute,
        unique_fillers,
    }
}
