//! Reading-time estimation from body text or a word count.

use serde::Serialize;

pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingTime {
    pub text: String,
    pub minutes: f64,
    pub words: usize,
}

pub trait ReadingTimeEstimator: Send + Sync {
    fn estimate_words(&self, words: usize) -> ReadingTime;

    fn estimate(&self, text: &str) -> ReadingTime {
        self.estimate_words(count_words(text))
    }
}

/// Fixed reading speed estimator.
#[derive(Debug, Clone, Copy)]
pub struct WordsPerMinute {
    rate: u32,
}

impl WordsPerMinute {
    /// A zero rate is clamped to one word per minute.
    pub fn new(rate: u32) -> Self {
        Self { rate: rate.max(1) }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }
}

impl Default for WordsPerMinute {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS_PER_MINUTE)
    }
}

impl ReadingTimeEstimator for WordsPerMinute {
    fn estimate_words(&self, words: usize) -> ReadingTime {
        let minutes = words as f64 / f64::from(self.rate);
        let rounded = ((minutes * 100.0).round() / 100.0).ceil();
        ReadingTime {
            text: format!("{rounded} min read"),
            minutes,
            words,
        }
    }
}

/// Count words: whitespace-separated tokens holding a letter or digit, with
/// each CJK ideograph counted on its own.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .map(|token| {
            let ideographs = token.chars().filter(|ch| is_cjk(*ch)).count();
            let has_word = token
                .chars()
                .any(|ch| !is_cjk(ch) && ch.is_alphanumeric());
            ideographs + usize::from(has_word)
        })
        .sum()
}

fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3040..=0x30FF      // hiragana, katakana
            | 0x3400..=0x4DBF // CJK extension A
            | 0x4E00..=0x9FFF // CJK unified ideographs
            | 0xAC00..=0xD7AF // hangul syllables
            | 0xF900..=0xFAFF // compatibility ideographs
    )
}
