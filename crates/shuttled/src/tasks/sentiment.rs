//! The `SENTIMENT` keyword classifier.
//!
//! Counts how many positive and negative keywords occur in the input text
//! and labels it with whichever side has more. Each distinct keyword counts
//! once, however often it appears.

use std::fmt;

use shuttle_plugins::{TaskError, TaskHandler, TaskInput, TaskOutcome};

/// Task type served by [`SentimentTask`].
pub const SENTIMENT_TASK: &str = "SENTIMENT";

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "happy",
    "love",
    "amazing",
    "wonderful",
    "best",
    "awesome",
    "fantastic",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "sad",
    "terrible",
    "awful",
    "hate",
    "angry",
    "disappointed",
    "horrible",
    "worst",
    "fail",
    "poor",
];

// Confidence is kept in hundredths: 0.50 plus 0.10 per keyword, capped at
// 0.99.
const BASE_CONFIDENCE: u32 = 50;
const CONFIDENCE_STEP: u32 = 10;
const MAX_CONFIDENCE: u32 = 99;

/// Overall polarity of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// More positive than negative keywords.
    Positive,
    /// More negative than positive keywords.
    Negative,
    /// Balanced or no keywords.
    Neutral,
}

impl Polarity {
    /// Upper-case label used in summaries and output.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

/// A polarity with its confidence in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Overall polarity.
    pub polarity: Polarity,
    /// Confidence in hundredths, between 50 and 99.
    pub confidence_pct: u32,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (confidence: {}.{:02})",
            self.polarity.label(),
            self.confidence_pct / 100,
            self.confidence_pct % 100
        )
    }
}

/// Classifies `text`. Matching is case-insensitive substring search.
pub fn classify(text: &str) -> Classification {
    let lowered = text.to_lowercase();
    let count = |words: &[&str]| -> u32 {
        let hits = words.iter().filter(|word| lowered.contains(*word)).count();
        u32::try_from(hits).unwrap_or(u32::MAX)
    };
    let positive = count(POSITIVE_WORDS);
    let negative = count(NEGATIVE_WORDS);

    let (polarity, hits) = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => (Polarity::Positive, positive),
        std::cmp::Ordering::Less => (Polarity::Negative, negative),
        std::cmp::Ordering::Equal => (Polarity::Neutral, 0),
    };
    let confidence_pct = BASE_CONFIDENCE
        .saturating_add(CONFIDENCE_STEP.saturating_mul(hits))
        .min(MAX_CONFIDENCE);

    Classification {
        polarity,
        confidence_pct,
    }
}

/// Built-in handler wrapping [`classify`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SentimentTask;

impl TaskHandler for SentimentTask {
    fn task_type(&self) -> &str {
        SENTIMENT_TASK
    }

    fn invoke(&self, input: &TaskInput<'_>) -> Result<TaskOutcome, TaskError> {
        let text = std::str::from_utf8(input.payload)
            .map_err(|error| TaskError::rejected(format!("input is not valid UTF-8: {error}")))?;
        let classification = classify(text);
        Ok(TaskOutcome::with_output(
            classification.polarity.label(),
            classification.to_string().into_bytes(),
        ))
    }

    fn prefers_file_output(&self) -> bool {
        true
    }
}
