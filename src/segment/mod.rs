pub mod phrase;
pub mod sentence;

pub use phrase::{is_separator, is_splittable, split_phrases, tokenize, Phrase, SEPARATORS};
pub use sentence::{RuleSentenceSplitter, SentenceSplitter};

use crate::error::{FreddyError, Result};
use tracing::debug;

/// Phrase appended to every story.
pub const TERMINAL_PHRASE: &str = "The End.";

/// Splits narrative text into speakable phrases.
pub struct Segmenter {
    splitter: Box<dyn SentenceSplitter>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(Box::new(RuleSentenceSplitter))
    }
}

impl Segmenter {
    pub fn new(splitter: Box<dyn SentenceSplitter>) -> Self {
        Self { splitter }
    }

    /// Segment text into phrases, in sentence order.
    pub fn segment(&self, text: &str) -> Result<Vec<Phrase>> {
        if text.trim().is_empty() {
            return Err(FreddyError::Segmentation("input text is empty".to_string()));
        }

        let sentences = self.splitter.sentences(text);
        if sentences.is_empty() {
            return Err(FreddyError::Segmentation(
                "no sentences found in input text".to_string(),
            ));
        }

        let mut phrases = Vec::new();
        for sentence in &sentences {
            let tokens = tokenize(sentence);
            let sentence_phrases = split_phrases(&tokens);
            debug!(
                "Sentence {:?}: {} tokens, {} phrases",
                sentence,
                tokens.len(),
                sentence_phrases.len()
            );
            phrases.extend(sentence_phrases);
        }

        if phrases.is_empty() {
            return Err(FreddyError::Segmentation(
                "sentences contained no words".to_string(),
            ));
        }

        Ok(phrases)
    }
}

/// Join the lines of a story file into one paragraph.
///
/// A line that does not end a sentence is joined to the next with a comma,
/// so a line break reads as a pause.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !out.is_empty() {
            if ends_sentence(&out) || out.ends_with(SEPARATORS) {
                out.push(' ');
            } else {
                out.push_str(", ");
            }
        }
        out.push_str(line);
    }

    out
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end_matches(['"', '\'', ')', ']', '\u{201D}', '\u{2019}'])
        .ends_with(['.', '!', '?'])
}

/// The ordered phrases of one run, always ending in [`TERMINAL_PHRASE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    phrases: Vec<Phrase>,
}

impl Story {
    /// Build a story from already segmented phrases, appending the terminal phrase.
    pub fn from_phrases(mut phrases: Vec<Phrase>) -> Self {
        phrases.push(Phrase::from_text(TERMINAL_PHRASE));
        Self { phrases }
    }

    /// Normalize and segment raw story text.
    pub fn from_text(text: &str, segmenter: &Segmenter) -> Result<Self> {
        let phrases = segmenter.segment(&normalize_text(text))?;
        Ok(Self::from_phrases(phrases))
    }

    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.phrases.iter().map(Phrase::text).collect()
    }
}
