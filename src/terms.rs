//! Search-term extraction for clip lookup.

use crate::segment::Phrase;

/// Derives a video search query from a phrase.
pub trait TermExtractor: Send + Sync {
    /// Best effort; falls back to the phrase text when nothing better is found.
    fn terms(&self, phrase: &Phrase) -> String;
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "before", "being", "but", "by", "can", "could", "did", "do", "does", "for", "from",
    "had", "has", "have", "he", "her", "hers", "him", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "just", "me", "my", "no", "not", "of", "on", "once", "or", "our", "out",
    "she", "so", "some", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "to", "too", "up", "upon", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "will", "with", "would", "you", "your",
];

/// Keeps the first few content words of a phrase.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    max_terms: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self { max_terms: 3 }
    }
}

impl KeywordExtractor {
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms.max(1);
        self
    }
}

impl TermExtractor for KeywordExtractor {
    fn terms(&self, phrase: &Phrase) -> String {
        let keywords: Vec<String> = phrase
            .tokens()
            .iter()
            .map(|t| {
                t.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
            .take(self.max_terms)
            .collect();

        if keywords.is_empty() {
            phrase.text()
        } else {
            keywords.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_content_words() {
        let phrase = Phrase::from_text("Jack and Jill went up the hill.");
        assert_eq!(KeywordExtractor::default().terms(&phrase), "jack jill went");
    }

    #[test]
    fn test_max_terms() {
        let phrase = Phrase::from_text("The big red dog barked");
        let extractor = KeywordExtractor::default().with_max_terms(1);
        assert_eq!(extractor.terms(&phrase), "big");
    }

    #[test]
    fn test_falls_back_to_phrase_text() {
        let phrase = Phrase::from_text("And then it was so.");
        assert_eq!(KeywordExtractor::default().terms(&phrase), "And then it was so.");
    }

    #[test]
    fn test_ignores_separator_tokens() {
        let phrase = Phrase::new(vec!["He".into(), "ran".into(), ",".into(), "jumped".into()]);
        assert_eq!(KeywordExtractor::default().terms(&phrase), "ran jumped");
    }
}
