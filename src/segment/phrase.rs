use std::fmt;

/// Punctuation marks that act as phrase separators.
pub const SEPARATORS: [char; 2] = [',', ';'];

/// Token lists this short are never split.
const MAX_UNSPLIT_TOKENS: usize = 5;

/// A separator must sit at or after this index to be a split point.
const MIN_SEPARATOR_INDEX: usize = 3;

/// Minimum tokens from the separator (inclusive) to the end of the list.
const MIN_TAIL_TOKENS: usize = 3;

/// A short span of narration: an ordered, immutable list of word tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    tokens: Vec<String>,
}

impl Phrase {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Build a phrase from literal text, one token per whitespace-separated word.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace().map(str::to_string).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

pub fn is_separator(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if SEPARATORS.contains(&c))
}

/// Split a sentence into word tokens.
///
/// A word ending in a separator is split into the bare word and the
/// separator as its own token.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for word in sentence.split_whitespace() {
        match word.chars().last() {
            Some(last) if SEPARATORS.contains(&last) && word.chars().count() > 1 => {
                let stem = &word[..word.len() - last.len_utf8()];
                tokens.push(stem.to_string());
                tokens.push(last.to_string());
            }
            _ => tokens.push(word.to_string()),
        }
    }

    tokens
}

/// Index of the separator `tokens` should be split at, if any.
fn split_point(tokens: &[String]) -> Option<usize> {
    if tokens.len() <= MAX_UNSPLIT_TOKENS {
        return None;
    }

    let index = tokens
        .iter()
        .skip(MIN_SEPARATOR_INDEX)
        .position(|t| is_separator(t))?
        + MIN_SEPARATOR_INDEX;

    if tokens.len() - index < MIN_TAIL_TOKENS {
        return None;
    }

    Some(index)
}

/// Fold a sentence's tokens into phrases.
///
/// Walks a cursor over the tokens: each split emits the tokens before the
/// separator, drops the separator and continues after it. When no split
/// point remains the rest of the tokens form the last phrase, however long.
pub fn split_phrases(tokens: &[String]) -> Vec<Phrase> {
    let mut phrases = Vec::new();
    let mut cursor = 0;

    while cursor < tokens.len() {
        let rest = &tokens[cursor..];
        match split_point(rest) {
            Some(index) => {
                phrases.push(Phrase::new(rest[..index].to_vec()));
                cursor += index + 1;
            }
            None => {
                phrases.push(Phrase::new(rest.to_vec()));
                break;
            }
        }
    }

    phrases
}

/// Whether a phrase could still be split by [`split_phrases`].
pub fn is_splittable(tokens: &[String]) -> bool {
    split_point(tokens).is_some()
}
