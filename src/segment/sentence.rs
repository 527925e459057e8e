//! Sentence boundary detection.

/// Splits free text into ordered sentences.
///
/// Implementations must be deterministic: identical input yields identical
/// output.
pub trait SentenceSplitter: Send + Sync {
    fn sentences(&self, text: &str) -> Vec<String>;
}

const TERMINALS: &[char] = &['.', '!', '?'];
const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201D}', '\u{2019}'];

/// Words ending in a period that do not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "st.", "jr.", "sr.", "vs.", "etc.", "e.g.", "i.e.",
];

/// Punctuation-driven splitter.
///
/// Breaks after `.`, `!` or `?` (including runs like `?!` and trailing
/// closing quotes or brackets) when followed by whitespace or the end of the
/// text. A lone period after a known abbreviation or a capital initial does
/// not break.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSentenceSplitter;

impl SentenceSplitter for RuleSentenceSplitter {
    fn sentences(&self, text: &str) -> Vec<String> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i].1;
            if !TERMINALS.contains(&c) {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < chars.len() && (TERMINALS.contains(&chars[j].1) || CLOSERS.contains(&chars[j].1))
            {
                j += 1;
            }

            let at_boundary = j == chars.len() || chars[j].1.is_whitespace();
            let end = chars.get(j).map_or(text.len(), |&(byte, _)| byte);
            let lone_period = c == '.' && j == i + 1;

            if at_boundary && !(lone_period && ends_with_abbreviation(&text[start..end])) {
                push_sentence(&mut sentences, &text[start..end]);
                start = end;
            }
            i = j;
        }

        push_sentence(&mut sentences, &text[start..]);
        sentences
    }
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

fn ends_with_abbreviation(span: &str) -> bool {
    let word = span
        .split_whitespace()
        .last()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    ABBREVIATIONS.contains(&word.to_lowercase().as_str()) || is_initial(word)
}

/// `J.` style initials. The pronoun `I` is excluded.
fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_uppercase() && c != 'I'
    )
}
