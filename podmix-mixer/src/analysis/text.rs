//! Text-driven dialogue features
//!
//! Each script line carries its spoken text with bracketed performance
//! tags such as `[laughs]` or `[interrupting]`. Known tags are stripped
//! before analysis; the `[interrupting]` tag itself is a feature.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Bracketed performance tags removed before text analysis
pub const EMOTION_TAGS: &[&str] = &[
    "laughs",
    "laughing",
    "chuckles",
    "giggles",
    "sighs",
    "gasps",
    "excited",
    "curious",
    "thoughtful",
    "surprised",
    "whispers",
    "sarcastic",
    "serious",
    "happy",
    "sad",
    "hesitant",
    "pause",
    "interrupting",
    "interrupts",
];

/// Tags that mark a line as cutting into the previous speaker
const INTERRUPT_TAGS: &[&str] = &["interrupting", "interrupts"];

/// Lines with at most this many words may count as short reactions
pub const SHORT_REACTION_MAX_WORDS: usize = 3;

/// English and Spanish interjections, normalized (lowercase, no punctuation)
const REACTION_LEXICON: &[&str] = &[
    // English
    "yeah", "yes", "yep", "yup", "no", "nope", "ok", "okay", "right", "sure",
    "wow", "oh", "ah", "uh", "um", "hmm", "mhm", "mmhmm", "uhhuh", "huh",
    "exactly", "really", "cool", "nice", "great", "totally", "absolutely",
    "true", "got it", "i see", "oh wow", "no way", "of course", "oh really",
    "oh yeah", "yeah yeah", "right right", "that's right", "thats right",
    "fair enough", "indeed", "definitely", "interesting", "ha", "haha",
    // Spanish
    "sí", "si", "claro", "vale", "exacto", "ajá", "aja", "bueno", "vaya",
    "genial", "cierto", "ya", "claro que sí", "claro que si", "de acuerdo",
    "qué bien", "que bien", "en serio", "órale", "orale", "mmm", "eh",
];

fn reaction_lexicon() -> &'static HashSet<&'static str> {
    static LEXICON: OnceLock<HashSet<&'static str>> = OnceLock::new();
    LEXICON.get_or_init(|| REACTION_LEXICON.iter().copied().collect())
}

/// Pacing-relevant features of one script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFeatures {
    /// Text with known tags removed and whitespace collapsed
    pub clean_text: String,
    pub word_count: usize,
    pub is_short_reaction: bool,
    pub is_interrupting: bool,
    pub is_question: bool,
    pub ends_with_trail_off: bool,
}

impl TextFeatures {
    /// Derive features from a raw script line
    pub fn analyze(raw: &str) -> Self {
        let (clean_text, tags) = strip_tags(raw);
        let word_count = clean_text.split_whitespace().count();

        let is_short_reaction = word_count > 0
            && word_count <= SHORT_REACTION_MAX_WORDS
            && reaction_lexicon().contains(normalize(&clean_text).as_str());

        let is_interrupting = tags.iter().any(|t| INTERRUPT_TAGS.contains(&t.as_str()));

        Self {
            is_question: clean_text.ends_with('?'),
            ends_with_trail_off: clean_text.ends_with("...") || clean_text.ends_with('…'),
            clean_text,
            word_count,
            is_short_reaction,
            is_interrupting,
        }
    }
}

/// Remove known `[tag]` markers, returning the cleaned text and the tags found.
///
/// Unknown bracketed text is left in place.
pub fn strip_tags(raw: &str) -> (String, Vec<String>) {
    let mut cleaned = String::with_capacity(raw.len());
    let mut tags = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        let Some(close_offset) = rest[open..].find(']') else {
            break;
        };
        let close = open + close_offset;
        let tag = rest[open + 1..close].trim().to_lowercase();

        cleaned.push_str(&rest[..open]);
        if EMOTION_TAGS.contains(&tag.as_str()) {
            tags.push(tag);
            cleaned.push(' ');
        } else {
            cleaned.push_str(&rest[open..=close]);
        }
        rest = &rest[close + 1..];
    }
    cleaned.push_str(rest);

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (collapsed, tags)
}

/// Lowercase, drop punctuation, collapse whitespace
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '\'')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
