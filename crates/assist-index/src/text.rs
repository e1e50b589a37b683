//! Text normalization and tokenization.
//!
//! The same normalizer is used for indexed questions, incoming queries,
//! classifier keyword tables and cache keys, so all of them agree on what
//! "the same text" means.

/// Normalize text for matching.
///
/// Lowercases, folds common Latin accents (`é` -> `e`, `ç` -> `c`),
/// replaces every non-alphanumeric character with a space and collapses
/// runs of whitespace. The result has no leading or trailing space.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            push_folded(&mut out, c);
        } else {
            pending_space = true;
        }
    }

    out
}

fn push_folded(out: &mut String, c: char) {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ç' => 'c',
        'ñ' => 'n',
        'œ' => {
            out.push_str("oe");
            return;
        }
        'æ' => {
            out.push_str("ae");
            return;
        }
        other => other,
    };
    out.push(folded);
}

/// Tokenize already-normalized text into index terms.
///
/// Filters out:
/// - Stop words (French and English)
/// - Single character tokens
/// - Numbers
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .filter(|s| s.chars().count() > 1)
        .filter(|s| !is_stop_word(s))
        .filter(|s| !s.chars().all(|c| c.is_numeric()))
        .map(String::from)
        .collect()
}

/// Normalize then tokenize.
pub fn terms(text: &str) -> Vec<String> {
    tokenize(&normalize(text))
}

/// Endings a matched keyword may carry: plural and feminine forms.
const INFLECTIONS: &[&str] = &["", "s", "x", "e", "es"];

/// Check whether `keyword` occurs as whole words in `normalized_text`.
///
/// Both sides must already be normalized. Multi-word keywords are matched
/// as a phrase. The last word may carry an inflection (`delai` matches
/// `delais`, `frustre` matches `frustree`) but not an arbitrary suffix
/// (`nul` does not match `nulle`, `fee` does not match `feedback`).
pub fn contains_keyword(normalized_text: &str, normalized_keyword: &str) -> bool {
    if normalized_keyword.is_empty() {
        return false;
    }
    normalized_text
        .match_indices(normalized_keyword)
        .any(|(pos, _)| {
            let starts_word = pos == 0 || normalized_text.as_bytes()[pos - 1] == b' ';
            let rest = &normalized_text[pos + normalized_keyword.len()..];
            let ending = rest.split(' ').next().unwrap_or_default();
            starts_word && INFLECTIONS.contains(&ending)
        })
}

/// Check if a (normalized) word is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    const STOP_WORDS: &[&str] = &[
        // English
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "this",
        "they", "but", "have", "had", "what", "when", "where", "who", "which", "why", "how", "all",
        "each", "both", "more", "most", "other", "some", "such", "no", "nor", "not", "only", "so",
        "than", "too", "very", "can", "just", "should", "now", "also", "been", "being", "do",
        "does", "did", "would", "could", "about", "into", "if", "we", "you", "your", "our",
        "their", "me", "my", "i",
        // French
        "le", "la", "les", "de", "des", "du", "un", "une", "et", "est", "sont", "vos", "votre",
        "vous", "je", "tu", "il", "elle", "nous", "ils", "elles", "mon", "ma", "mes", "ton", "ta",
        "tes", "son", "sa", "ses", "notre", "nos", "leur", "leurs", "ce", "cet", "cette", "ces",
        "que", "qui", "quoi", "dans", "sur", "pour", "par", "avec", "sans", "en", "au", "aux",
        "ou", "mais", "donc", "ne", "pas", "se", "ai", "ont", "suis", "etre", "avoir", "quel",
        "quels", "quelle", "quelles", "comment", "pourquoi", "quand", "combien", "qu",
        "peux", "peut", "puis", "faire", "fait", "ca", "cela", "y", "si", "tres", "bien",
        "bonjour", "merci", "svp",
    ];

    STOP_WORDS.contains(&word)
}
