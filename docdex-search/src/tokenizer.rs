//! Text normalization shared by indexing and query processing
//!
//! Both sides of a match must normalize identically, so every engine calls
//! [`tokenize`] for documents and queries alike. The pipeline is intentionally
//! plain: lowercase, strip everything that is not alphanumeric or whitespace
//! (Unicode-aware, so accented letters survive), split on whitespace, then
//! drop short tokens and stopwords. No stemming.

/// High-frequency Spanish function words excluded from the index.
///
/// The corpus this system serves is Spanish-language business documents; the
/// list is a small closed set, not a general-purpose stopword catalog.
pub const STOPWORDS: &[&str] = &[
    "el", "la", "los", "las", "de", "del", "y", "o", "a", "en", "un", "una", "con", "por", "para",
    "es", "son", "que", "como",
];

/// Minimum token length kept by the tokenizer, exclusive.
const MIN_TOKEN_CHARS: usize = 2;

/// Normalize raw text into index terms.
///
/// Deterministic and stateless. Tokens of two characters or fewer and tokens
/// in [`STOPWORDS`] are dropped.
///
/// ```
/// use docdex_search::tokenizer::tokenize;
///
/// let terms = tokenize("La política de contraseñas (v2)");
/// assert_eq!(terms, vec!["política", "contraseñas"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .filter(|token| !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(
            tokenize("Auditoría: CONTROL de acceso!"),
            vec!["auditoría", "control", "acceso"]
        );
    }

    #[test]
    fn test_drops_short_tokens_and_stopwords() {
        // "de", "la" are stopwords; "v2" is too short
        assert_eq!(tokenize("de la v2 norma"), vec!["norma"]);
    }

    #[test]
    fn test_preserves_diacritics() {
        assert_eq!(tokenize("contraseña"), vec!["contraseña"]);
        assert_eq!(tokenize("CONTRASEÑA"), vec!["contraseña"]);
    }

    #[test]
    fn test_underscores_and_digits() {
        // underscore is a separator, digit runs longer than two chars survive
        assert_eq!(tokenize("plan_2024 v1 100"), vec!["plan", "2024", "100"]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
        assert!(tokenize("!!! ???").is_empty());
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(
            tokenize("acceso   remoto\n\tseguro"),
            vec!["acceso", "remoto", "seguro"]
        );
    }
}
