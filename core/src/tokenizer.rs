use std::collections::HashSet;

/// Split text on runs of Unicode whitespace.
///
/// The ASCII information separators U+001C..=U+001F also split, as they do
/// in most tokenizers that published token counts for these datasets.
/// Tokens keep their original case and punctuation. Duplicates are kept and
/// order follows the text. Empty or whitespace-only text yields no tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(is_separator)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Deduplicated view of a token sequence.
pub fn token_set<S: AsRef<str>>(tokens: &[S]) -> HashSet<&str> {
    tokens.iter().map(|t| t.as_ref()).collect()
}

/// True when `s` could have been produced by [`tokenize`].
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(is_separator)
}
