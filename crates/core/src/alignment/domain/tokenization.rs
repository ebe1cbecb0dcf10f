/// Split free text into comparable word tokens.
///
/// Lowercases, splits on whitespace and strips punctuation at word edges, so
/// a transcript's "Fox." matches a reference "fox". Apostrophes inside a word
/// ("don't") are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
