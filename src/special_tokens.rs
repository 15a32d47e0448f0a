//! Reserved token strings and vocabulary inventory assembly.

/// Padding token, always assigned index 0.
pub const PAD: &str = "<pad>";
/// Unknown-token placeholder, always assigned index 1.
pub const UNK: &str = "<unk>";
/// Begin-of-sequence marker, always assigned index 2.
pub const BOS: &str = "<bos>";
/// End-of-sequence marker, always assigned index 3.
pub const EOS: &str = "<eos>";

/// Returns the four always-reserved tokens in their fixed index order.
#[must_use]
pub fn leading_tokens() -> [&'static str; 4] {
    [PAD, UNK, BOS, EOS]
}

/// Builds the leading special-token inventory: the four reserved tokens
/// followed by any caller-supplied extras in the order given, with duplicates
/// dropped while preserving the first occurrence.
#[must_use]
pub fn assemble(extras: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = leading_tokens().iter().map(|t| (*t).to_string()).collect();
    for token in extras {
        if !tokens.iter().any(|existing| existing == token) {
            tokens.push(token.clone());
        }
    }
    tokens
}
