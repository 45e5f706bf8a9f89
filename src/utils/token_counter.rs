/// Rough token estimate for prompt text.
///
/// CJK ideographs and kana usually map to about one token each, everything
/// else to about four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    let (wide, narrow) = text.chars().fold((0usize, 0usize), |(wide, narrow), c| {
        if is_cjk(c) {
            (wide + 1, narrow)
        } else {
            (wide, narrow + 1)
        }
    });
    wide + narrow.div_ceil(4)
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF      // hiragana, katakana
        | 0x3400..=0x4DBF    // CJK extension A
        | 0x4E00..=0x9FFF    // CJK unified ideographs
        | 0xF900..=0xFAFF    // compatibility ideographs
        | 0xFF00..=0xFFEF)   // full-width forms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_text_uses_four_chars_per_token() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn cjk_counts_one_token_per_char() {
        assert_eq!(estimate_tokens("写一首诗"), 4);
        assert_eq!(estimate_tokens("写诗 poem"), 2 + 2);
    }
}
