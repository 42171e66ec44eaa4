//! Chinese to tone-free pinyin for filename tokens

use pinyin::ToPinyin;

/// CJK Unified Ideographs block
const CJK_UNIFIED: std::ops::RangeInclusive<char> = '\u{4E00}'..='\u{9FFF}';

/// Replace every Hanzi with its plain pinyin, no separators
///
/// Characters without a pinyin reading pass through unchanged.
pub fn to_phonetic(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c.to_pinyin() {
            Some(p) => out.push_str(p.plain()),
            None => out.push(c),
        }
    }
    out
}

/// Pinyin of `text` usable inside a single file name
///
/// Path separators and control characters become `-`.
pub fn command_token(text: &str) -> String {
    to_phonetic(text)
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '-' } else { c })
        .collect()
}

/// Whether `text` contains at least one CJK Unified Ideograph
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| CJK_UNIFIED.contains(&c))
}
