//! Literal strings packed into instruction words.
//!
//! SPIR-V stores strings as nul-terminated UTF-8, little-endian, padded with
//! zero bytes up to a word boundary (`OpName`, `OpEntryPoint`,
//! `OpExtInstImport`, ...).

/// Decode a literal string starting at the beginning of `words`.
///
/// Returns `None` when no terminating nul is found or the bytes are not
/// valid UTF-8.
pub fn decode_string(words: &[u32]) -> Option<String> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        for byte in word.to_le_bytes() {
            if byte == 0 {
                return String::from_utf8(bytes).ok();
            }
            bytes.push(byte);
        }
    }
    None
}

/// Number of words a literal string occupies, terminator included.
pub fn string_words(s: &str) -> usize {
    s.len() / 4 + 1
}

/// Encode a literal string into padded words.
pub fn encode_string(s: &str) -> Vec<u32> {
    let mut words = vec![0u32; string_words(s)];
    for (i, byte) in s.bytes().enumerate() {
        words[i / 4] |= u32::from(byte) << ((i % 4) * 8);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("main")]
    #[case("GLSL.std.450")]
    #[case("a_name_of_awkward_length")]
    fn round_trips(#[case] s: &str) {
        let words = encode_string(s);
        assert_eq!(words.len(), string_words(s));
        assert_eq!(decode_string(&words).as_deref(), Some(s));
    }

    #[test]
    fn exact_multiple_gets_a_terminator_word() {
        // four bytes of text still need a fifth zero byte
        assert_eq!(encode_string("main").len(), 2);
    }

    #[test]
    fn missing_terminator_is_rejected() {
        assert_eq!(decode_string(&[0x6161_6161]), None);
    }
}
