//! Single-byte text encoding for the PDF font resources.
//!
//! Both font slots are declared with `WinAnsiEncoding` plus a `Differences` array that
//! moves the six Turkish letters WinAnsi lacks onto their Windows-1254 code points, so
//! every string drawn on a page is one byte per character.

/// Code points overridden on top of `WinAnsiEncoding`.
pub const TURKISH_DIFFERENCES: [(u8, &str); 6] = [
    (0xD0, "Gbreve"),
    (0xDD, "Idotaccent"),
    (0xDE, "Scedilla"),
    (0xF0, "gbreve"),
    (0xFD, "dotlessi"),
    (0xFE, "scedilla"),
];

/// Byte drawn for characters outside the encoding.
pub const REPLACEMENT: char = '?';

/// Map a character to its byte in the page encoding.
pub fn encode_char(ch: char) -> Option<u8> {
    match ch {
        ' '..='~' => Some(ch as u8),
        'Ğ' => Some(0xD0),
        'İ' => Some(0xDD),
        'Ş' => Some(0xDE),
        'ğ' => Some(0xF0),
        'ı' => Some(0xFD),
        'ş' => Some(0xFE),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '™' => Some(0x99),
        '\u{A0}'..='\u{FF}' => {
            let byte = ch as u32 as u8;
            if TURKISH_DIFFERENCES.iter().any(|(code, _)| *code == byte) {
                None
            } else {
                Some(byte)
            }
        }
        _ => None,
    }
}

/// Inverse of [`encode_char`], used to build the `Widths` array of embedded fonts.
pub fn decode_byte(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E => Some(byte as char),
        0xD0 => Some('Ğ'),
        0xDD => Some('İ'),
        0xDE => Some('Ş'),
        0xF0 => Some('ğ'),
        0xFD => Some('ı'),
        0xFE => Some('ş'),
        0x80 => Some('€'),
        0x82 => Some('‚'),
        0x84 => Some('„'),
        0x85 => Some('…'),
        0x91 => Some('‘'),
        0x92 => Some('’'),
        0x93 => Some('“'),
        0x94 => Some('”'),
        0x95 => Some('•'),
        0x96 => Some('–'),
        0x97 => Some('—'),
        0x99 => Some('™'),
        0xA0..=0xFF => char::from_u32(byte as u32),
        _ => None,
    }
}

/// Replace characters the page encoding cannot carry, so measurement and drawing agree.
pub fn printable(ch: char) -> char {
    if ch == '\t' || ch == '\n' || ch == '\r' {
        return ' ';
    }
    if encode_char(ch).is_some() {
        ch
    } else {
        REPLACEMENT
    }
}

/// Encode a string for a `Tj` operand.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| encode_char(printable(ch)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turkish_letters_use_windows_1254_positions() {
        assert_eq!(encode("ğüşıöçĞÜŞİÖÇ"), vec![
            0xF0, 0xFC, 0xFE, 0xFD, 0xF6, 0xE7, 0xD0, 0xDC, 0xDE, 0xDD, 0xD6, 0xC7
        ]);
    }

    #[test]
    fn test_decode_is_inverse_of_encode() {
        for byte in 0x20u8..=0xFF {
            if let Some(ch) = decode_byte(byte) {
                assert_eq!(encode_char(ch), Some(byte), "byte {byte:#x}");
            }
        }
    }

    #[test]
    fn test_unsupported_characters_are_replaced() {
        assert_eq!(encode("a\u{4e2d}b"), b"a?b".to_vec());
        assert_eq!(printable('\n'), ' ');
    }
}
