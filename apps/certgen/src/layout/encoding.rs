//! WinAnsiEncoding (PDF 32000-1, Annex D) for simple fonts.
//!
//! Certificates are drawn with single-byte simple fonts, so every string is
//! mapped to WinAnsi codes before it reaches a content stream. Characters
//! outside the encoding cannot be rendered and are reported as such.

/// Code points 0x80..=0x9F that differ from Latin-1. Unassigned slots are omitted.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// Maps a character to its WinAnsi byte.
pub fn encode_char(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WINANSI_HIGH
            .iter()
            .find(|(_, ch)| *ch == c)
            .map(|(byte, _)| *byte),
    }
}

/// Maps a WinAnsi byte back to its character, `None` for unassigned codes.
pub fn decode_byte(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => char::from_u32(byte as u32),
        _ => WINANSI_HIGH
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|(_, ch)| *ch),
    }
}

/// Encodes a whole string, `None` if any character falls outside WinAnsi.
pub fn encode_str(s: &str) -> Option<Vec<u8>> {
    s.chars().map(encode_char).collect()
}
