//! `const fn` helpers for stepping through a `&str` one character at a time.
//!
//! Characters are handled as their UTF-8 bytes packed big-endian into a `u32`
//! (unused trailing bytes are zero), which lets tables generated by
//! `proc_regex_dfa` compare characters with plain integer patterns inside
//! constant evaluation.

#[inline(always)]
const fn code_point_len(marker: u8) -> usize {
    if marker >> 7 == 0 {
        1
    }
    else if marker >> 5 == 0b110 {
        2
    }
    else if marker >> 4 == 0b1110 {
        3
    }
    else if marker >> 3 == 0b11110 {
        4
    }
    else {
        panic!("Malformed UTF-8 codepoint");
    }
}

/// Packs the UTF-8 encoding of `c` into a `u32`, first byte most significant.
#[inline(always)]
pub const fn char_to_utf8(c: char) -> u32 {
    let code = c as u32;
    let bytes = if code < 0x80 {
        [code as u8, 0, 0, 0]
    }
    else if code < 0x800 {
        [0xC0 | (code >> 6) as u8, 0x80 | (code & 0x3F) as u8, 0, 0]
    }
    else if code < 0x1_0000 {
        [
            0xE0 | (code >> 12) as u8,
            0x80 | ((code >> 6) & 0x3F) as u8,
            0x80 | (code & 0x3F) as u8,
            0,
        ]
    }
    else {
        [
            0xF0 | (code >> 18) as u8,
            0x80 | ((code >> 12) & 0x3F) as u8,
            0x80 | ((code >> 6) & 0x3F) as u8,
            0x80 | (code & 0x3F) as u8,
        ]
    };
    u32::from_be_bytes(bytes)
}

/// Reads the character starting at byte offset `pos`.
///
/// Returns the packed character and the byte offset of the one after it.
/// `pos` must be a character boundary inside `s`.
#[inline(always)]
pub const fn next_char(s: &str, pos: usize) -> (u32, usize) {
    let bs = s.as_bytes();
    let len = code_point_len(bs[pos]);
    let mut packed = [0; 4];
    let mut i = 0;
    while i < len {
        packed[i] = bs[pos + i];
        i += 1;
    }
    (u32::from_be_bytes(packed), pos + len)
}

/// A cursor over the remaining characters of a string slice.
#[derive(Debug, Copy, Clone)]
pub struct CharSlice<'a> {
    offset: usize,
    base: &'a str,
}

impl<'a> CharSlice<'a> {
    #[inline(always)]
    pub const fn new(s: &'a str) -> Self {
        Self { offset: 0, base: s }
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool { self.offset == self.base.len() }

    /// Returns the next packed character and a cursor positioned after it.
    ///
    /// Panics when the cursor is empty.
    #[inline(always)]
    pub const fn get_advance(&self) -> (u32, CharSlice<'a>) {
        let (c, next_offset) = next_char(self.base, self.offset);
        (c, CharSlice { offset: next_offset, base: self.base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(c: char) -> u32 {
        let mut tmp = [0; 4];
        c.encode_utf8(&mut tmp);
        u32::from_be_bytes(tmp)
    }

    #[test]
    fn packs_every_encoding_width() {
        for c in ['a', '~', 'é', 'ß', '€', '中', '𝄞', '\u{10FFFF}'] {
            assert_eq!(char_to_utf8(c), packed(c), "{c:?}");
        }
    }

    #[test]
    fn next_char_steps_over_multibyte() {
        let s = "€1𝄞";
        let (c, pos) = next_char(s, 0);
        assert_eq!((c, pos), (packed('€'), 3));
        let (c, pos) = next_char(s, pos);
        assert_eq!((c, pos), (packed('1'), 4));
        let (c, pos) = next_char(s, pos);
        assert_eq!((c, pos), (packed('𝄞'), 8));
        assert_eq!(pos, s.len());
    }

    #[test]
    fn char_slice_visits_each_char() {
        let s = "aé€𝄞b";
        let mut rest = CharSlice::new(s);
        let mut seen = Vec::new();
        while !rest.is_empty() {
            let (c, next) = rest.get_advance();
            seen.push(c);
            rest = next;
        }
        assert_eq!(seen, s.chars().map(packed).collect::<Vec<_>>());
    }

    #[test]
    fn usable_in_const_context() {
        const A: u32 = char_to_utf8('a');
        const EMPTY: bool = CharSlice::new("").is_empty();
        assert_eq!(A, 0x6100_0000);
        assert!(EMPTY);
    }
}
