//! Incremental codecs with the "replace malformed" policy.
//!
//! A [`CodedString`](crate::CodedString) needs to decode bytes as they are
//! walked and to re-encode text being written back, without ever failing:
//! malformed input turns into U+FFFD and unrepresentable runes turn into
//! `?`. Decoders and encoders are cheap stateful values created per
//! operation; a decoder in particular can be fed arbitrary chunks (down to
//! one byte at a time) and holds partial multi-byte sequences across calls
//! until `last` flushes them.

const REPLACEMENT: char = '\u{fffd}';

/// A named byte encoding. UTF-8 is the default; the single-byte encodings
/// mostly serve callers porting buffers from legacy sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
    Ascii,
}

impl Encoding {
    /// Look an encoding up by any of its usual labels, case-insensitively.
    ///
    /// # Example
    ///
    /// ```
    /// # use runebuf::Encoding;
    /// assert_eq!(Encoding::for_label("UTF-8"), Some(Encoding::Utf8));
    /// assert_eq!(Encoding::for_label("iso-8859-1"), Some(Encoding::Latin1));
    /// assert_eq!(Encoding::for_label("ebcdic"), None);
    /// ```
    pub fn for_label(label: &str) -> Option<Encoding> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Some(Encoding::Latin1),
            "ascii" | "us-ascii" => Some(Encoding::Ascii),
            _ => None,
        }
    }

    /// Canonical name of the encoding.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
            Encoding::Ascii => "ascii",
        }
    }

    pub fn new_decoder(self) -> Decoder {
        Decoder {
            encoding: self,
            code_point: 0,
            needed: 0,
            pending: 0,
            lower: 0x80,
            upper: 0xbf,
        }
    }

    pub fn new_encoder(self) -> Encoder {
        Encoder { encoding: self }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

/// One decoded rune together with the number of input bytes it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DecodedRune {
    pub(crate) ch: char,
    pub(crate) width: usize,
}

/// Streaming decoder. Replace policy: malformed sub-sequences become
/// U+FFFD, substituting one replacement per maximal invalid subpart, which
/// is the same split `String::from_utf8_lossy` produces.
#[derive(Debug, Clone)]
pub struct Decoder {
    encoding: Encoding,
    // UTF-8 state: accumulated code point, continuations still expected,
    // bytes consumed towards the rune in progress, and the valid range for
    // the next continuation byte.
    code_point: u32,
    needed: u8,
    pending: usize,
    lower: u8,
    upper: u8,
}

impl Decoder {
    /// Decode a chunk, returning the runes it completes. `last` flushes a
    /// dangling partial sequence as a single replacement rune.
    pub fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        let mut runes = Vec::new();
        self.decode_into(bytes, last, &mut runes);
        runes.iter().map(|r| r.ch).collect()
    }

    pub(crate) fn decode_into(&mut self, bytes: &[u8], last: bool, out: &mut Vec<DecodedRune>) {
        match self.encoding {
            Encoding::Utf8 => {
                for &b in bytes {
                    self.push_utf8(b, out);
                }
                if last && self.needed > 0 {
                    out.push(DecodedRune {
                        ch: REPLACEMENT,
                        width: self.pending,
                    });
                    self.reset_utf8();
                }
            }
            Encoding::Latin1 => {
                for &b in bytes {
                    out.push(DecodedRune {
                        ch: b as char,
                        width: 1,
                    });
                }
            }
            Encoding::Ascii => {
                for &b in bytes {
                    let ch = if b < 0x80 { b as char } else { REPLACEMENT };
                    out.push(DecodedRune { ch, width: 1 });
                }
            }
        }
    }

    fn reset_utf8(&mut self) {
        self.code_point = 0;
        self.needed = 0;
        self.pending = 0;
        self.lower = 0x80;
        self.upper = 0xbf;
    }

    fn push_utf8(&mut self, byte: u8, out: &mut Vec<DecodedRune>) {
        if self.needed == 0 {
            match byte {
                0x00..=0x7f => out.push(DecodedRune {
                    ch: byte as char,
                    width: 1,
                }),
                0xc2..=0xdf => {
                    self.needed = 1;
                    self.pending = 1;
                    self.code_point = (byte & 0x1f) as u32;
                }
                0xe0..=0xef => {
                    // The first continuation range excludes overlong forms
                    // (0xe0) and surrogates (0xed).
                    if byte == 0xe0 {
                        self.lower = 0xa0;
                    } else if byte == 0xed {
                        self.upper = 0x9f;
                    }
                    self.needed = 2;
                    self.pending = 1;
                    self.code_point = (byte & 0x0f) as u32;
                }
                0xf0..=0xf4 => {
                    if byte == 0xf0 {
                        self.lower = 0x90;
                    } else if byte == 0xf4 {
                        self.upper = 0x8f;
                    }
                    self.needed = 3;
                    self.pending = 1;
                    self.code_point = (byte & 0x07) as u32;
                }
                // Stray continuation bytes and the never-valid leads
                // (0xc0, 0xc1, 0xf5..).
                _ => out.push(DecodedRune {
                    ch: REPLACEMENT,
                    width: 1,
                }),
            }
            return;
        }

        if (self.lower..=self.upper).contains(&byte) {
            self.lower = 0x80;
            self.upper = 0xbf;
            self.code_point = (self.code_point << 6) | (byte & 0x3f) as u32;
            self.pending += 1;
            self.needed -= 1;
            if self.needed == 0 {
                // The continuation ranges above make the accumulated value a
                // valid scalar, so this never actually substitutes.
                let ch = char::from_u32(self.code_point).unwrap_or(REPLACEMENT);
                let width = self.pending;
                out.push(DecodedRune { ch, width });
                self.reset_utf8();
            }
        } else {
            // The prefix can no longer be completed: it becomes one
            // replacement rune, and the offending byte restarts decoding.
            let width = self.pending;
            out.push(DecodedRune {
                ch: REPLACEMENT,
                width,
            });
            self.reset_utf8();
            self.push_utf8(byte, out);
        }
    }
}

/// Streaming encoder. Replace policy: runes the target encoding cannot
/// express are written as `?`.
#[derive(Debug, Clone)]
pub struct Encoder {
    encoding: Encoding,
}

impl Encoder {
    pub fn encode(&mut self, s: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(s.len());
        self.encode_into(s, &mut out);
        out
    }

    pub fn encode_into(&mut self, s: &str, out: &mut Vec<u8>) {
        match self.encoding {
            Encoding::Utf8 => out.extend_from_slice(s.as_bytes()),
            Encoding::Latin1 => {
                for ch in s.chars() {
                    out.push(if (ch as u32) <= 0xff { ch as u32 as u8 } else { b'?' });
                }
            }
            Encoding::Ascii => {
                for ch in s.chars() {
                    out.push(if ch.is_ascii() { ch as u8 } else { b'?' });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_all_at_once(bytes: &[u8]) -> String {
        Encoding::Utf8.new_decoder().decode(bytes, true)
    }

    fn utf8_byte_at_a_time(bytes: &[u8]) -> Vec<DecodedRune> {
        let mut decoder = Encoding::Utf8.new_decoder();
        let mut out = Vec::new();
        for (i, &b) in bytes.iter().enumerate() {
            decoder.decode_into(&[b], i == bytes.len() - 1, &mut out);
        }
        out
    }

    const VECTORS: &[&[u8]] = &[
        b"",
        b"hello",
        "κόσμε".as_bytes(),
        "a\u{2190}b".as_bytes(),
        "\u{10190}\u{1f618}".as_bytes(),
        b"\xff\xff",
        b"\xe2\x86",
        b"\xe2\x86\x90",
        b"\xe2\x86x",
        b"\xc2A",
        b"\xc2",
        b"\xe0\x80",
        b"\xed\xa0\x80",
        b"\xf4\x90\x80\x80",
        b"\xc0\xaf",
        b"a\x80b",
        b"\xf0\x9f\x98",
    ];

    #[test]
    fn replace_policy_matches_lossy_conversion() {
        for &v in VECTORS {
            assert_eq!(
                utf8_all_at_once(v),
                String::from_utf8_lossy(v),
                "input {v:x?}"
            );
        }
    }

    #[test]
    fn byte_at_a_time_agrees_with_bulk() {
        for &v in VECTORS {
            let runes = utf8_byte_at_a_time(v);
            let s: String = runes.iter().map(|r| r.ch).collect();
            assert_eq!(s, utf8_all_at_once(v), "input {v:x?}");
            let total: usize = runes.iter().map(|r| r.width).sum();
            assert_eq!(total, v.len(), "widths must cover the input {v:x?}");
        }
    }

    #[test]
    fn split_sequences_survive_chunk_boundaries() {
        let mut decoder = Encoding::Utf8.new_decoder();
        assert_eq!(decoder.decode(b"\xe2", false), "");
        assert_eq!(decoder.decode(b"\x86\x90", true), "\u{2190}");

        let mut decoder = Encoding::Utf8.new_decoder();
        assert_eq!(decoder.decode(b"\xf0\x9f", false), "");
        assert_eq!(decoder.decode(b"\x98\x98", true), "\u{1f618}");
    }

    #[test]
    fn per_rune_widths() {
        let runes = utf8_byte_at_a_time("a\u{e9}\u{2190}\u{1f618}".as_bytes());
        let widths: Vec<usize> = runes.iter().map(|r| r.width).collect();
        assert_eq!(widths, [1, 2, 3, 4]);

        // An aborted prefix keeps its own bytes; the byte that killed it
        // starts fresh.
        let runes = utf8_byte_at_a_time(b"\xe2\x86x");
        let pairs: Vec<(char, usize)> = runes.iter().map(|r| (r.ch, r.width)).collect();
        assert_eq!(pairs, [('\u{fffd}', 2), ('x', 1)]);
    }

    #[test]
    fn random_soup_matches_lossy_conversion() {
        use rand::prelude::*;
        let mut rng = rand::rngs::SmallRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let len = rng.gen_range(0..64);
            let soup: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            assert_eq!(
                utf8_all_at_once(&soup),
                String::from_utf8_lossy(&soup),
                "input {soup:x?}"
            );
            let runes = utf8_byte_at_a_time(&soup);
            let total: usize = runes.iter().map(|r| r.width).sum();
            assert_eq!(total, soup.len());
        }
    }

    #[test]
    fn single_byte_encodings() {
        let mut decoder = Encoding::Latin1.new_decoder();
        assert_eq!(decoder.decode(b"caf\xe9", true), "café");

        let mut decoder = Encoding::Ascii.new_decoder();
        assert_eq!(decoder.decode(b"ab\x80", true), "ab\u{fffd}");

        let mut encoder = Encoding::Latin1.new_encoder();
        assert_eq!(encoder.encode("café → bar"), b"caf\xe9 ? bar");

        let mut encoder = Encoding::Ascii.new_encoder();
        assert_eq!(encoder.encode("naïve"), b"na?ve");
    }

    #[test]
    fn labels() {
        assert_eq!(Encoding::for_label("utf8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::for_label(" UTF-8 "), Some(Encoding::Utf8));
        assert_eq!(Encoding::for_label("latin1"), Some(Encoding::Latin1));
        assert_eq!(Encoding::for_label("us-ascii"), Some(Encoding::Ascii));
        assert_eq!(Encoding::for_label("shift-jis"), None);
        assert_eq!(Encoding::Utf8.name(), "utf-8");
    }
}
