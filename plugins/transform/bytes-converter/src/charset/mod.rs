//! Named character encodings.
//!
//! Names resolve case-insensitively, in this order:
//! 1. ISO-8859-1, US-ASCII and the UTF-16 family, handled here because the
//!    WHATWG registry folds them into windows-1252 / UTF-16LE.
//! 2. EBCDIC code pages from [`ebcdic`], with their IBM/cp aliases.
//! 3. Every label known to `encoding_rs`.

mod ebcdic;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use byteconv_api::error::TransformError;
use encoding_rs::{EncoderResult, Encoding};

/// Byte emitted for an unmappable character by single-byte charsets.
const SUBSTITUTE_BYTE: u8 = 0x3F;

/// What to do with a character the target charset cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmappableAction {
    /// Emit the charset's replacement byte.
    #[default]
    Replace,
    /// Fail with `ErrorKind::Encoding`.
    Fail,
}

impl FromStr for UnmappableAction {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(UnmappableAction::Replace),
            "fail" | "report" => Ok(UnmappableAction::Fail),
            other => Err(TransformError::config(format!(
                "invalid unmappable action '{other}': expected replace or fail"
            ))),
        }
    }
}

impl fmt::Display for UnmappableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmappableAction::Replace => f.write_str("replace"),
            UnmappableAction::Fail => f.write_str("fail"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  EBCDIC code pages
// ════════════════════════════════════════════════════════════════

struct CodePage {
    name: &'static str,
    aliases: &'static [&'static str],
    decode: &'static [u16; 256],
    encode: OnceLock<HashMap<u16, u8>>,
}

impl CodePage {
    const fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        decode: &'static [u16; 256],
    ) -> Self {
        Self { name, aliases, decode, encode: OnceLock::new() }
    }

    /// Reverse index. The first byte listed for a code point wins, and NEL
    /// falls back to the NL byte when the page has no byte of its own for it.
    fn encode_table(&self) -> &HashMap<u16, u8> {
        self.encode.get_or_init(|| {
            let mut table = HashMap::with_capacity(256);
            for (byte, &cp) in (0u8..=255).zip(self.decode.iter()) {
                table.entry(cp).or_insert(byte);
            }
            table.entry(0x0085).or_insert(0x15);
            table
        })
    }

    fn matches(&self, label: &str) -> bool {
        self.name.eq_ignore_ascii_case(label) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(label))
    }
}

static CODE_PAGES: [CodePage; 7] = [
    CodePage::new(
        "IBM037",
        &[
            "cp037", "ibm-037", "ibm-37", "cpibm37", "037", "csIBM037", "ebcdic-cp-us", "ebcdic-cp-ca",
            "ebcdic-cp-wt", "ebcdic-cp-nl", "cs-ebcdic-cp-us", "cs-ebcdic-cp-ca", "cs-ebcdic-cp-wt",
            "cs-ebcdic-cp-nl",
        ],
        &ebcdic::IBM037,
    ),
    CodePage::new("IBM273", &["cp273", "ibm-273", "273"], &ebcdic::IBM273),
    CodePage::new(
        "IBM285",
        &["cp285", "ibm-285", "cpibm285", "285", "csIBM285", "ebcdic-gb", "ebcdic-cp-gb"],
        &ebcdic::IBM285,
    ),
    CodePage::new(
        "IBM297",
        &["cp297", "ibm-297", "cpibm297", "297", "csIBM297", "ebcdic-cp-fr"],
        &ebcdic::IBM297,
    ),
    CodePage::new(
        "IBM500",
        &["cp500", "ibm-500", "500", "csIBM500", "ebcdic-cp-ch", "ebcdic-cp-bh"],
        &ebcdic::IBM500,
    ),
    CodePage::new("IBM1047", &["cp1047", "ibm-1047", "1047"], &ebcdic::IBM1047),
    CodePage::new(
        "IBM01146",
        &["ibm1146", "ibm-1146", "cp1146", "cp01146", "1146", "ebcdic-gb-285+euro"],
        &ebcdic::IBM1146,
    ),
];

const LATIN1_ALIASES: &[&str] = &[
    "iso-8859-1", "iso8859-1", "iso8859_1", "iso_8859-1", "iso_8859_1", "iso_8859-1:1987", "8859_1",
    "iso-ir-100", "latin1", "l1", "ibm819", "ibm-819", "cp819", "819", "csisolatin1",
];

const ASCII_ALIASES: &[&str] = &[
    "us-ascii", "ascii", "ascii7", "us", "iso646-us", "iso-ir-6", "ansi_x3.4-1968", "ansi_x3.4-1986",
    "iso_646.irv:1991", "iso_646.irv:1983", "ibm367", "cp367", "csascii", "646", "default",
];

const UTF16_ALIASES: &[&str] = &["utf-16", "utf16", "unicode"];
const UTF16BE_ALIASES: &[&str] = &["utf-16be", "utf_16be", "x-utf-16be", "iso-10646-ucs-2", "unicodebigunmarked"];
const UTF16LE_ALIASES: &[&str] = &["utf-16le", "utf_16le", "x-utf-16le", "unicodelittleunmarked"];

fn is_one_of(label: &str, aliases: &[&str]) -> bool {
    aliases.iter().any(|a| a.eq_ignore_ascii_case(label))
}

// ════════════════════════════════════════════════════════════════
//  Charset
// ════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
enum Kind {
    Latin1,
    Ascii,
    Ebcdic(&'static CodePage),
    Utf16 { big_endian: bool, bom: bool },
    Whatwg(&'static Encoding),
}

/// A resolved character encoding. Cheap to copy.
#[derive(Clone, Copy)]
pub struct Charset {
    kind: Kind,
}

impl Charset {
    /// Resolve a charset by name or alias.
    pub fn for_name(name: &str) -> Result<Self, TransformError> {
        let label = name.trim();
        let kind = if is_one_of(label, LATIN1_ALIASES) {
            Kind::Latin1
        } else if is_one_of(label, ASCII_ALIASES) {
            Kind::Ascii
        } else if is_one_of(label, UTF16_ALIASES) {
            Kind::Utf16 { big_endian: true, bom: true }
        } else if is_one_of(label, UTF16BE_ALIASES) {
            Kind::Utf16 { big_endian: true, bom: false }
        } else if is_one_of(label, UTF16LE_ALIASES) {
            Kind::Utf16 { big_endian: false, bom: false }
        } else if let Some(page) = CODE_PAGES.iter().find(|p| p.matches(label)) {
            Kind::Ebcdic(page)
        } else {
            match Encoding::for_label_no_replacement(label.as_bytes()) {
                Some(enc) if enc == encoding_rs::UTF_16BE => Kind::Utf16 { big_endian: true, bom: false },
                Some(enc) if enc == encoding_rs::UTF_16LE => Kind::Utf16 { big_endian: false, bom: false },
                Some(enc) => Kind::Whatwg(enc),
                None => {
                    return Err(TransformError::unsupported_encoding(format!(
                        "unsupported charset '{name}'"
                    )));
                }
            }
        };
        Ok(Self { kind })
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self.kind {
            Kind::Latin1 => "ISO-8859-1",
            Kind::Ascii => "US-ASCII",
            Kind::Ebcdic(page) => page.name,
            Kind::Utf16 { bom: true, .. } => "UTF-16",
            Kind::Utf16 { big_endian: true, .. } => "UTF-16BE",
            Kind::Utf16 { big_endian: false, .. } => "UTF-16LE",
            Kind::Whatwg(enc) => enc.name(),
        }
    }

    /// Encode `text` under this charset.
    pub fn encode(&self, text: &str, action: UnmappableAction) -> Result<Vec<u8>, TransformError> {
        match self.kind {
            Kind::Latin1 => self.encode_single_byte(text, action, |c| u8::try_from(u32::from(c)).ok()),
            Kind::Ascii => self.encode_single_byte(text, action, |c| c.is_ascii().then_some(c as u8)),
            Kind::Ebcdic(page) => {
                let table = page.encode_table();
                self.encode_single_byte(text, action, |c| {
                    u16::try_from(u32::from(c)).ok().and_then(|cp| table.get(&cp).copied())
                })
            }
            Kind::Utf16 { big_endian, bom } => Ok(encode_utf16(text, big_endian, bom)),
            Kind::Whatwg(enc) => self.encode_whatwg(enc, text, action),
        }
    }

    /// Decode `bytes`, substituting U+FFFD for anything malformed.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self.kind {
            Kind::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Kind::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })
                .collect(),
            Kind::Ebcdic(page) => bytes
                .iter()
                .map(|&b| char::from_u32(u32::from(page.decode[usize::from(b)])).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
            Kind::Utf16 { big_endian, bom } => {
                let enc = if big_endian { encoding_rs::UTF_16BE } else { encoding_rs::UTF_16LE };
                if bom {
                    enc.decode(bytes).0.into_owned()
                } else {
                    enc.decode_without_bom_handling(bytes).0.into_owned()
                }
            }
            Kind::Whatwg(enc) => enc.decode_without_bom_handling(bytes).0.into_owned(),
        }
    }

    fn encode_single_byte(
        &self,
        text: &str,
        action: UnmappableAction,
        lookup: impl Fn(char) -> Option<u8>,
    ) -> Result<Vec<u8>, TransformError> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            match lookup(c) {
                Some(b) => out.push(b),
                None => out.push(self.substitute(c, action)?),
            }
        }
        Ok(out)
    }

    fn encode_whatwg(
        &self,
        enc: &'static Encoding,
        text: &str,
        action: UnmappableAction,
    ) -> Result<Vec<u8>, TransformError> {
        let mut encoder = enc.new_encoder();
        let mut out = Vec::with_capacity(
            encoder
                .max_buffer_length_from_utf8_without_replacement(text.len())
                .unwrap_or(text.len()),
        );
        let mut remaining = text;
        loop {
            let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(remaining, &mut out, true);
            remaining = &remaining[read..];
            match result {
                EncoderResult::InputEmpty => return Ok(out),
                EncoderResult::OutputFull => out.reserve(remaining.len().max(8) * 4),
                EncoderResult::Unmappable(c) => {
                    let b = self.substitute(c, action)?;
                    out.push(b);
                }
            }
        }
    }

    fn substitute(&self, c: char, action: UnmappableAction) -> Result<u8, TransformError> {
        match action {
            UnmappableAction::Replace => Ok(SUBSTITUTE_BYTE),
            UnmappableAction::Fail => Err(TransformError::encoding(format!(
                "character U+{:04X} cannot be encoded in {}",
                u32::from(c),
                self.name()
            ))),
        }
    }
}

fn encode_utf16(text: &str, big_endian: bool, bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2 + 2);
    let mut push = |unit: u16| {
        let bytes = if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() };
        out.extend_from_slice(&bytes);
    };
    if bom && !text.is_empty() {
        push(0xFEFF);
    }
    text.encode_utf16().for_each(&mut push);
    out
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Charset {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Charset {}

#[cfg(test)]
mod tests {
    use super::*;
    use byteconv_api::error::ErrorKind;

    fn encode(name: &str, text: &str) -> Vec<u8> {
        Charset::for_name(name).unwrap().encode(text, UnmappableAction::Replace).unwrap()
    }

    #[test]
    fn test_aliases_resolve() {
        for alias in ["IBM285", "ibm285", "cp285", "ibm-285", "285", "ebcdic-gb", "csIBM285"] {
            assert_eq!(Charset::for_name(alias).unwrap().name(), "IBM285", "{alias}");
        }
        assert_eq!(Charset::for_name("latin1").unwrap().name(), "ISO-8859-1");
        assert_eq!(Charset::for_name("ISO-8859-1").unwrap().name(), "ISO-8859-1");
        assert_eq!(Charset::for_name("ascii").unwrap().name(), "US-ASCII");
        assert_eq!(Charset::for_name("utf8").unwrap().name(), "UTF-8");
        assert_eq!(Charset::for_name("windows-1252").unwrap().name(), "windows-1252");
        assert_eq!(Charset::for_name("IBM1146").unwrap().name(), "IBM01146");
    }

    #[test]
    fn test_unknown_charset() {
        let err = Charset::for_name("NOPE-42").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
        assert!(err.message().contains("NOPE-42"));
        assert!(Charset::for_name("replacement").is_err());
    }

    #[test]
    fn test_ebcdic_bytes() {
        assert_eq!(encode("IBM285", "hi"), vec![0x88, 0x89]);
        assert_eq!(
            encode("IBM285", "£5 €x é"),
            vec![0x5B, 0xF5, 0x40, 0x3F, 0xA7, 0x40, 0x51]
        );
        assert_eq!(encode("IBM1146", "€"), vec![0x9F]);
        assert_eq!(
            encode("IBM037", "id-42 Ünïcode"),
            vec![0x89, 0x84, 0x60, 0xF4, 0xF2, 0x40, 0xFC, 0x95, 0x57, 0x83, 0x96, 0x84, 0x85]
        );
    }

    #[test]
    fn test_ebcdic_newlines() {
        assert_eq!(encode("IBM285", "\n"), vec![0x15]);
        assert_eq!(encode("IBM285", "\u{85}"), vec![0x15]);
        assert_eq!(encode("IBM1047", "\n\u{85}"), vec![0x15, 0x25]);
    }

    #[test]
    fn test_supplementary_char_is_one_substitute() {
        assert_eq!(encode("IBM285", "A😀"), vec![0xC1, 0x3F]);
        assert_eq!(encode("ISO-8859-1", "A😀"), vec![0x41, 0x3F]);
    }

    #[test]
    fn test_fail_on_unmappable() {
        let cs = Charset::for_name("IBM285").unwrap();
        let err = cs.encode("€", UnmappableAction::Fail).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert!(err.message().contains("U+20AC"));
        assert!(err.message().contains("IBM285"));

        let sjis = Charset::for_name("Shift_JIS").unwrap();
        assert_eq!(sjis.encode("aé", UnmappableAction::Replace).unwrap(), b"a?".to_vec());
        assert!(sjis.encode("aé", UnmappableAction::Fail).is_err());
    }

    #[test]
    fn test_utf16_bom() {
        assert_eq!(encode("UTF-16", "hi"), vec![0xFE, 0xFF, 0x00, 0x68, 0x00, 0x69]);
        assert_eq!(encode("UTF-16LE", "hi"), vec![0x68, 0x00, 0x69, 0x00]);
        assert!(encode("UTF-16", "").is_empty());
    }

    #[test]
    fn test_decode_round_trips_mappable_text() {
        let cs = Charset::for_name("IBM285").unwrap();
        let text = "This is a binary string";
        assert_eq!(cs.decode(&cs.encode(text, UnmappableAction::Fail).unwrap()), text);
        let utf16 = Charset::for_name("UTF-16").unwrap();
        assert_eq!(utf16.decode(&encode("UTF-16", "£x")), "£x");
    }

    #[test]
    fn test_unmappable_action_parse() {
        assert_eq!("replace".parse::<UnmappableAction>().unwrap(), UnmappableAction::Replace);
        assert_eq!(" FAIL ".parse::<UnmappableAction>().unwrap(), UnmappableAction::Fail);
        assert_eq!(
            "skip".parse::<UnmappableAction>().unwrap_err().kind(),
            ErrorKind::Config
        );
    }
}
