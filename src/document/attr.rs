//! Typed attribute accessors.
//!
//! `opt_*` return `Ok(None)` when the attribute is absent, `req_*` turn
//! absence into [`CompileError::MissingAttribute`]. A present but malformed
//! value is an error in both flavours.

use crate::document::tree::Element;
use crate::error::{CompileError, CompileResult};
use regex::Regex;
use std::num::IntErrorKind;
use std::sync::OnceLock;

const INTEGER_RE: &str = r"^(?:0[xX][0-9A-Fa-f]+|[0-9]+)$";
const HEX_TOKEN_RE: &str = r"^(?:0[xX])?[0-9A-Fa-f]{2}$";

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(INTEGER_RE).expect("static integer pattern"))
}

fn hex_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HEX_TOKEN_RE).expect("static hex token pattern"))
}

/// Why an integer literal was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralError {
    Malformed,
    OutOfRange,
}

/// Parse a decimal or `0x` hexadecimal literal and check it against `max`.
pub fn parse_integer(literal: &str, max: u64) -> Result<u64, LiteralError> {
    let literal = literal.trim();
    if !integer_re().is_match(literal) {
        return Err(LiteralError::Malformed);
    }
    let parsed = match literal.get(..2) {
        Some("0x") | Some("0X") => u64::from_str_radix(&literal[2..], 16),
        _ => literal.parse::<u64>(),
    };
    let value = parsed.map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow => LiteralError::OutOfRange,
        _ => LiteralError::Malformed,
    })?;
    if value > max {
        return Err(LiteralError::OutOfRange);
    }
    Ok(value)
}

/// Decode a delimited run of two-digit hex tokens. Empty input is an empty
/// payload.
pub fn parse_hex_payload(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    for token in text.split([' ', ',', '.', '-', '\t', '\n', '\r']) {
        if token.is_empty() {
            continue;
        }
        if !hex_token_re().is_match(token) {
            return None;
        }
        let digits = &token[token.len() - 2..];
        out.push(u8::from_str_radix(digits, 16).ok()?);
    }
    Some(out)
}

impl Element {
    fn missing(&self, key: &str) -> CompileError {
        CompileError::MissingAttribute {
            element: self.name.clone(),
            attribute: key.to_string(),
            line: self.line,
        }
    }

    fn invalid(&self, key: &str, value: &str) -> CompileError {
        CompileError::InvalidValue {
            element: self.name.clone(),
            attribute: key.to_string(),
            value: value.to_string(),
            line: self.line,
        }
    }

    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.attr(key)
    }

    pub fn req_str(&self, key: &str) -> CompileResult<&str> {
        self.attr(key).ok_or_else(|| self.missing(key))
    }

    fn opt_integer(&self, key: &str, max: u64) -> CompileResult<Option<u64>> {
        let Some(raw) = self.attr(key) else {
            return Ok(None);
        };
        match parse_integer(raw, max) {
            Ok(value) => Ok(Some(value)),
            Err(LiteralError::Malformed) => Err(CompileError::InvalidLiteral {
                element: self.name.clone(),
                attribute: key.to_string(),
                value: raw.to_string(),
                line: self.line,
            }),
            Err(LiteralError::OutOfRange) => Err(CompileError::OutOfRange {
                element: self.name.clone(),
                attribute: key.to_string(),
                value: raw.to_string(),
                max,
                line: self.line,
            }),
        }
    }

    pub fn opt_u8(&self, key: &str) -> CompileResult<Option<u8>> {
        Ok(self.opt_integer(key, u8::MAX as u64)?.map(|v| v as u8))
    }

    pub fn req_u8(&self, key: &str) -> CompileResult<u8> {
        self.opt_u8(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_u16(&self, key: &str) -> CompileResult<Option<u16>> {
        Ok(self.opt_integer(key, u16::MAX as u64)?.map(|v| v as u16))
    }

    pub fn req_u16(&self, key: &str) -> CompileResult<u16> {
        self.opt_u16(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_bool(&self, key: &str) -> CompileResult<Option<bool>> {
        match self.attr(key) {
            None => Ok(None),
            Some("true") | Some("1") => Ok(Some(true)),
            Some("false") | Some("0") => Ok(Some(false)),
            Some(other) => Err(self.invalid(key, other)),
        }
    }

    /// Look the attribute up in a keyword table.
    pub fn opt_keyword<T: Copy>(&self, key: &str, table: &[(&str, T)]) -> CompileResult<Option<T>> {
        let Some(raw) = self.attr(key) else {
            return Ok(None);
        };
        table
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, value)| Some(*value))
            .ok_or_else(|| self.invalid(key, raw))
    }

    pub fn req_keyword<T: Copy>(&self, key: &str, table: &[(&str, T)]) -> CompileResult<T> {
        self.opt_keyword(key, table)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_hex(&self, key: &str) -> CompileResult<Option<Vec<u8>>> {
        let Some(raw) = self.attr(key) else {
            return Ok(None);
        };
        parse_hex_payload(raw)
            .map(Some)
            .ok_or_else(|| self.invalid(key, raw))
    }

    pub fn req_hex(&self, key: &str) -> CompileResult<Vec<u8>> {
        self.opt_hex(key)?.ok_or_else(|| self.missing(key))
    }
}

/// Reverse keyword lookup, used by the printer.
pub fn keyword_name<T: PartialEq>(table: &[(&'static str, T)], value: &T) -> &'static str {
    table
        .iter()
        .find(|(_, v)| v == value)
        .map(|(name, _)| *name)
        .unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(attrs: &[(&str, &str)]) -> Element {
        let mut el = Element::new("Test", 7);
        for (k, v) in attrs {
            el.attributes.push((k.to_string(), v.to_string()));
        }
        el
    }

    #[test]
    fn integer_literals() {
        assert_eq!(parse_integer("0xFF", 255), Ok(255));
        assert_eq!(parse_integer("0X0000ff", 255), Ok(255));
        assert_eq!(parse_integer("42", 255), Ok(42));
        assert_eq!(parse_integer("256", 255), Err(LiteralError::OutOfRange));
        assert_eq!(parse_integer("12G", 255), Err(LiteralError::Malformed));
        assert_eq!(parse_integer("0x", 255), Err(LiteralError::Malformed));
        assert_eq!(parse_integer("-1", 255), Err(LiteralError::Malformed));
        assert_eq!(
            parse_integer("99999999999999999999999", u64::MAX),
            Err(LiteralError::OutOfRange)
        );
    }

    #[test]
    fn typed_accessors_distinguish_failures() {
        let el = element(&[("A", "0xFF"), ("B", "256"), ("C", "12G")]);
        assert_eq!(el.req_u8("A").unwrap(), 255);
        assert!(matches!(el.req_u8("B"), Err(CompileError::OutOfRange { max: 255, .. })));
        assert_eq!(el.req_u16("B").unwrap(), 256);
        assert!(matches!(el.opt_u8("C"), Err(CompileError::InvalidLiteral { line: 7, .. })));
        assert_eq!(el.opt_u16("D").unwrap(), None);
        assert!(matches!(el.req_u16("D"), Err(CompileError::MissingAttribute { .. })));
    }

    #[test]
    fn booleans_and_keywords() {
        const TABLE: &[(&str, u8)] = &[("Slow", 0), ("Fast", 1)];
        let el = element(&[("On", "true"), ("Off", "0"), ("Bad", "yes"), ("Speed", "Fast")]);
        assert_eq!(el.opt_bool("On").unwrap(), Some(true));
        assert_eq!(el.opt_bool("Off").unwrap(), Some(false));
        assert!(el.opt_bool("Bad").is_err());
        assert_eq!(el.req_keyword("Speed", TABLE).unwrap(), 1);
        assert!(matches!(
            el.req_keyword("On", TABLE),
            Err(CompileError::InvalidValue { .. })
        ));
        assert_eq!(keyword_name(TABLE, &0), "Slow");
    }

    #[test]
    fn hex_payloads() {
        assert_eq!(parse_hex_payload(""), Some(vec![]));
        assert_eq!(parse_hex_payload("01 02,03.04-ff"), Some(vec![1, 2, 3, 4, 0xff]));
        assert_eq!(parse_hex_payload("0x0A, 0x0b"), Some(vec![0x0a, 0x0b]));
        assert_eq!(parse_hex_payload("01 2"), None);
        assert_eq!(parse_hex_payload("01 zz"), None);
        assert_eq!(parse_hex_payload("0102"), None);

        let el = element(&[("PayloadHex", "")]);
        assert_eq!(el.req_hex("PayloadHex").unwrap(), Vec::<u8>::new());
    }
}
