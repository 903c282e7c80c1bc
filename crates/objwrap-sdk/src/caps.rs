//! Caps - structured format descriptions
//!
//! A `Caps` is an ordered list of `Structure`s; each structure is a media
//! type name plus ordered `(field, NativeValue)` pairs. Caps have a textual
//! form:
//!
//! ```text
//! video/x-raw, format=(string)I420, width=(int)320, framerate=(fraction)30/1; audio/x-raw
//! ```
//!
//! Field values may carry an explicit `(type)` annotation; without one the
//! type is inferred (integer, float, boolean, `n/d` fraction, quoted or bare
//! string). `ANY` and `EMPTY` denote the two special caps. Value lists
//! (`{ a, b }`) and ranges (`[ a, b ]`) are not accepted.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use logos::Logos;

use crate::value::{NativeValue, ValueType};

// ============================================================================
// Structure
// ============================================================================

/// Named, ordered set of typed fields
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    name: String,
    fields: Vec<(String, NativeValue)>,
}

impl Structure {
    /// Empty structure with the given media type name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style `set`
    pub fn with_field(mut self, name: &str, value: impl Into<NativeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing an existing one of the same name in place
    pub fn set(&mut self, name: &str, value: impl Into<NativeValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Media type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field
    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the structure has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in &self.fields {
            write!(f, ", {}=", key)?;
            write_field_value(f, value)?;
        }
        Ok(())
    }
}

fn write_field_value(f: &mut fmt::Formatter<'_>, value: &NativeValue) -> fmt::Result {
    let ty = value.value_type();
    match ty {
        ValueType::Boolean => write!(f, "(boolean){}", value.as_bool().unwrap_or(false)),
        ValueType::Int => write!(f, "(int){}", value.as_int().unwrap_or(0)),
        ValueType::UInt => write!(f, "(uint){}", value.as_uint().unwrap_or(0)),
        ValueType::Int64 => write!(f, "(int64){}", value.as_int64().unwrap_or(0)),
        ValueType::UInt64 => write!(f, "(uint64){}", value.as_uint64().unwrap_or(0)),
        ValueType::Float => write!(f, "(float){}", value.as_float().unwrap_or(0.0)),
        ValueType::Double => write!(f, "(double){}", value.as_double().unwrap_or(0.0)),
        ValueType::Fraction => {
            let (n, d) = value.as_fraction().unwrap_or((0, 1));
            write!(f, "(fraction){}/{}", n, d)
        }
        ValueType::String => match value.as_str() {
            Some(s) if is_bare_safe(s) => write!(f, "(string){}", s),
            Some(s) => write!(f, "(string)\"{}\"", escape(s)),
            None => write!(f, "(string)NULL"),
        },
        other => write!(f, "({})NULL", other),
    }
}

fn is_bare_safe(s: &str) -> bool {
    !s.is_empty()
        && s != "NULL"
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '+'))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// Caps
// ============================================================================

/// Format description: `ANY`, `EMPTY`, or a list of structures
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Caps {
    structures: Vec<Structure>,
    any: bool,
}

impl Caps {
    /// Empty caps (matches nothing)
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Caps that match any format
    pub fn any() -> Self {
        Self {
            structures: Vec::new(),
            any: true,
        }
    }

    /// Caps with a single structure
    pub fn from_structure(structure: Structure) -> Self {
        Self {
            structures: vec![structure],
            any: false,
        }
    }

    /// Parse the textual form; `None` if the string is malformed
    pub fn from_string(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Append a structure
    pub fn push(&mut self, structure: Structure) {
        self.any = false;
        self.structures.push(structure);
    }

    /// Whether these are the `ANY` caps
    pub fn is_any(&self) -> bool {
        self.any
    }

    /// Whether these caps hold no structure and are not `ANY`
    pub fn is_empty(&self) -> bool {
        !self.any && self.structures.is_empty()
    }

    /// Structure at `index`
    pub fn structure(&self, index: usize) -> Option<&Structure> {
        self.structures.get(index)
    }

    /// All structures
    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any {
            return f.write_str("ANY");
        }
        if self.structures.is_empty() {
            return f.write_str("EMPTY");
        }
        for (i, structure) in self.structures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", structure)?;
        }
        Ok(())
    }
}

/// Error produced when caps text cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid caps at byte {position}: {message}")]
pub struct ParseCapsError {
    /// Byte offset of the failure
    pub position: usize,
    /// What went wrong
    pub message: String,
}

impl FromStr for Caps {
    type Err = ParseCapsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ANY" => return Ok(Caps::any()),
            "EMPTY" | "NONE" | "" => return Ok(Caps::new_empty()),
            _ => {}
        }
        CapsParser::new(s)?.parse()
    }
}

// ============================================================================
// Lexer
// ============================================================================

/// Tokens of the caps text form
#[derive(Logos, Debug, Clone, PartialEq)]
enum CapsToken<'s> {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("=")]
    Equals,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // Opening of a value list or range
    #[token("{")]
    #[token("[")]
    #[token("<")]
    ListOpen,

    #[regex(r#""([^"\\]|\\.)*""#, unquote)]
    Quoted(String),

    // Media type names, field names, type annotations and bare values
    #[regex(r"[A-Za-z0-9_+./:\-]+", |lex| lex.slice())]
    Word(&'s str),
}

fn unquote<'s>(lex: &mut logos::Lexer<'s, CapsToken<'s>>) -> String {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

fn tokenize(src: &str) -> Result<Vec<(CapsToken<'_>, Range<usize>)>, ParseCapsError> {
    CapsToken::lexer(src)
        .spanned()
        .map(|(token, span)| match token {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(ParseCapsError {
                position: span.start,
                message: match src[span.start..].chars().next() {
                    Some('"') => "unterminated string".to_string(),
                    Some(c) => format!("unexpected character '{}'", c),
                    None => "unexpected end of input".to_string(),
                },
            }),
        })
        .collect()
}

// ============================================================================
// Parser
// ============================================================================

enum RawValue<'a> {
    Quoted(String),
    Bare(&'a str),
}

impl RawValue<'_> {
    fn text(&self) -> &str {
        match self {
            RawValue::Quoted(s) => s,
            RawValue::Bare(s) => s,
        }
    }
}

struct CapsParser<'a> {
    tokens: Vec<(CapsToken<'a>, Range<usize>)>,
    pos: usize,
    end: usize,
}

impl<'a> CapsParser<'a> {
    fn new(src: &'a str) -> Result<Self, ParseCapsError> {
        Ok(Self {
            tokens: tokenize(src)?,
            pos: 0,
            end: src.len(),
        })
    }

    fn parse(mut self) -> Result<Caps, ParseCapsError> {
        let mut caps = Caps::new_empty();
        loop {
            caps.push(self.structure()?);
            match self.current() {
                None => break,
                Some(CapsToken::Semicolon) => {
                    self.advance();
                    if self.at_end() {
                        break;
                    }
                }
                Some(_) => return Err(self.error("expected ';' or end of input")),
            }
        }
        Ok(caps)
    }

    fn structure(&mut self) -> Result<Structure, ParseCapsError> {
        let name = self.ident()?;
        let mut structure = Structure::new(name);
        while self.eat(&CapsToken::Comma) {
            if self.at_end() {
                break;
            }
            let field = self.ident()?;
            if !self.eat(&CapsToken::Equals) {
                return Err(self.error("expected '='"));
            }
            let value = self.value()?;
            structure.set(field, value);
        }
        Ok(structure)
    }

    fn value(&mut self) -> Result<NativeValue, ParseCapsError> {
        if self.eat(&CapsToken::LParen) {
            let ty = self.ident()?;
            if !self.eat(&CapsToken::RParen) {
                return Err(self.error("expected ')' after type"));
            }
            let start = self.current_start();
            let raw = self.raw_value()?;
            typed_value(ty, &raw).ok_or_else(|| ParseCapsError {
                position: start,
                message: format!("cannot read '{}' as {}", raw.text(), ty),
            })
        } else {
            let raw = self.raw_value()?;
            Ok(infer_value(&raw))
        }
    }

    fn raw_value(&mut self) -> Result<RawValue<'a>, ParseCapsError> {
        let raw = match self.current() {
            Some(CapsToken::Quoted(s)) => RawValue::Quoted(s.clone()),
            Some(CapsToken::Word(word)) => RawValue::Bare(*word),
            Some(CapsToken::ListOpen) => {
                return Err(self.error("value lists and ranges are not supported"))
            }
            _ => return Err(self.error("expected a value")),
        };
        self.advance();
        Ok(raw)
    }

    fn ident(&mut self) -> Result<&'a str, ParseCapsError> {
        match self.current() {
            Some(CapsToken::Word(word)) if word.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                let word = *word;
                self.advance();
                Ok(word)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn current(&self) -> Option<&CapsToken<'a>> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn current_start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, span)| span.start)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: &CapsToken<'_>) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn error(&self, message: &str) -> ParseCapsError {
        ParseCapsError {
            position: self.current_start(),
            message: message.to_string(),
        }
    }
}

fn typed_value(ty: &str, raw: &RawValue<'_>) -> Option<NativeValue> {
    let text = raw.text();
    let value = match ty {
        "int" | "i" | "gint" => NativeValue::from(text.parse::<i32>().ok()?),
        "uint" | "u" | "guint" => NativeValue::from(text.parse::<u32>().ok()?),
        "int64" | "gint64" => NativeValue::from(text.parse::<i64>().ok()?),
        "uint64" | "guint64" => NativeValue::from(text.parse::<u64>().ok()?),
        "boolean" | "bool" | "b" => NativeValue::from(parse_bool(text)?),
        "double" | "d" | "gdouble" => NativeValue::from(text.parse::<f64>().ok()?),
        "float" | "f" | "gfloat" => NativeValue::from(text.parse::<f32>().ok()?),
        "string" | "str" | "s" | "gchararray" => match raw {
            RawValue::Bare("NULL") => NativeValue::new(ValueType::String),
            _ => NativeValue::from(text),
        },
        "fraction" => fraction_value(text)?,
        _ => return None,
    };
    Some(value)
}

fn infer_value(raw: &RawValue<'_>) -> NativeValue {
    let text = match raw {
        RawValue::Quoted(s) => return NativeValue::from(s.as_str()),
        RawValue::Bare(s) => *s,
    };
    if let Some(b) = parse_bool(text) {
        return NativeValue::from(b);
    }
    if looks_numeric(text) {
        if let Ok(i) = text.parse::<i32>() {
            return NativeValue::from(i);
        }
        if let Ok(i) = text.parse::<i64>() {
            return NativeValue::from(i);
        }
        if let Ok(x) = text.parse::<f64>() {
            return NativeValue::from(x);
        }
        if let Some(fraction) = fraction_value(text) {
            return fraction;
        }
    }
    NativeValue::from(text)
}

fn looks_numeric(s: &str) -> bool {
    matches!(s.chars().next(), Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "TRUE" | "yes" | "YES" => Some(true),
        "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn fraction_value(s: &str) -> Option<NativeValue> {
    let (num, den) = s.split_once('/')?;
    let num = num.trim().parse::<i32>().ok()?;
    let den = den.trim().parse::<i32>().ok()?;
    let mut value = NativeValue::new(ValueType::Fraction);
    value.set_fraction(num, den).ok()?;
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_fields() {
        let caps = Caps::from_string(
            "video/x-raw, format=(string)I420, width=(int)320, height=(int)240, framerate=(fraction)30/1",
        )
        .unwrap();
        let s = caps.structure(0).unwrap();
        assert_eq!(s.name(), "video/x-raw");
        assert_eq!(s.get("format").unwrap().as_str(), Some("I420"));
        assert_eq!(s.get("width").unwrap().as_int(), Some(320));
        assert_eq!(s.get("framerate").unwrap().as_fraction(), Some((30, 1)));
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_parse_inferred_fields() {
        let caps = Caps::from_string(
            r#"audio/x-raw, rate=44100, channels=2, gain=0.5, interleaved=true, layout="non interleaved", big=5000000000"#,
        )
        .unwrap();
        let s = caps.structure(0).unwrap();
        assert_eq!(s.get("rate").unwrap().as_int(), Some(44100));
        assert_eq!(s.get("gain").unwrap().as_double(), Some(0.5));
        assert_eq!(s.get("interleaved").unwrap().as_bool(), Some(true));
        assert_eq!(s.get("layout").unwrap().as_str(), Some("non interleaved"));
        assert_eq!(s.get("big").unwrap().as_int64(), Some(5_000_000_000));
    }

    #[test]
    fn test_parse_multiple_structures() {
        let caps = Caps::from_string("video/x-raw; audio/x-raw, rate=(int)8000;").unwrap();
        assert_eq!(caps.structures().len(), 2);
        assert_eq!(caps.structure(1).unwrap().name(), "audio/x-raw");
    }

    #[test]
    fn test_parse_special_caps() {
        assert!(Caps::from_string("ANY").unwrap().is_any());
        assert!(Caps::from_string("EMPTY").unwrap().is_empty());
        assert!(Caps::from_string("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Caps::from_string("video/x-raw, width").is_none());
        assert!(Caps::from_string("video/x-raw, width=(int)abc").is_none());
        assert!(Caps::from_string("video/x-raw, width=[1, 10]").is_none());
        assert!(Caps::from_string("video/x-raw, name=\"open").is_none());
        assert!(Caps::from_string("123/abc").is_none());
        assert!(Caps::from_string("video/x-raw, width=(widget)3").is_none());
    }

    #[test]
    fn test_parse_error_position() {
        let err = "video/x-raw width=1".parse::<Caps>().unwrap_err();
        assert_eq!(err.position, 12);
    }

    #[test]
    fn test_lexer_splits_fields() {
        let tokens: Vec<CapsToken<'_>> = CapsToken::lexer(r#"video/x-raw, w=(int)-1, t="a \"b\"";"#)
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(
            tokens,
            vec![
                CapsToken::Word("video/x-raw"),
                CapsToken::Comma,
                CapsToken::Word("w"),
                CapsToken::Equals,
                CapsToken::LParen,
                CapsToken::Word("int"),
                CapsToken::RParen,
                CapsToken::Word("-1"),
                CapsToken::Comma,
                CapsToken::Word("t"),
                CapsToken::Equals,
                CapsToken::Quoted("a \"b\"".to_string()),
                CapsToken::Semicolon,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_position() {
        let err = "video/x-raw, name=\"open".parse::<Caps>().unwrap_err();
        assert_eq!(err.position, 18);
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn test_display_reparses() {
        let text = r#"video/x-raw, format=(string)I420, width=(int)320, title=(string)"a \"b\"", rate=(fraction)25/2"#;
        let caps = Caps::from_string(text).unwrap();
        let again = Caps::from_string(&caps.to_string()).unwrap();
        assert_eq!(caps, again);
    }

    #[test]
    fn test_structure_set_replaces_in_place() {
        let mut s = Structure::new("x/y").with_field("a", 1i32).with_field("b", 2i32);
        s.set("a", 3i32);
        let keys: Vec<&str> = s.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(s.get("a").unwrap().as_int(), Some(3));
    }
}
