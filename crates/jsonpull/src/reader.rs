//! The pull-style reader: scanner, protocol operations, and the passthrough
//! router.
//!
//! The scanner is one set of routines driven in two modes. Structured
//! decoding discards the bytes it moves past; passthrough streaming routes
//! the very same bytes into a caller-supplied [`Sink`]. Every helper
//! therefore threads a sink, with [`Blackhole`] standing in when output is
//! unwanted — there is no second copy of the state machine.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::byte_set::ByteSet;
use crate::error::{ReadError, Result};
use crate::numbers::parse_long_exact;
use crate::options::{ReaderOptions, SelectOptions};
use crate::scope::{Scope, ScopeStack};
use crate::sink::{Blackhole, Sink, ValueSink};
use crate::source::ByteSource;
use crate::strings;
use crate::value_source::{StreamState, ValueSource, ValueStream};

pub(crate) const SINGLE_QUOTE_OR_SLASH: ByteSet = ByteSet::of(b"'\\");
pub(crate) const DOUBLE_QUOTE_OR_SLASH: ByteSet = ByteSet::of(b"\"\\");
const UNQUOTED_STRING_TERMINALS: ByteSet = ByteSet::of(b"{}[]:, \n\t\r\x0c/\\;#=");
const LINEFEED_OR_CARRIAGE_RETURN: ByteSet = ByteSet::of(b"\n\r");
const CLOSING_BLOCK_COMMENT: &[u8] = b"*/";

/// Largest magnitude that can still take one more digit while accumulating
/// negatively into an i64.
const MIN_INCOMPLETE_INTEGER: i64 = i64::MIN / 10;

/// The kind of the next token, as reported by [`JsonReader::peek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Name,
    String,
    Number,
    Boolean,
    Null,
    EndDocument,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Token::BeginArray => "BEGIN_ARRAY",
            Token::EndArray => "END_ARRAY",
            Token::BeginObject => "BEGIN_OBJECT",
            Token::EndObject => "END_OBJECT",
            Token::Name => "NAME",
            Token::String => "STRING",
            Token::Number => "NUMBER",
            Token::Boolean => "BOOLEAN",
            Token::Null => "NULL",
            Token::EndDocument => "END_DOCUMENT",
        })
    }
}

/// Classification returned by [`JsonReader::peek_dry_run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunHint {
    Other,
    Null,
    String,
}

/// The single cached look-ahead classification.
///
/// Monotone: once set it is only cleared by a consuming operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Peeked {
    None,
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    True,
    False,
    Null,
    SingleQuoted,
    DoubleQuoted,
    Unquoted,
    /// The string value is already materialized in `peeked_string`.
    Buffered,
    SingleQuotedName,
    DoubleQuotedName,
    UnquotedName,
    /// The name is already materialized in `peeked_string`.
    BufferedName,
    /// The integer value is already decoded into `peeked_long`.
    Long,
    /// `peeked_number_length` bytes of number literal are buffered.
    Number,
    Eof,
}

impl Peeked {
    fn is_name(self) -> bool {
        matches!(
            self,
            Peeked::SingleQuotedName
                | Peeked::DoubleQuotedName
                | Peeked::UnquotedName
                | Peeked::BufferedName
        )
    }

    fn is_string_value(self) -> bool {
        matches!(
            self,
            Peeked::SingleQuoted | Peeked::DoubleQuoted | Peeked::Unquoted | Peeked::Buffered
        )
    }

    fn token(self) -> Option<Token> {
        Some(match self {
            Peeked::None => return None,
            Peeked::BeginObject => Token::BeginObject,
            Peeked::EndObject => Token::EndObject,
            Peeked::BeginArray => Token::BeginArray,
            Peeked::EndArray => Token::EndArray,
            Peeked::True | Peeked::False => Token::Boolean,
            Peeked::Null => Token::Null,
            Peeked::SingleQuoted | Peeked::DoubleQuoted | Peeked::Unquoted | Peeked::Buffered => {
                Token::String
            }
            Peeked::SingleQuotedName
            | Peeked::DoubleQuotedName
            | Peeked::UnquotedName
            | Peeked::BufferedName => Token::Name,
            Peeked::Long | Peeked::Number => Token::Number,
            Peeked::Eof => Token::EndDocument,
        })
    }
}

/// Number recognition sub-machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberChar {
    None,
    Sign,
    Digit,
    Decimal,
    FractionDigit,
    ExpE,
    ExpSign,
    ExpDigit,
}

/// A pull-style streaming JSON reader over a [`ByteSource`].
///
/// See the crate docs for an overview of the two consumption modes.
#[derive(Debug)]
pub struct JsonReader {
    pub(crate) source: ByteSource,
    lenient: bool,
    fail_on_unknown: bool,
    pub(crate) stack: ScopeStack,
    pub(crate) peeked: Peeked,
    peeked_long: i64,
    peeked_number_length: usize,
    peeked_string: Option<String>,
    pub(crate) value_stream: Option<ValueStream>,
}

impl JsonReader {
    /// Creates a strict reader over `source`.
    pub fn new(source: ByteSource) -> Self {
        Self::with_options(source, ReaderOptions::default())
    }

    /// Creates a reader with explicit options.
    pub fn with_options(source: ByteSource, options: ReaderOptions) -> Self {
        Self {
            source,
            lenient: options.lenient,
            fail_on_unknown: options.fail_on_unknown,
            stack: ScopeStack::new(),
            peeked: Peeked::None,
            peeked_long: 0,
            peeked_number_length: 0,
            peeked_string: None,
            value_stream: None,
        }
    }

    /// Convenience constructor over in-memory data.
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self::new(ByteSource::of(data))
    }

    pub fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    pub fn set_fail_on_unknown(&mut self, fail_on_unknown: bool) {
        self.fail_on_unknown = fail_on_unknown;
    }

    pub fn fails_on_unknown(&self) -> bool {
        self.fail_on_unknown
    }

    /// A JSONPath to the reader's current position, e.g. `$.users[2].name`.
    pub fn path(&self) -> String {
        self.stack.render_path()
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Consumes the next token, which must be the start of an array.
    pub fn begin_array(&mut self) -> Result<()> {
        let p = self.peeked_or_peek()?;
        if p == Peeked::BeginArray {
            self.push_scope(Scope::EmptyArray)?;
            self.peeked = Peeked::None;
            Ok(())
        } else {
            Err(self.err_expected("BEGIN_ARRAY"))
        }
    }

    /// Consumes the next token, which must be the end of an array.
    pub fn end_array(&mut self) -> Result<()> {
        let p = self.peeked_or_peek()?;
        if p == Peeked::EndArray {
            self.stack.pop();
            self.stack.bump_index();
            self.peeked = Peeked::None;
            Ok(())
        } else {
            Err(self.err_expected("END_ARRAY"))
        }
    }

    /// Consumes the next token, which must be the start of an object.
    pub fn begin_object(&mut self) -> Result<()> {
        let p = self.peeked_or_peek()?;
        if p == Peeked::BeginObject {
            self.push_scope(Scope::EmptyObject)?;
            self.peeked = Peeked::None;
            Ok(())
        } else {
            Err(self.err_expected("BEGIN_OBJECT"))
        }
    }

    /// Consumes the next token, which must be the end of an object.
    pub fn end_object(&mut self) -> Result<()> {
        let p = self.peeked_or_peek()?;
        if p == Peeked::EndObject {
            self.stack.pop();
            self.stack.bump_index();
            self.peeked = Peeked::None;
            Ok(())
        } else {
            Err(self.err_expected("END_OBJECT"))
        }
    }

    /// Returns `true` until the enclosing array or object (or the document)
    /// is exhausted.
    pub fn has_next(&mut self) -> Result<bool> {
        let p = self.peeked_or_peek()?;
        Ok(!matches!(p, Peeked::EndObject | Peeked::EndArray | Peeked::Eof))
    }

    /// The kind of the next token, without consuming it.
    pub fn peek(&mut self) -> Result<Token> {
        let p = self.peeked_or_peek()?;
        match p.token() {
            Some(token) => Ok(token),
            None => Err(ReadError::Closed),
        }
    }

    fn peeked_or_peek(&mut self) -> Result<Peeked> {
        if self.peeked == Peeked::None {
            self.do_peek()
        } else {
            Ok(self.peeked)
        }
    }

    fn push_scope(&mut self, scope: Scope) -> Result<()> {
        if self.stack.push(scope) {
            Ok(())
        } else {
            Err(ReadError::NestingTooDeep { path: self.path() })
        }
    }

    // ------------------------------------------------------------------
    // Structural peek
    // ------------------------------------------------------------------

    fn do_peek(&mut self) -> Result<Peeked> {
        self.do_peek_sink(&mut Blackhole, false)
    }

    /// Classifies the next token, consuming everything up to (and for most
    /// tokens including) its first byte.
    ///
    /// Structural bytes always go to `sink`; whitespace and comments between
    /// them go to `sink` only when `write_intermediates` is set, and are
    /// discarded otherwise.
    fn do_peek_sink(&mut self, sink: &mut dyn Sink, write_intermediates: bool) -> Result<Peeked> {
        if self.stack.top() == Scope::StreamingValue {
            // The sub-stream owns the byte stream until its value completes;
            // finish it before looking at what follows.
            self.finish_value_stream()?;
        }
        let peek_stack = self.stack.top();
        match peek_stack {
            Scope::EmptyArray => self.stack.replace_top(Scope::NonemptyArray),
            Scope::NonemptyArray => {
                // An element separator must come before the next element.
                let c = self.require_token_byte(sink, write_intermediates)?;
                self.source.move_to(sink, 1)?;
                match c {
                    b']' => return Ok(self.set_peeked(Peeked::EndArray)),
                    b';' => self.check_lenient()?,
                    b',' => {}
                    _ => return Err(self.err_syntax("Unterminated array")),
                }
            }
            Scope::EmptyObject | Scope::NonemptyObject => {
                self.stack.replace_top(Scope::DanglingName);
                if peek_stack == Scope::NonemptyObject {
                    let c = self.require_token_byte(sink, write_intermediates)?;
                    self.source.move_to(sink, 1)?;
                    match c {
                        b'}' => return Ok(self.set_peeked(Peeked::EndObject)),
                        b';' => self.check_lenient()?,
                        b',' => {}
                        _ => return Err(self.err_syntax("Unterminated object")),
                    }
                }
                let c = self.require_token_byte(sink, write_intermediates)?;
                match c {
                    b'"' => {
                        self.source.move_to(sink, 1)?;
                        return Ok(self.set_peeked(Peeked::DoubleQuotedName));
                    }
                    b'\'' => {
                        self.source.move_to(sink, 1)?;
                        self.check_lenient()?;
                        return Ok(self.set_peeked(Peeked::SingleQuotedName));
                    }
                    b'}' => {
                        return if peek_stack != Scope::NonemptyObject {
                            self.source.move_to(sink, 1)?;
                            Ok(self.set_peeked(Peeked::EndObject))
                        } else {
                            Err(self.err_syntax("Expected name"))
                        };
                    }
                    _ => {
                        self.check_lenient()?;
                        return if self.is_literal(c)? {
                            Ok(self.set_peeked(Peeked::UnquotedName))
                        } else {
                            Err(self.err_syntax("Expected name"))
                        };
                    }
                }
            }
            Scope::DanglingName => {
                self.stack.replace_top(Scope::NonemptyObject);
                // A name/value separator before the value.
                let c = self.require_token_byte(sink, write_intermediates)?;
                self.consume_intermediate(sink, write_intermediates, 1)?;
                match c {
                    b':' => {}
                    b'=' => {
                        self.check_lenient()?;
                        if self.source.request(1)? && self.source.get_byte(0) == b'>' {
                            self.consume_intermediate(sink, write_intermediates, 1)?;
                        }
                    }
                    _ => return Err(self.err_syntax("Expected ':'")),
                }
            }
            Scope::EmptyDocument => self.stack.replace_top(Scope::NonemptyDocument),
            Scope::NonemptyDocument => {
                match self.token_byte(sink, write_intermediates)? {
                    None => return Ok(self.set_peeked(Peeked::Eof)),
                    Some(_) => self.check_lenient()?,
                }
            }
            Scope::Closed => return Err(ReadError::Closed),
            Scope::StreamingValue => unreachable!("drained above"),
        }

        let c = self.require_token_byte(sink, write_intermediates)?;
        match c {
            b']' if peek_stack == Scope::EmptyArray => {
                self.source.move_to(sink, 1)?;
                return Ok(self.set_peeked(Peeked::EndArray));
            }
            // A separator with no value before it: in lenient mode an elided
            // array element reads as null. The separator stays unconsumed.
            b']' | b';' | b',' => {
                return if matches!(peek_stack, Scope::EmptyArray | Scope::NonemptyArray) {
                    self.check_lenient()?;
                    Ok(self.set_peeked(Peeked::Null))
                } else {
                    Err(self.err_syntax("Unexpected value"))
                };
            }
            b'\'' => {
                self.check_lenient()?;
                self.source.move_to(sink, 1)?;
                return Ok(self.set_peeked(Peeked::SingleQuoted));
            }
            b'"' => {
                self.source.move_to(sink, 1)?;
                return Ok(self.set_peeked(Peeked::DoubleQuoted));
            }
            b'[' => {
                self.source.move_to(sink, 1)?;
                return Ok(self.set_peeked(Peeked::BeginArray));
            }
            b'{' => {
                self.source.move_to(sink, 1)?;
                return Ok(self.set_peeked(Peeked::BeginObject));
            }
            _ => {}
        }

        let result = self.peek_keyword(sink)?;
        if result != Peeked::None {
            return Ok(result);
        }

        let result = self.peek_number(sink)?;
        if result != Peeked::None {
            return Ok(result);
        }

        if !self.is_literal(self.source.get_byte(0))? {
            return Err(self.err_syntax("Expected value"));
        }

        self.check_lenient()?;
        Ok(self.set_peeked(Peeked::Unquoted))
    }

    fn set_peeked(&mut self, p: Peeked) -> Peeked {
        self.peeked = p;
        p
    }

    /// Scans to the next byte that is neither whitespace nor part of a
    /// comment, leaving it buffered at position 0. `Ok(None)` at end of
    /// input. Every byte moved past — whitespace and comment bodies — is
    /// routed to `sink`.
    fn next_non_whitespace(&mut self, sink: &mut dyn Sink) -> Result<Option<u8>> {
        let mut p = 0usize;
        while self.source.request(p + 1)? {
            let c = self.source.get_byte(p);
            p += 1;
            if matches!(c, b'\n' | b' ' | b'\r' | b'\t') {
                continue;
            }
            self.source.move_to(sink, p - 1)?;
            if c == b'/' {
                if !self.source.request(2)? {
                    return Ok(Some(c));
                }
                self.check_lenient()?;
                match self.source.get_byte(1) {
                    b'*' => {
                        self.source.move_to(sink, 2)?;
                        if !self.skip_to_end_of_block_comment(sink)? {
                            return Err(self.err_syntax("Unterminated comment"));
                        }
                        p = 0;
                    }
                    b'/' => {
                        self.source.move_to(sink, 2)?;
                        self.skip_to_end_of_line(sink)?;
                        p = 0;
                    }
                    _ => return Ok(Some(c)),
                }
            } else if c == b'#' {
                // Not in the RFC, but required to read existing documents.
                self.check_lenient()?;
                self.skip_to_end_of_line(sink)?;
                p = 0;
            } else {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    /// Like [`next_non_whitespace`], routing intermediates to `sink` only
    /// when `write_intermediates` is set.
    fn token_byte(&mut self, sink: &mut dyn Sink, write_intermediates: bool) -> Result<Option<u8>> {
        if write_intermediates {
            self.next_non_whitespace(sink)
        } else {
            self.next_non_whitespace(&mut Blackhole)
        }
    }

    fn require_token_byte(
        &mut self,
        sink: &mut dyn Sink,
        write_intermediates: bool,
    ) -> Result<u8> {
        match self.token_byte(sink, write_intermediates)? {
            Some(c) => Ok(c),
            None => Err(self.err_eof()),
        }
    }

    fn consume_intermediate(
        &mut self,
        sink: &mut dyn Sink,
        write_intermediates: bool,
        count: usize,
    ) -> Result<()> {
        if write_intermediates {
            self.source.move_to(sink, count)?;
        } else {
            self.source.skip(count);
        }
        Ok(())
    }

    fn skip_to_end_of_line(&mut self, sink: &mut dyn Sink) -> Result<()> {
        let index = self.source.index_of_element(&LINEFEED_OR_CARRIAGE_RETURN, 0)?;
        let count = match index {
            Some(i) => i + 1,
            None => self.source.buffered_len(),
        };
        self.source.move_to(sink, count)?;
        Ok(())
    }

    fn skip_to_end_of_block_comment(&mut self, sink: &mut dyn Sink) -> Result<bool> {
        let index = self.source.index_of(CLOSING_BLOCK_COMMENT, 0)?;
        let (count, found) = match index {
            Some(i) => (i + CLOSING_BLOCK_COMMENT.len(), true),
            None => (self.source.buffered_len(), false),
        };
        self.source.move_to(sink, count)?;
        Ok(found)
    }

    fn check_lenient(&self) -> Result<()> {
        if self.lenient {
            Ok(())
        } else {
            Err(self.err_syntax("Use lenient mode to accept malformed JSON"))
        }
    }

    fn peek_keyword(&mut self, sink: &mut dyn Sink) -> Result<Peeked> {
        let c = self.source.get_byte(0);
        let (keyword, peeking) = match c {
            b't' | b'T' => (&b"true"[..], Peeked::True),
            b'f' | b'F' => (&b"false"[..], Peeked::False),
            b'n' | b'N' => (&b"null"[..], Peeked::Null),
            _ => return Ok(Peeked::None),
        };

        // Confirm that bytes [1..len) match the keyword, case-insensitively.
        for (i, &expected) in keyword.iter().enumerate().skip(1) {
            if !self.source.request(i + 1)? {
                return Ok(Peeked::None);
            }
            if !self.source.get_byte(i).eq_ignore_ascii_case(&expected) {
                return Ok(Peeked::None);
            }
        }

        if self.source.request(keyword.len() + 1)?
            && self.is_literal(self.source.get_byte(keyword.len()))?
        {
            return Ok(Peeked::None); // don't match trues, falsey or nullsoft
        }

        // The keyword is followed by EOF or a non-literal byte.
        self.source.move_to(sink, keyword.len())?;
        Ok(self.set_peeked(peeking))
    }

    fn peek_number(&mut self, sink: &mut dyn Sink) -> Result<Peeked> {
        // Accumulate negatively so i64::MIN is representable.
        let mut value: i64 = 0;
        let mut negative = false;
        let mut fits_in_long = true;
        let mut last = NumberChar::None;

        let mut i = 0usize;
        'characters_of_number: loop {
            if !self.source.request(i + 1)? {
                break;
            }
            let c = self.source.get_byte(i);
            match c {
                b'-' => match last {
                    NumberChar::None => {
                        negative = true;
                        last = NumberChar::Sign;
                    }
                    NumberChar::ExpE => last = NumberChar::ExpSign,
                    _ => return Ok(Peeked::None),
                },
                b'+' => match last {
                    NumberChar::ExpE => last = NumberChar::ExpSign,
                    _ => return Ok(Peeked::None),
                },
                b'e' | b'E' => match last {
                    NumberChar::Digit | NumberChar::FractionDigit => last = NumberChar::ExpE,
                    _ => return Ok(Peeked::None),
                },
                b'.' => match last {
                    NumberChar::Digit => last = NumberChar::Decimal,
                    _ => return Ok(Peeked::None),
                },
                _ => {
                    if !c.is_ascii_digit() {
                        if !self.is_literal(c)? {
                            break 'characters_of_number;
                        }
                        return Ok(Peeked::None);
                    }
                    match last {
                        NumberChar::Sign | NumberChar::None => {
                            value = -i64::from(c - b'0');
                            last = NumberChar::Digit;
                        }
                        NumberChar::Digit => {
                            if value == 0 {
                                // A leading '0' prefix could be octal.
                                return Ok(Peeked::None);
                            }
                            let new_value = value.wrapping_mul(10).wrapping_sub(i64::from(c - b'0'));
                            fits_in_long &= value > MIN_INCOMPLETE_INTEGER
                                || (value == MIN_INCOMPLETE_INTEGER && new_value < value);
                            value = new_value;
                        }
                        NumberChar::Decimal => last = NumberChar::FractionDigit,
                        NumberChar::ExpE | NumberChar::ExpSign => last = NumberChar::ExpDigit,
                        NumberChar::FractionDigit | NumberChar::ExpDigit => {}
                    }
                }
            }
            i += 1;
        }

        // The literal is complete; classify it.
        if last == NumberChar::Digit
            && fits_in_long
            && (value != i64::MIN || negative)
            && (value != 0 || !negative)
        {
            self.peeked_long = if negative { value } else { -value };
            self.source.move_to(sink, i)?;
            Ok(self.set_peeked(Peeked::Long))
        } else if matches!(
            last,
            NumberChar::Digit | NumberChar::FractionDigit | NumberChar::ExpDigit
        ) {
            self.peeked_number_length = i;
            Ok(self.set_peeked(Peeked::Number))
        } else {
            Ok(Peeked::None)
        }
    }

    fn is_literal(&self, c: u8) -> Result<bool> {
        match c {
            b'/' | b'\\' | b';' | b'#' | b'=' => {
                self.check_lenient()?;
                Ok(false)
            }
            b'{' | b'}' | b'[' | b']' | b':' | b',' | b' ' | b'\t' | b'\x0c' | b'\r' | b'\n' => {
                Ok(false)
            }
            _ => Ok(true),
        }
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    /// Consumes and returns the next object name.
    pub fn next_name(&mut self) -> Result<String> {
        let p = self.peeked_or_peek()?;
        let result = match p {
            Peeked::UnquotedName => self.next_unquoted_value()?,
            Peeked::DoubleQuotedName => self.next_quoted_value(&DOUBLE_QUOTE_OR_SLASH)?,
            Peeked::SingleQuotedName => self.next_quoted_value(&SINGLE_QUOTE_OR_SLASH)?,
            Peeked::BufferedName => match self.peeked_string.take() {
                Some(name) => name,
                None => unreachable!("buffered name was peeked but no string is cached"),
            },
            _ => return Err(self.err_expected("a name")),
        };
        self.peeked = Peeked::None;
        self.stack.set_name(result.clone());
        Ok(result)
    }

    /// Consumes the next name if it is in `options`, returning its index.
    ///
    /// On a miss nothing is consumed and no path state changes; the parsed
    /// name (if parsing was needed to decide) is cached so a subsequent
    /// [`next_name`](Self::next_name) or retry is cheap.
    pub fn select_name(&mut self, options: &SelectOptions) -> Result<Option<usize>> {
        let p = self.peeked_or_peek()?;
        if !p.is_name() {
            return Ok(None);
        }
        if p == Peeked::BufferedName {
            let candidate = match &self.peeked_string {
                Some(name) => name.clone(),
                None => unreachable!("buffered name was peeked but no string is cached"),
            };
            return Ok(self.find_name(&candidate, options));
        }

        if let Some(index) = self.source.select(options.suffixes())? {
            self.peeked = Peeked::None;
            self.stack.set_name(options.strings()[index].clone());
            return Ok(Some(index));
        }

        // The name may be escaped unnecessarily; parse it and compare. Keep
        // the prior path name so a miss can make it seem like nothing
        // happened.
        let last_path_name = self.stack.name();
        let next_name = self.next_name()?;
        let result = self.find_name(&next_name, options);
        if result.is_none() {
            self.peeked = Peeked::BufferedName;
            self.peeked_string = Some(next_name);
            self.stack.restore_name(last_path_name);
        }
        Ok(result)
    }

    fn find_name(&mut self, name: &str, options: &SelectOptions) -> Option<usize> {
        let index = options.position(name)?;
        self.peeked = Peeked::None;
        self.peeked_string = None;
        self.stack.set_name(name.to_string());
        Some(index)
    }

    /// Skips the next name. The path records the literal `null` in its
    /// place.
    pub fn skip_name(&mut self) -> Result<()> {
        if self.fail_on_unknown {
            // Peek first: next_name() below resets the token.
            let peeked = self.peek()?;
            self.next_name()?; // move the path onto the offending name
            return Err(self.err_data(format!("Cannot skip unexpected {peeked}")));
        }
        let p = self.peeked_or_peek()?;
        match p {
            Peeked::UnquotedName => self.skip_unquoted_value(&mut Blackhole)?,
            Peeked::DoubleQuotedName => {
                self.skip_quoted_value(&DOUBLE_QUOTE_OR_SLASH, &mut Blackhole)?
            }
            Peeked::SingleQuotedName => {
                self.skip_quoted_value(&SINGLE_QUOTE_OR_SLASH, &mut Blackhole)?
            }
            Peeked::BufferedName => {
                self.peeked_string = None;
            }
            _ => return Err(self.err_expected("a name")),
        }
        self.peeked = Peeked::None;
        self.stack.set_name("null".to_string());
        Ok(())
    }

    /// Re-classifies a pending name as a string value. Used when object keys
    /// are decoded as values (e.g. maps with non-string key types).
    pub fn promote_name_to_value(&mut self) -> Result<()> {
        if self.has_next()? {
            let name = self.next_name()?;
            self.peeked_string = Some(name);
            self.peeked = Peeked::Buffered;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Consumes and returns the next value as a string.
    ///
    /// Numbers are returned in their literal form; a recognized 64-bit
    /// integer is rendered canonically.
    pub fn next_string(&mut self) -> Result<String> {
        let p = self.peeked_or_peek()?;
        let result = match p {
            Peeked::Unquoted => self.next_unquoted_value()?,
            Peeked::DoubleQuoted => self.next_quoted_value(&DOUBLE_QUOTE_OR_SLASH)?,
            Peeked::SingleQuoted => self.next_quoted_value(&SINGLE_QUOTE_OR_SLASH)?,
            Peeked::Buffered => match self.peeked_string.take() {
                Some(string) => string,
                None => unreachable!("buffered string was peeked but no string is cached"),
            },
            Peeked::Long => self.peeked_long.to_string(),
            Peeked::Number => self.source.read_utf8(self.peeked_number_length),
            _ => return Err(self.err_expected("a string")),
        };
        self.peeked = Peeked::None;
        self.stack.bump_index();
        Ok(result)
    }

    /// Consumes the next string if it is in `options`, returning its index.
    ///
    /// Misses leave the reader observably unchanged, caching the parsed
    /// string when parsing was needed to decide.
    pub fn select_string(&mut self, options: &SelectOptions) -> Result<Option<usize>> {
        let p = self.peeked_or_peek()?;
        if !p.is_string_value() {
            return Ok(None);
        }
        if p == Peeked::Buffered {
            let candidate = match &self.peeked_string {
                Some(string) => string.clone(),
                None => unreachable!("buffered string was peeked but no string is cached"),
            };
            if let Some(index) = self.find_string(&candidate, options) {
                self.peeked_string = None;
                self.stack.bump_index();
                return Ok(Some(index));
            }
            return Ok(None);
        }

        if let Some(index) = self.source.select(options.suffixes())? {
            self.peeked = Peeked::None;
            self.stack.bump_index();
            return Ok(Some(index));
        }

        let next_string = self.next_string()?;
        if let Some(index) = self.find_string(&next_string, options) {
            return Ok(Some(index));
        }
        self.peeked = Peeked::Buffered;
        self.peeked_string = Some(next_string);
        self.stack.unbump_index();
        Ok(None)
    }

    fn find_string(&mut self, string: &str, options: &SelectOptions) -> Option<usize> {
        let index = options.position(string)?;
        self.peeked = Peeked::None;
        Some(index)
    }

    /// Consumes and returns the next boolean.
    pub fn next_boolean(&mut self) -> Result<bool> {
        let p = self.peeked_or_peek()?;
        match p {
            Peeked::True => {
                self.peeked = Peeked::None;
                self.stack.bump_index();
                Ok(true)
            }
            Peeked::False => {
                self.peeked = Peeked::None;
                self.stack.bump_index();
                Ok(false)
            }
            _ => Err(self.err_expected("a boolean")),
        }
    }

    /// Consumes the next value, which must be a JSON null.
    pub fn next_null(&mut self) -> Result<()> {
        let p = self.peeked_or_peek()?;
        if p == Peeked::Null {
            self.peeked = Peeked::None;
            self.stack.bump_index();
            Ok(())
        } else {
            Err(self.err_expected("null"))
        }
    }

    /// Consumes and returns the next value as an `f64`.
    ///
    /// Strings that parse as doubles are accepted. Non-finite results are
    /// rejected unless the reader is lenient.
    pub fn next_double(&mut self) -> Result<f64> {
        let p = self.peeked_or_peek()?;

        if p == Peeked::Long {
            self.peeked = Peeked::None;
            self.stack.bump_index();
            return Ok(self.peeked_long as f64);
        }

        match p {
            Peeked::Number => {
                let literal = self.source.read_utf8(self.peeked_number_length);
                self.peeked_string = Some(literal);
            }
            Peeked::DoubleQuoted => {
                let string = self.next_quoted_value(&DOUBLE_QUOTE_OR_SLASH)?;
                self.peeked_string = Some(string);
            }
            Peeked::SingleQuoted => {
                let string = self.next_quoted_value(&SINGLE_QUOTE_OR_SLASH)?;
                self.peeked_string = Some(string);
            }
            Peeked::Unquoted => {
                let string = self.next_unquoted_value()?;
                self.peeked_string = Some(string);
            }
            Peeked::Buffered => {}
            _ => return Err(self.err_expected("a double")),
        }

        self.peeked = Peeked::Buffered;
        let literal = self.peeked_string.clone().unwrap_or_default();
        let result: f64 = literal
            .parse()
            .map_err(|_| self.err_data(format!("Expected a double but was {literal}")))?;
        if !self.lenient && (result.is_nan() || result.is_infinite()) {
            return Err(self.err_syntax(format!("JSON forbids NaN and infinities: {result}")));
        }
        self.peeked_string = None;
        self.peeked = Peeked::None;
        self.stack.bump_index();
        Ok(result)
    }

    /// Consumes and returns the next value as an `i64`.
    ///
    /// Number literals and strings that denote an exact integer are
    /// accepted; anything else is a data error.
    pub fn next_long(&mut self) -> Result<i64> {
        let p = self.peeked_or_peek()?;

        if p == Peeked::Long {
            self.peeked = Peeked::None;
            self.stack.bump_index();
            return Ok(self.peeked_long);
        }

        match p {
            Peeked::Number => {
                let literal = self.source.read_utf8(self.peeked_number_length);
                self.peeked_string = Some(literal);
            }
            Peeked::DoubleQuoted | Peeked::SingleQuoted => {
                let string = if p == Peeked::DoubleQuoted {
                    self.next_quoted_value(&DOUBLE_QUOTE_OR_SLASH)?
                } else {
                    self.next_quoted_value(&SINGLE_QUOTE_OR_SLASH)?
                };
                if let Ok(result) = string.parse::<i64>() {
                    self.peeked = Peeked::None;
                    self.stack.bump_index();
                    return Ok(result);
                }
                self.peeked_string = Some(string);
            }
            Peeked::Buffered => {}
            _ => return Err(self.err_expected("a long")),
        }

        self.peeked = Peeked::Buffered;
        let literal = self.peeked_string.clone().unwrap_or_default();
        let result = parse_long_exact(&literal)
            .ok_or_else(|| self.err_data(format!("Expected a long but was {literal}")))?;
        self.peeked_string = None;
        self.peeked = Peeked::None;
        self.stack.bump_index();
        Ok(result)
    }

    /// Consumes and returns the next value as an `i32`.
    pub fn next_int(&mut self) -> Result<i32> {
        let p = self.peeked_or_peek()?;

        if p == Peeked::Long {
            let result = self.peeked_long as i32;
            if i64::from(result) != self.peeked_long {
                return Err(self.err_data(format!("Expected an int but was {}", self.peeked_long)));
            }
            self.peeked = Peeked::None;
            self.stack.bump_index();
            return Ok(result);
        }

        match p {
            Peeked::Number => {
                let literal = self.source.read_utf8(self.peeked_number_length);
                self.peeked_string = Some(literal);
            }
            Peeked::DoubleQuoted | Peeked::SingleQuoted => {
                let string = if p == Peeked::DoubleQuoted {
                    self.next_quoted_value(&DOUBLE_QUOTE_OR_SLASH)?
                } else {
                    self.next_quoted_value(&SINGLE_QUOTE_OR_SLASH)?
                };
                if let Ok(result) = string.parse::<i32>() {
                    self.peeked = Peeked::None;
                    self.stack.bump_index();
                    return Ok(result);
                }
                self.peeked_string = Some(string);
            }
            Peeked::Buffered => {}
            _ => return Err(self.err_expected("an int")),
        }

        self.peeked = Peeked::Buffered;
        let literal = self.peeked_string.clone().unwrap_or_default();
        let as_double: f64 = literal
            .parse()
            .map_err(|_| self.err_data(format!("Expected an int but was {literal}")))?;
        let result = as_double as i32;
        if f64::from(result) != as_double {
            // Precision was lost in the cast.
            return Err(self.err_data(format!("Expected an int but was {literal}")));
        }
        self.peeked_string = None;
        self.peeked = Peeked::None;
        self.stack.bump_index();
        Ok(result)
    }

    // ------------------------------------------------------------------
    // String scanning
    // ------------------------------------------------------------------

    /// Reads a quoted string up to (not including) the closing terminator,
    /// decoding escapes. The opening quote must already be consumed; the
    /// closing quote is consumed but not returned.
    fn next_quoted_value(&mut self, run_terminator: &ByteSet) -> Result<String> {
        let mut builder: Option<String> = None;
        loop {
            let index = self
                .source
                .index_of_element(run_terminator, 0)?
                .ok_or_else(|| self.err_syntax("Unterminated string"))?;

            // An escape needs decoding; everything else in the run is kept.
            if self.source.get_byte(index) == b'\\' {
                let run = self.source.read_utf8(index);
                let builder = builder.get_or_insert_with(String::new);
                builder.push_str(&run);
                self.source.skip(1); // '\'
                let decoded = self.read_escape_character()?;
                builder.push(decoded);
                continue;
            }

            let run = self.source.read_utf8(index);
            self.source.skip(1); // closing quote
            return Ok(match builder {
                None => run,
                Some(mut b) => {
                    b.push_str(&run);
                    b
                }
            });
        }
    }

    /// Reads an unquoted literal as a string.
    fn next_unquoted_value(&mut self) -> Result<String> {
        let i = self.source.index_of_element(&UNQUOTED_STRING_TERMINALS, 0)?;
        Ok(match i {
            Some(i) => self.source.read_utf8(i),
            None => {
                let rest = self.source.buffered_len();
                self.source.read_utf8(rest)
            }
        })
    }

    /// Skips a quoted string, routing every byte — escapes included,
    /// verbatim — into `sink`.
    fn skip_quoted_value(&mut self, run_terminator: &ByteSet, sink: &mut dyn Sink) -> Result<()> {
        loop {
            let index = self
                .source
                .index_of_element(run_terminator, 0)?
                .ok_or_else(|| self.err_syntax("Unterminated string"))?;
            if self.source.get_byte(index) == b'\\' {
                self.source.move_to(sink, index + 1)?;
                self.skip_escape_character(sink)?;
            } else {
                self.source.move_to(sink, index + 1)?;
                return Ok(());
            }
        }
    }

    fn skip_unquoted_value(&mut self, sink: &mut dyn Sink) -> Result<()> {
        let i = self.source.index_of_element(&UNQUOTED_STRING_TERMINALS, 0)?;
        let count = match i {
            Some(i) => i,
            None => self.source.buffered_len(),
        };
        self.source.move_to(sink, count)?;
        Ok(())
    }

    /// Decodes the escape that follows an already-consumed backslash,
    /// returning the decoded character.
    ///
    /// `\uXXXX` decodes one UTF-16 unit; a high surrogate must be followed
    /// by a low-surrogate escape and both combine into one character. A
    /// lone surrogate is rejected (it has no Rust text representation).
    fn read_escape_character(&mut self) -> Result<char> {
        if !self.source.request(1)? {
            return Err(self.err_syntax("Unterminated escape sequence"));
        }
        let escaped = self.source.read_byte();
        match escaped {
            b'u' => {
                let unit = self.read_hex4(0)?;
                if is_high_surrogate(unit) {
                    if !self.source.request(10)? {
                        return Err(self.err_eof());
                    }
                    if self.source.get_byte(4) != b'\\' || self.source.get_byte(5) != b'u' {
                        return Err(self.err_syntax("Unpaired surrogate"));
                    }
                    let low = self.read_hex4(6)?;
                    if !is_low_surrogate(low) {
                        return Err(self.err_syntax("Unpaired surrogate"));
                    }
                    self.source.skip(10);
                    Ok(combine_surrogates(unit, low))
                } else if is_low_surrogate(unit) {
                    Err(self.err_syntax("Unpaired surrogate"))
                } else {
                    self.source.skip(4);
                    match char::from_u32(u32::from(unit)) {
                        Some(c) => Ok(c),
                        None => Err(self.err_syntax("Invalid \\u escape")),
                    }
                }
            }
            b't' => Ok('\t'),
            b'b' => Ok('\u{0008}'),
            b'n' => Ok('\n'),
            b'r' => Ok('\r'),
            b'f' => Ok('\u{000C}'),
            b'\n' | b'\'' | b'"' | b'\\' | b'/' => Ok(escaped as char),
            _ => {
                if !self.lenient {
                    return Err(
                        self.err_syntax(format!("Invalid escape sequence: \\{}", escaped as char))
                    );
                }
                Ok(escaped as char)
            }
        }
    }

    /// Skips the escape that follows an already-consumed backslash, routing
    /// its bytes verbatim into `sink`.
    ///
    /// A `\uXXXX` unit is checked for well-formed hex and nothing more;
    /// surrogate pairing is left to the decoding paths.
    fn skip_escape_character(&mut self, sink: &mut dyn Sink) -> Result<()> {
        if !self.source.request(1)? {
            return Err(self.err_syntax("Unterminated escape sequence"));
        }
        let escaped = self.source.get_byte(0);
        self.source.move_to(sink, 1)?;
        match escaped {
            b'u' => {
                self.read_hex4(0)?;
                self.source.move_to(sink, 4)?;
                Ok(())
            }
            b't' | b'b' | b'n' | b'r' | b'f' | b'\n' | b'\'' | b'"' | b'\\' | b'/' => Ok(()),
            _ => {
                if !self.lenient {
                    return Err(
                        self.err_syntax(format!("Invalid escape sequence: \\{}", escaped as char))
                    );
                }
                Ok(())
            }
        }
    }

    /// Reads four buffered hex digits at `offset` as one UTF-16 code unit.
    /// Does not consume.
    fn read_hex4(&mut self, offset: usize) -> Result<u16> {
        if !self.source.request(offset + 4)? {
            return Err(self.err_eof());
        }
        let mut result: u16 = 0;
        for i in offset..offset + 4 {
            let c = self.source.get_byte(i);
            result <<= 4;
            result += match c {
                b'0'..=b'9' => u16::from(c - b'0'),
                b'a'..=b'f' => u16::from(c - b'a' + 10),
                b'A'..=b'F' => u16::from(c - b'A' + 10),
                _ => {
                    let seen = self.source.read_utf8(offset + 4);
                    return Err(self.err_syntax(format!("Invalid \\u escape in {seen}")));
                }
            };
        }
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Skipping and passthrough
    // ------------------------------------------------------------------

    /// Skips the next value recursively. The path stamps `null` over the
    /// current name and advances the index.
    pub fn skip_value(&mut self) -> Result<()> {
        if self.fail_on_unknown {
            let peeked = self.peek()?;
            return Err(self.err_data(format!("Cannot skip unexpected {peeked}")));
        }
        self.read_value(&mut Blackhole)?;
        self.stack.bump_index();
        self.stack.set_name("null".to_string());
        Ok(())
    }

    /// Copies the bytes of the next JSON value into `sink`, byte-identical
    /// to the input including interior whitespace and comments.
    ///
    /// Leading whitespace and comments *before* the value are not included.
    /// Afterwards the value counts as consumed: the array index advances and
    /// the current name reads `null`.
    pub fn stream_value(&mut self, sink: &mut dyn Sink) -> Result<()> {
        self.read_value(sink)?;
        self.stack.bump_index();
        self.stack.set_name("null".to_string());
        Ok(())
    }

    /// Like [`stream_value`](Self::stream_value), but lets a JSON writer
    /// prepare (separators, indentation) via its
    /// [`before_value`](ValueSink::before_value) hook first.
    pub fn stream_value_to_writer<W: ValueSink>(&mut self, writer: &mut W) -> Result<()> {
        writer.before_value()?;
        self.stream_value(writer)
    }

    /// Depth-counter driven drain of one whole value into `sink`.
    fn read_value(&mut self, sink: &mut dyn Sink) -> Result<()> {
        let mut count = 0i32;
        loop {
            let mut p = self.peeked;
            if p == Peeked::None {
                // Intermediates are only part of the value once we are past
                // its opening byte.
                p = self.do_peek_sink(sink, count != 0)?;
            }

            match p {
                Peeked::BeginArray => {
                    self.push_scope(Scope::EmptyArray)?;
                    count += 1;
                }
                Peeked::BeginObject => {
                    self.push_scope(Scope::EmptyObject)?;
                    count += 1;
                }
                Peeked::EndArray | Peeked::EndObject => {
                    count -= 1;
                    if count < 0 {
                        return Err(self.err_expected("a value"));
                    }
                    self.stack.pop();
                }
                Peeked::UnquotedName | Peeked::Unquoted => {
                    self.skip_unquoted_value(sink)?;
                }
                Peeked::DoubleQuoted | Peeked::DoubleQuotedName => {
                    self.skip_quoted_value(&DOUBLE_QUOTE_OR_SLASH, sink)?;
                }
                Peeked::SingleQuoted | Peeked::SingleQuotedName => {
                    self.skip_quoted_value(&SINGLE_QUOTE_OR_SLASH, sink)?;
                }
                Peeked::Number => {
                    self.source.move_to(sink, self.peeked_number_length)?;
                }
                Peeked::Eof => {
                    return Err(self.err_expected("a value"));
                }
                // True/False/Null/Long bytes were already routed by the
                // structural peek; Buffered carries no source bytes.
                _ => {}
            }
            self.peeked = Peeked::None;
            if count == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Streams the next double-quoted string into `sink` with its quotes
    /// kept but every escape decoded, producing the canonical quoted form.
    ///
    /// Surrogate-pair escapes are combined and written as UTF-8.
    pub fn stream_double_quoted_string_unescape(&mut self, sink: &mut dyn Sink) -> Result<()> {
        let p = self.peeked_or_peek()?;
        if p != Peeked::DoubleQuoted {
            let mut raw = Vec::new();
            self.stream_value(&mut raw)?;
            return Err(self.err_data(format!(
                "Expected a double-quoted string but was {}",
                String::from_utf8_lossy(&raw)
            )));
        }

        // The structural peek already consumed the opening quote.
        sink.write_all(b"\"")?;
        self.skip_double_quoted_unescape(sink)?;
        self.peeked = Peeked::None;
        self.stack.bump_index();
        self.stack.set_name("null".to_string());
        Ok(())
    }

    fn skip_double_quoted_unescape(&mut self, sink: &mut dyn Sink) -> Result<()> {
        loop {
            let index = self
                .source
                .index_of_element(&DOUBLE_QUOTE_OR_SLASH, 0)?
                .ok_or_else(|| self.err_syntax("Unterminated string"))?;
            if self.source.get_byte(index) == b'\\' {
                self.source.move_to(sink, index)?;
                self.write_escape_character(sink)?;
            } else {
                self.source.move_to(sink, index + 1)?;
                return Ok(());
            }
        }
    }

    /// Decodes one escape sequence and writes the decoded form to `sink`.
    /// The backslash is buffered at position 0 on entry.
    fn write_escape_character(&mut self, sink: &mut dyn Sink) -> Result<()> {
        if !self.source.request(2)? {
            return Err(self.err_syntax("Unterminated escape sequence"));
        }
        self.source.skip(1); // '\'
        let escaped = self.source.read_byte();
        match escaped {
            b'u' => {
                let unit = self.read_hex4(0)?;
                if is_high_surrogate(unit) {
                    // The low half must follow as another \u escape.
                    if !self.source.request(10)? {
                        return Err(self.err_eof());
                    }
                    if self.source.get_byte(4) != b'\\' || self.source.get_byte(5) != b'u' {
                        return Err(self.err_syntax("Unpaired surrogate"));
                    }
                    let low = self.read_hex4(6)?;
                    if !is_low_surrogate(low) {
                        return Err(self.err_syntax("Unpaired surrogate"));
                    }
                    let mut utf8 = [0u8; 4];
                    let encoded = combine_surrogates(unit, low).encode_utf8(&mut utf8);
                    sink.write_all(encoded.as_bytes())?;
                    self.source.skip(10);
                } else if is_low_surrogate(unit) {
                    return Err(self.err_syntax("Unpaired surrogate"));
                } else {
                    let c = match char::from_u32(u32::from(unit)) {
                        Some(c) => c,
                        None => return Err(self.err_syntax("Invalid \\u escape")),
                    };
                    let mut utf8 = [0u8; 4];
                    sink.write_all(c.encode_utf8(&mut utf8).as_bytes())?;
                    self.source.skip(4);
                }
                Ok(())
            }
            b't' => sink.write_all(b"\t").map_err(ReadError::from),
            b'b' => sink.write_all(b"\x08").map_err(ReadError::from),
            b'n' => sink.write_all(b"\n").map_err(ReadError::from),
            b'r' => sink.write_all(b"\r").map_err(ReadError::from),
            b'f' => sink.write_all(b"\x0c").map_err(ReadError::from),
            b'\n' | b'\'' | b'"' | b'\\' | b'/' => {
                sink.write_all(&[escaped]).map_err(ReadError::from)
            }
            _ => {
                if !self.lenient {
                    return Err(
                        self.err_syntax(format!("Invalid escape sequence: \\{}", escaped as char))
                    );
                }
                sink.write_all(&[escaped]).map_err(ReadError::from)
            }
        }
    }

    // ------------------------------------------------------------------
    // Dry-run peeking
    // ------------------------------------------------------------------

    /// Classifies the next value without consuming any input or touching the
    /// cached look-ahead. Idempotent.
    ///
    /// This is a fast hint for choosing between the `stream_*` methods: `"`
    /// means a string, `n`/`N` is assumed to start `null` without verifying
    /// the remaining letters, and anything else reports
    /// [`DryRunHint::Other`].
    pub fn peek_dry_run(&mut self) -> Result<DryRunHint> {
        let mut p = 0usize;
        while self.source.request(p + 1)? {
            let c = self.source.get_byte(p);
            p += 1;
            if matches!(c, b':' | b',' | b'\n' | b' ' | b'\r' | b'\t') {
                continue;
            }
            return Ok(match c {
                b'"' => DryRunHint::String,
                b'n' | b'N' => DryRunHint::Null,
                _ => DryRunHint::Other,
            });
        }
        Err(self.err_eof())
    }

    /// Returns `true` when the next value looks like `null`. See
    /// [`peek_dry_run`](Self::peek_dry_run).
    pub fn next_value_is_null_dry_run(&mut self) -> Result<bool> {
        Ok(self.peek_dry_run()? == DryRunHint::Null)
    }

    // ------------------------------------------------------------------
    // Raw value extraction
    // ------------------------------------------------------------------

    /// Hands out the raw bytes of the next value as a byte stream.
    ///
    /// The stream replays any bytes the reader already consumed to classify
    /// the value, then passes the rest through without consuming past the
    /// value's end. While the borrow lives — and afterwards, until the next
    /// reader operation implicitly drains it — the reader is suspended.
    pub fn next_source(&mut self) -> Result<ValueSource<'_>> {
        let p = self.peeked_or_peek()?;

        let mut prefix = Vec::new();
        let mut state = StreamState::EndOfJson;
        let mut depth = 0usize;
        match p {
            Peeked::BeginArray => {
                prefix.push(b'[');
                state = StreamState::Json;
                depth = 1;
            }
            Peeked::BeginObject => {
                prefix.push(b'{');
                state = StreamState::Json;
                depth = 1;
            }
            Peeked::DoubleQuoted => {
                prefix.push(b'"');
                state = StreamState::DoubleQuoted;
            }
            Peeked::SingleQuoted => {
                prefix.push(b'\'');
                state = StreamState::SingleQuoted;
            }
            Peeked::Number | Peeked::Long | Peeked::Unquoted => {
                let literal = self.next_string()?;
                prefix.extend_from_slice(literal.as_bytes());
            }
            Peeked::True => prefix.extend_from_slice(b"true"),
            Peeked::False => prefix.extend_from_slice(b"false"),
            Peeked::Null => prefix.extend_from_slice(b"null"),
            Peeked::Buffered => {
                let string = self.next_string()?;
                strings::push_json_string(&mut prefix, &string);
            }
            _ => return Err(self.err_expected("a value")),
        }

        // Advance the path and clear the peek if the branch above did not.
        if self.peeked != Peeked::None {
            self.stack.bump_index();
            self.peeked = Peeked::None;
        }

        self.value_stream = Some(ValueStream::new(state, prefix, depth));
        self.push_scope(Scope::StreamingValue)?;
        Ok(ValueSource::new(self))
    }

    // ------------------------------------------------------------------
    // Copying and closing
    // ------------------------------------------------------------------

    /// Returns a deep-copy reader for look-ahead.
    ///
    /// The copy shares buffered bytes with this reader but has independent
    /// position and state: operations on the copy never affect the original.
    /// Consuming on the original can invalidate the copy, whose next
    /// operation then reports a stream error.
    pub fn peek_json(&self) -> JsonReader {
        JsonReader {
            source: self.source.peek(),
            lenient: self.lenient,
            fail_on_unknown: self.fail_on_unknown,
            stack: self.stack.clone(),
            peeked: self.peeked,
            peeked_long: self.peeked_long,
            peeked_number_length: self.peeked_number_length,
            peeked_string: self.peeked_string.clone(),
            value_stream: self.value_stream.clone(),
        }
    }

    /// Closes the reader and its source.
    ///
    /// Fails if a value source from [`next_source`](Self::next_source) has
    /// not been exhausted. Closing an already-closed reader is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.stack.top() == Scope::StreamingValue {
            return Err(ReadError::ValueSourceOpen);
        }
        self.peeked = Peeked::None;
        self.peeked_string = None;
        self.value_stream = None;
        self.stack.close();
        self.source.close();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    pub(crate) fn err_syntax(&self, msg: impl Into<String>) -> ReadError {
        ReadError::Syntax {
            msg: msg.into(),
            path: self.path(),
        }
    }

    fn err_data(&self, msg: impl Into<String>) -> ReadError {
        ReadError::Data {
            msg: msg.into(),
            path: self.path(),
        }
    }

    pub(crate) fn err_eof(&self) -> ReadError {
        ReadError::UnexpectedEof { path: self.path() }
    }

    /// A data error naming the token that was found instead.
    fn err_expected(&self, expected: &str) -> ReadError {
        let found = match self.peeked.token() {
            Some(token) => token.to_string(),
            None => "nothing".to_string(),
        };
        self.err_data(format!("Expected {expected} but was {found}"))
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

fn combine_surrogates(high: u16, low: u16) -> char {
    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    // Always a valid scalar: both halves were range-checked.
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}
