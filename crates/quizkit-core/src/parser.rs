//! Parser for the stored option-list column.
//!
//! The questions table keeps each question's options as a Python-style
//! list literal, e.g. `['London', 'Berlin', 'Paris', 'Madrid']`. This
//! module reads that form (single- or double-quoted items, backslash
//! escapes including `\xHH`, `\uHHHH` and `\UHHHHHHHH`, optional trailing
//! comma) and writes it back out. Other unknown escapes are kept as-is,
//! backslash included.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Why an option list could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid option list at byte {position}: {message}")]
pub struct OptionsParseError {
    pub position: usize,
    pub message: String,
}

struct Cursor<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.input.len())
    }

    fn error(&mut self, message: impl Into<String>) -> OptionsParseError {
        OptionsParseError {
            position: self.position(),
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn expect(&mut self, want: char) -> Result<(), OptionsParseError> {
        match self.peek() {
            Some(c) if c == want => {
                self.chars.next();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{want}', found '{c}'"))),
            None => Err(self.error(format!("expected '{want}', found end of input"))),
        }
    }

    fn string(&mut self) -> Result<String, OptionsParseError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            Some(c) => return Err(self.error(format!("expected a quoted string, found '{c}'"))),
            None => return Err(self.error("expected a quoted string, found end of input")),
        };
        self.chars.next();

        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(out),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, c @ ('\\' | '\'' | '"'))) => out.push(c),
                    Some((_, 'x')) => out.push(self.hex_escape(2)?),
                    Some((_, 'u')) => out.push(self.hex_escape(4)?),
                    Some((_, 'U')) => out.push(self.hex_escape(8)?),
                    Some((_, c)) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(self.error("unterminated escape")),
                },
                Some((_, c)) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    /// Read exactly `digits` hex digits and decode them as a code point.
    fn hex_escape(&mut self, digits: usize) -> Result<char, OptionsParseError> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                return Err(self.error(format!("truncated escape, expected {digits} hex digits")));
            };
            self.chars.next();
            value = value * 16 + d;
        }
        char::from_u32(value).ok_or_else(|| self.error(format!("invalid code point {value:#x}")))
    }
}

/// Parse a stored option list into its items, in order.
pub fn parse_options(input: &str) -> Result<Vec<String>, OptionsParseError> {
    let mut cur = Cursor::new(input);
    let mut items = Vec::new();

    cur.skip_whitespace();
    cur.expect('[')?;
    cur.skip_whitespace();

    if cur.peek() == Some(']') {
        cur.chars.next();
    } else {
        loop {
            items.push(cur.string()?);
            cur.skip_whitespace();
            match cur.peek() {
                Some(',') => {
                    cur.chars.next();
                    cur.skip_whitespace();
                    if cur.peek() == Some(']') {
                        cur.chars.next();
                        break;
                    }
                }
                Some(']') => {
                    cur.chars.next();
                    break;
                }
                Some(c) => return Err(cur.error(format!("expected ',' or ']', found '{c}'"))),
                None => return Err(cur.error("unterminated list")),
            }
        }
    }

    cur.skip_whitespace();
    if let Some(c) = cur.peek() {
        return Err(cur.error(format!("trailing input starting with '{c}'")));
    }
    Ok(items)
}

/// Render options in the stored list form.
///
/// Items are single-quoted unless they contain a single quote and no
/// double quote, matching how the existing data files were produced.
pub fn format_options(options: &[String]) -> String {
    let items: Vec<String> = options.iter().map(|o| quote_item(o)).collect();
    format!("[{}]", items.join(", "))
}

fn quote_item(item: &str) -> String {
    let quote = if item.contains('\'') && !item.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(item.len() + 2);
    out.push(quote);
    for c in item.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
