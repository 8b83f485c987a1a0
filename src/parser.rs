// src/parser.rs
use crate::errors::CalcError;

#[derive(Debug)]
pub enum ParseError {
    InvalidSyntax(String),
}

impl From<ParseError> for CalcError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::InvalidSyntax(msg) => CalcError::Parse(msg),
        }
    }
}

/// Character cursor shared by the expression grammars and the literal scanner.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Run of ASCII letters, not consumed.
    pub fn peek_word(&self) -> &'a str {
        let rest = &self.s[self.i..];
        let end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        &rest[..end]
    }

    pub fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(ParseError::InvalidSyntax("identifier expected".into()));
        }
        Ok(self.s[start..self.i].to_string())
    }

    /// Name after a backslash: letters and `@`, or a single other character.
    pub fn parse_control_sequence(&mut self) -> Result<String, ParseError> {
        self.expect('\\')?;
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '@' || c.is_ascii_alphabetic() {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == start {
            match self.peek_char() {
                Some(c) => self.i += c.len_utf8(),
                None => {
                    return Err(ParseError::InvalidSyntax(
                        "control sequence name expected after `\\`".into(),
                    ))
                }
            }
        }
        Ok(self.s[start..self.i].to_string())
    }

    /// Digits with at most one decimal point; returns the raw text.
    pub fn parse_decimal(&mut self) -> Result<&'a str, ParseError> {
        let start = self.i;
        let mut seen_point = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else if c == '.' && !seen_point {
                seen_point = true;
                self.i += 1;
            } else {
                break;
            }
        }
        let s = &self.s[start..self.i];
        if s.is_empty() || s == "." {
            self.i = start;
            return Err(ParseError::InvalidSyntax("number expected".into()));
        }
        Ok(s)
    }

    /// Balanced `{...}` group; returns the inner text.
    pub fn parse_braced(&mut self) -> Result<&'a str, ParseError> {
        self.skip_ws();
        self.expect('{')?;
        let start = self.i;
        let mut depth = 1usize;
        while let Some(c) = self.peek_char() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.s[start..self.i];
                        self.i += 1;
                        return Ok(inner);
                    }
                }
                _ => {}
            }
            self.i += c.len_utf8();
        }
        Err(ParseError::InvalidSyntax("unterminated `{` group".into()))
    }

    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(ParseError::InvalidSyntax(format!("expected '{}'", c)))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            self.i += lit.len();
            true
        } else {
            false
        }
    }

    /// Consumes `word` if the letter run at the cursor is exactly `word`.
    pub fn consume_keyword(&mut self, word: &str) -> bool {
        if self.peek_word().eq_ignore_ascii_case(word) {
            self.i += word.len();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_stops_at_second_point() {
        let mut p = Parser::new("1.5.2");
        assert_eq!(p.parse_decimal().unwrap(), "1.5");
        assert_eq!(p.rest(), ".2");
    }

    #[test]
    fn control_sequence_allows_at() {
        let mut p = Parser::new("\\c@page+1");
        assert_eq!(p.parse_control_sequence().unwrap(), "c@page");
        assert!(p.consume_char('+'));
    }

    #[test]
    fn braced_group_nests() {
        let mut p = Parser::new(" {a{b}c}d");
        assert_eq!(p.parse_braced().unwrap(), "a{b}c");
        assert_eq!(p.rest(), "d");
    }

    #[test]
    fn keyword_requires_whole_word() {
        let mut p = Parser::new("plusx");
        assert!(!p.consume_keyword("plus"));
        let mut p = Parser::new("plus 1pt");
        assert!(p.consume_keyword("plus"));
    }
}
