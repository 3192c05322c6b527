//! Diagnostic tokenizer behind the `tokens` command and the `/tokenize` route.
//!
//! Translation never goes through this lexer. Unknown characters become
//! [`TokenKind::Error`] tokens instead of failing the whole input.

pub mod error;

use std::{iter::Peekable, str::CharIndices};

use crate::token::{KEYWORDS, Span, Token, TokenKind, TokenRecord};

pub use error::{LexError, LexResult};

const OPERATOR_CHARS: &str = "+-*/=<>!%&|^~@";
const DELIMITER_CHARS: &str = "()[]{},;:.";
const STRING_PREFIXES: &[&str] = &["r", "u", "f", "b", "br", "rb", "fr", "rf"];

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    indent_stack: Vec<usize>,
    pending_tokens: Vec<Token<'a>>,
    at_line_start: bool,
    eof_reached: bool,
    exhausted: bool,
    bracket_depth: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            indent_stack: vec![0],
            pending_tokens: Vec::new(),
            at_line_start: true,
            eof_reached: false,
            exhausted: false,
            bracket_depth: 0,
            line: 1,
            column: 0,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        if let Some(token) = self.pending_tokens.pop() {
            return Ok(token);
        }

        if self.eof_reached {
            return Ok(self.marker(TokenKind::EOF));
        }

        if self.at_line_start {
            self.at_line_start = false;
            if let Some(token) = self.indentation()? {
                return Ok(token);
            }
        }

        self.skip_insignificant();

        let Some(&(start, ch)) = self.chars.peek() else {
            return Ok(self.finish());
        };

        let line = self.line;
        let column = self.column;
        match ch {
            '\n' => {
                self.advance_char();
                self.at_line_start = true;
                Ok(self.token(TokenKind::Newline, start, line, column))
            }
            '"' | '\'' => self.read_string(start, line, column),
            '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                Ok(self.read_number(start, line, column))
            }
            c if DELIMITER_CHARS.contains(c) => {
                self.advance_char();
                match c {
                    '(' | '[' | '{' => self.bracket_depth += 1,
                    ')' | ']' | '}' => self.bracket_depth = self.bracket_depth.saturating_sub(1),
                    _ => {}
                }
                Ok(self.token(TokenKind::Delimiter, start, line, column))
            }
            c if OPERATOR_CHARS.contains(c) => {
                while self
                    .chars
                    .peek()
                    .is_some_and(|&(_, c)| OPERATOR_CHARS.contains(c))
                {
                    self.advance_char();
                }
                Ok(self.token(TokenKind::Operator, start, line, column))
            }
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start, line, column),
            c if c.is_ascii_digit() => Ok(self.read_number(start, line, column)),
            _ => {
                self.advance_char();
                Ok(self.token(TokenKind::Error, start, line, column))
            }
        }
    }

    /// Measures the indentation of the next logical line, skipping blank and
    /// comment-only lines entirely.
    fn indentation(&mut self) -> LexResult<Option<Token<'a>>> {
        let width = loop {
            let mut lookahead = self.chars.clone();
            let mut width = 0;
            let mut saw_tab = false;
            while let Some(&(_, c)) = lookahead.peek() {
                match c {
                    ' ' => width += 1,
                    '\t' => saw_tab = true,
                    _ => break,
                }
                lookahead.next();
            }

            match lookahead.peek() {
                None => return Ok(None),
                Some(&(_, '\n' | '\r' | '#')) => self.skip_line(),
                Some(_) if saw_tab => return Err(LexError::TabIndentation { line: self.line }),
                Some(_) => {
                    for _ in 0..width {
                        self.advance_char();
                    }
                    break width;
                }
            }
        };

        let current_indent = self.indent_stack.last().copied().unwrap_or(0);
        if width > current_indent {
            self.indent_stack.push(width);
            return Ok(Some(self.marker(TokenKind::Indent)));
        }
        if width < current_indent {
            while self.indent_stack.last().is_some_and(|&top| top > width) {
                self.indent_stack.pop();
                let dedent = self.marker(TokenKind::Dedent);
                self.pending_tokens.push(dedent);
            }
            if self.indent_stack.last().copied().unwrap_or(0) != width {
                return Err(LexError::InvalidDedent {
                    indent_level: width,
                    line: self.line,
                });
            }
            return Ok(self.pending_tokens.pop());
        }
        Ok(None)
    }

    fn skip_line(&mut self) {
        while let Some((_, c)) = self.advance_char() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Spaces, comments, explicit line continuations, and newlines inside
    /// brackets.
    fn skip_insignificant(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance_char();
                }
                '\n' if self.bracket_depth > 0 => {
                    self.advance_char();
                }
                '#' => {
                    while self.chars.peek().is_some_and(|&(_, c)| c != '\n') {
                        self.advance_char();
                    }
                }
                '\\' if self.peek_second() == Some('\n') => {
                    self.advance_char();
                    self.advance_char();
                }
                _ => break,
            }
        }
    }

    fn finish(&mut self) -> Token<'a> {
        self.eof_reached = true;
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            let dedent = self.marker(TokenKind::Dedent);
            self.pending_tokens.push(dedent);
        }
        match self.pending_tokens.pop() {
            Some(token) => token,
            None => self.marker(TokenKind::EOF),
        }
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token<'a>> {
        self.advance_char();
        while self
            .chars
            .peek()
            .is_some_and(|&(_, c)| c.is_alphanumeric() || c == '_')
        {
            self.advance_char();
        }

        let end = self.current_index();
        let input = self.input;
        let word = input.get(start..end).unwrap_or_default();
        let quoted = self
            .chars
            .peek()
            .is_some_and(|&(_, c)| c == '"' || c == '\'');
        if quoted && STRING_PREFIXES.contains(&word.to_ascii_lowercase().as_str()) {
            return self.read_string(start, line, column);
        }

        let kind = if KEYWORDS.contains(&word) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Ok(self.token(kind, start, line, column))
    }

    fn read_number(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        let mut previous = '\0';
        while let Some(&(_, c)) = self.chars.peek() {
            let exponent_sign =
                matches!(c, '+' | '-') && matches!(previous, 'e' | 'E') && !self.is_hex(start);
            if c.is_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                previous = c;
                self.advance_char();
            } else {
                break;
            }
        }
        self.token(TokenKind::Number, start, line, column)
    }

    fn is_hex(&self, start: usize) -> bool {
        self.input
            .get(start..)
            .is_some_and(|rest| rest.starts_with("0x") || rest.starts_with("0X"))
    }

    /// Reads a quoted literal starting at the opening quote. `start` may point
    /// at an already consumed prefix such as `f` or `rb`.
    fn read_string(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token<'a>> {
        let unterminated = LexError::UnterminatedString { line, column };
        let Some((_, quote)) = self.advance_char() else {
            return Err(unterminated);
        };
        let triple = {
            let mut lookahead = self.chars.clone();
            lookahead.next().is_some_and(|(_, c)| c == quote)
                && lookahead.next().is_some_and(|(_, c)| c == quote)
        };
        if triple {
            self.advance_char();
            self.advance_char();
        }

        let mut closing_run = 0;
        while let Some((_, c)) = self.advance_char() {
            match c {
                '\\' => {
                    closing_run = 0;
                    self.advance_char();
                }
                c if c == quote => {
                    closing_run += 1;
                    if !triple || closing_run == 3 {
                        return Ok(self.token(TokenKind::String, start, line, column));
                    }
                }
                '\n' if !triple => return Err(unterminated),
                _ => closing_run = 0,
            }
        }
        Err(unterminated)
    }

    fn token(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token<'a> {
        let end = self.current_index();
        let input = self.input;
        Token::new(
            kind,
            input.get(start..end).unwrap_or_default(),
            Span {
                start,
                end,
                line,
                column,
            },
        )
    }

    /// Zero-width token at the current position.
    fn marker(&mut self, kind: TokenKind) -> Token<'a> {
        let index = self.current_index();
        Token::new(
            kind,
            "",
            Span {
                start: index,
                end: index,
                line: self.line,
                column: self.column,
            },
        )
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek_second(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next().map(|(_, c)| c)
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let token = self.next_token();
        self.exhausted = token
            .as_ref()
            .map_or(true, |token| token.kind == TokenKind::EOF);
        Some(token)
    }
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::EOF;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

/// Token stream in its serialisable form.
pub fn token_records(input: &str) -> LexResult<Vec<TokenRecord>> {
    Ok(tokenize(input)?.iter().map(Token::record).collect())
}
