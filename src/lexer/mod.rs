mod cursor;
mod error;
pub mod formatter;
mod token;

use cursor::SourceChar;
pub use error::{LexicalError, LexicalErrorKind};
use std::{ops::Range, rc::Rc, str::Chars};
pub use token::{Span, Token, TokenKind, KEYWORD_HASHMAP};

#[derive(Debug, Clone)]
pub struct LineBreaks {
    line_breaks: Rc<[Range<usize>]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let line_breaks = if !text.is_empty() {
            let mut line_breaks = Vec::new();
            let mut cursor = 0;
            for (offset, byte) in text.bytes().enumerate() {
                let offset = offset + 1;
                if byte == b'\n' {
                    line_breaks.push(cursor..offset);
                    cursor = offset;
                }
            }
            if !text.ends_with('\n') {
                line_breaks.push(cursor..text.len() + 1);
            }
            line_breaks
        } else {
            vec![0..1]
        };
        Self {
            line_breaks: line_breaks.into(),
        }
    }

    pub fn get_max_line(&self) -> u32 {
        (self.line_breaks.len() + 1) as u32
    }

    pub fn get_line(&self, offset: usize) -> u32 {
        self.line_breaks
            .binary_search_by(|r| {
                if offset < r.start {
                    std::cmp::Ordering::Greater
                } else if offset >= r.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .map(|v| (v + 1) as u32)
            .unwrap_or(self.get_max_line())
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start as usize)
    }
}

#[derive(Debug)]
enum LookAhead {
    None,
    Single(SourceChar),
    Double(SourceChar, SourceChar),
}

/// Splits script source into tokens.
///
/// Newlines are significant because they terminate statements, except when
/// they appear inside parentheses or brackets.
#[derive(Debug)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: Chars<'src>,
    offset: usize,
    lookahead: LookAhead,
    line_breaks: LineBreaks,
    nesting: u32,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars(),
            offset: 0,
            lookahead: LookAhead::None,
            line_breaks: LineBreaks::new(source),
            nesting: 0,
            finished: false,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.source
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.line_breaks.clone()
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }
}

impl<'src> Lexer<'src> {
    fn next_char(&mut self) -> Option<SourceChar> {
        match self.lookahead {
            LookAhead::None => {
                let c = self.chars.next()?;
                let old_offset = self.offset;
                self.offset += c.len_utf8();
                Some(SourceChar {
                    value: c,
                    offset: old_offset,
                })
            }
            LookAhead::Single(lookahead) => {
                self.lookahead = LookAhead::None;
                Some(lookahead)
            }
            LookAhead::Double(first, second) => {
                self.lookahead = LookAhead::Single(second);
                Some(first)
            }
        }
    }

    fn put_back_char(&mut self, c: SourceChar) {
        self.lookahead = match self.lookahead {
            LookAhead::None => LookAhead::Single(c),
            LookAhead::Single(other) => LookAhead::Double(c, other),
            LookAhead::Double(..) => unreachable!("The lexer never looks ahead more than two characters."),
        };
    }

    fn put_back_two_chars(&mut self, first: SourceChar, second: SourceChar) {
        self.put_back_char(second);
        self.put_back_char(first);
    }

    fn eat_if(&mut self, expected: char) -> bool {
        match self.next_char() {
            Some(c) if c.value == expected => true,
            Some(c) => {
                self.put_back_char(c);
                false
            }
            None => false,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        loop {
            let Some(current) = self.next_char() else {
                self.finished = true;
                return Ok(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.source.len(), self.source.len()),
                });
            };
            let start = current.offset;
            let just = |kind: TokenKind, length: usize| {
                Ok(Token {
                    kind,
                    span: Span::new(start, start + length),
                })
            };

            return match current.value {
                '(' | '[' | '{' => {
                    self.nesting += 1;
                    just(
                        match current.value {
                            '(' => TokenKind::LeftParenthesis,
                            '[' => TokenKind::LeftBracket,
                            _ => TokenKind::LeftBrace,
                        },
                        1,
                    )
                }
                ')' | ']' | '}' => {
                    self.nesting = self.nesting.saturating_sub(1);
                    just(
                        match current.value {
                            ')' => TokenKind::RightParenthesis,
                            ']' => TokenKind::RightBracket,
                            _ => TokenKind::RightBrace,
                        },
                        1,
                    )
                }
                ',' => just(TokenKind::Comma, 1),
                '.' => just(TokenKind::Dot, 1),
                ':' => just(TokenKind::Colon, 1),
                ';' => just(TokenKind::Semicolon, 1),
                '*' => just(TokenKind::Star, 1),
                '/' => just(TokenKind::Slash, 1),
                '%' => just(TokenKind::Percent, 1),
                '+' => match self.eat_if('=') {
                    true => just(TokenKind::PlusEqual, 2),
                    false => just(TokenKind::Plus, 1),
                },
                '-' => match self.eat_if('=') {
                    true => just(TokenKind::MinusEqual, 2),
                    false => just(TokenKind::Minus, 1),
                },
                '=' => match self.eat_if('=') {
                    true => just(TokenKind::EqualEqual, 2),
                    false => just(TokenKind::Equal, 1),
                },
                '<' => match self.eat_if('=') {
                    true => just(TokenKind::LessThanEqual, 2),
                    false => just(TokenKind::LessThan, 1),
                },
                '>' => match self.eat_if('=') {
                    true => just(TokenKind::GreaterThanEqual, 2),
                    false => just(TokenKind::GreaterThan, 1),
                },
                '!' => match self.eat_if('=') {
                    true => just(TokenKind::BangEqual, 2),
                    false => Err(LexicalError {
                        kind: LexicalErrorKind::Unrecognized('!'),
                        span: Span::new(start, start + 1),
                    }),
                },
                '\n' => {
                    if self.nesting > 0 {
                        continue;
                    }
                    just(TokenKind::Newline, 1)
                }
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '"' | '\'' => self.lex_string(current),
                '0'..='9' => Ok(self.lex_number(current)),
                'a'..='z' | 'A'..='Z' | '_' => Ok(self.lex_ident_or_keyword(current)),
                c if c.is_whitespace() => continue,
                c => Err(LexicalError {
                    kind: LexicalErrorKind::Unrecognized(c),
                    span: Span::new(start, start + c.len_utf8()),
                }),
            };
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.next_char() {
            if c.value == '\n' {
                // The newline still terminates the statement.
                self.put_back_char(c);
                return;
            }
        }
    }

    fn lex_ident_or_keyword(&mut self, first: SourceChar) -> Token {
        let mut end = first.next_offset();
        while let Some(c) = self.next_char() {
            if c.value.is_ascii_alphanumeric() || c.value == '_' {
                end = c.next_offset();
            } else {
                self.put_back_char(c);
                break;
            }
        }
        let span = Span::new(first.offset, end);
        let lexeme = &self.source[span.range()];
        Token {
            kind: KEYWORD_HASHMAP
                .get(lexeme)
                .copied()
                .unwrap_or(TokenKind::Ident),
            span,
        }
    }

    fn lex_number(&mut self, first: SourceChar) -> Token {
        let mut end = first.next_offset();
        let mut seen_dot = false;
        while let Some(c) = self.next_char() {
            match c.value {
                '0'..='9' => end = c.next_offset(),
                '.' if !seen_dot => match self.next_char() {
                    Some(after) if after.value.is_ascii_digit() => {
                        seen_dot = true;
                        end = after.next_offset();
                    }
                    Some(after) => {
                        self.put_back_two_chars(c, after);
                        break;
                    }
                    None => {
                        self.put_back_char(c);
                        break;
                    }
                },
                _ => {
                    self.put_back_char(c);
                    break;
                }
            }
        }
        Token {
            kind: TokenKind::NumericLiteral,
            span: Span::new(first.offset, end),
        }
    }

    fn lex_string(&mut self, quote: SourceChar) -> Result<Token, LexicalError> {
        let mut escaped = false;
        while let Some(c) = self.next_char() {
            if escaped {
                escaped = false;
            } else if c.value == '\\' {
                escaped = true;
            } else if c.value == quote.value {
                return Ok(Token {
                    kind: TokenKind::StringLiteral,
                    span: Span::new(quote.offset, c.next_offset()),
                });
            }
        }
        Err(LexicalError {
            kind: LexicalErrorKind::UnclosedString,
            span: Span::new(quote.offset, self.source.len()),
        })
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

/// Resolves the escape sequences of a string literal lexeme (quotes included).
pub fn unescape(lexeme: &str) -> compact_str::CompactString {
    let inner = lexeme
        .get(1..lexeme.len().saturating_sub(1))
        .unwrap_or_default();
    let mut buffer = compact_str::CompactString::default();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            buffer.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => buffer.push('\n'),
            Some('t') => buffer.push('\t'),
            Some(other) => buffer.push(other),
            None => buffer.push('\\'),
        }
    }
    buffer
}
