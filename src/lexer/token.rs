use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("and", TokenKind::KeywordAnd);
    map.insert("break", TokenKind::KeywordBreak);
    map.insert("continue", TokenKind::KeywordContinue);
    map.insert("def", TokenKind::KeywordDef);
    map.insert("del", TokenKind::KeywordDel);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("elsif", TokenKind::KeywordElsif);
    map.insert("end", TokenKind::KeywordEnd);
    map.insert("False", TokenKind::KeywordFalse);
    map.insert("for", TokenKind::KeywordFor);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("in", TokenKind::KeywordIn);
    map.insert("None", TokenKind::KeywordNone);
    map.insert("not", TokenKind::KeywordNot);
    map.insert("or", TokenKind::KeywordOr);
    map.insert("pass", TokenKind::KeywordPass);
    map.insert("print", TokenKind::KeywordPrint);
    map.insert("record", TokenKind::KeywordRecord);
    map.insert("return", TokenKind::KeywordReturn);
    map.insert("True", TokenKind::KeywordTrue);
    map.insert("while", TokenKind::KeywordWhile);
    map
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: u32,
    /// The length of the token in bytes.
    pub length: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            length: end.saturating_sub(start) as u32,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn merge(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            length: end - start,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Brackets
    LeftParenthesis,
    RightParenthesis,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    // Separators
    Comma,
    Dot,
    Colon,
    Semicolon,
    Newline,
    // Arithmetic
    Minus,
    Plus,
    Star,
    Slash,
    Percent,
    // Assignment and comparison
    Equal,
    PlusEqual,
    MinusEqual,
    EqualEqual,
    BangEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,

    // Literals
    NumericLiteral,
    StringLiteral,
    Ident,

    // Keywords
    KeywordAnd,
    KeywordBreak,
    KeywordContinue,
    KeywordDef,
    KeywordDel,
    KeywordElse,
    KeywordElsif,
    KeywordEnd,
    KeywordFalse,
    KeywordFor,
    KeywordIf,
    KeywordIn,
    KeywordNone,
    KeywordNot,
    KeywordOr,
    KeywordPass,
    KeywordPrint,
    KeywordRecord,
    KeywordReturn,
    KeywordTrue,
    KeywordWhile,

    // End of file.
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::LeftParenthesis => "LEFT_PAREN",
            TokenKind::RightParenthesis => "RIGHT_PAREN",
            TokenKind::LeftBracket => "LEFT_BRACKET",
            TokenKind::RightBracket => "RIGHT_BRACKET",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Minus => "MINUS",
            TokenKind::Plus => "PLUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::Equal => "EQUAL",
            TokenKind::PlusEqual => "PLUS_EQUAL",
            TokenKind::MinusEqual => "MINUS_EQUAL",
            TokenKind::EqualEqual => "EQUAL_EQUAL",
            TokenKind::BangEqual => "BANG_EQUAL",
            TokenKind::LessThan => "LESS",
            TokenKind::LessThanEqual => "LESS_EQUAL",
            TokenKind::GreaterThan => "GREATER",
            TokenKind::GreaterThanEqual => "GREATER_EQUAL",
            TokenKind::NumericLiteral => "NUMBER",
            TokenKind::StringLiteral => "STRING",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::KeywordAnd => "AND",
            TokenKind::KeywordBreak => "BREAK",
            TokenKind::KeywordContinue => "CONTINUE",
            TokenKind::KeywordDef => "DEF",
            TokenKind::KeywordDel => "DEL",
            TokenKind::KeywordElse => "ELSE",
            TokenKind::KeywordElsif => "ELSIF",
            TokenKind::KeywordEnd => "END",
            TokenKind::KeywordFalse => "FALSE",
            TokenKind::KeywordFor => "FOR",
            TokenKind::KeywordIf => "IF",
            TokenKind::KeywordIn => "IN",
            TokenKind::KeywordNone => "NONE",
            TokenKind::KeywordNot => "NOT",
            TokenKind::KeywordOr => "OR",
            TokenKind::KeywordPass => "PASS",
            TokenKind::KeywordPrint => "PRINT",
            TokenKind::KeywordRecord => "RECORD",
            TokenKind::KeywordReturn => "RETURN",
            TokenKind::KeywordTrue => "TRUE",
            TokenKind::KeywordWhile => "WHILE",
            TokenKind::Eof => "EOF",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
