//! Lexer (tokenizer) for filter expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::operator::FilterOperator;

/// Error encountered during lexical analysis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexerError {
    /// A character that cannot start any token.
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedChar {
        /// The character that could not be tokenized.
        character: char,
        /// The byte offset where the error occurred.
        position: usize,
    },

    /// A quoted string without its closing quote.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// The byte offset of the opening quote.
        position: usize,
    },
}

impl LexerError {
    /// The byte offset where the error occurred.
    pub fn position(&self) -> usize {
        match self {
            LexerError::UnexpectedChar { position, .. } => *position,
            LexerError::UnterminatedString { position } => *position,
        }
    }
}

/// Result of tokenizing a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LexerResult {
    /// The tokens successfully read, with their positions.
    pub tokens: Vec<PositionedToken>,
    /// Any errors encountered along the way.
    pub errors: Vec<LexerError>,
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    /// The token.
    pub token: FilterToken,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// Comparison operators as written in an expression.
///
/// `=` and `==` are the same loose equality; `===` / `!==` are the strict forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Assign,
    /// `==`
    Eq,
    /// `===`
    StrictEq,
    /// `!=`
    NotEq,
    /// `!==`
    StrictNotEq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `contains`
    Contains,
    /// `startsWith`
    StartsWith,
    /// `endsWith`
    EndsWith,
}

impl CompareOp {
    /// The source spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Assign => "=",
            CompareOp::Eq => "==",
            CompareOp::StrictEq => "===",
            CompareOp::NotEq => "!=",
            CompareOp::StrictNotEq => "!==",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
            CompareOp::Contains => "contains",
            CompareOp::StartsWith => "startsWith",
            CompareOp::EndsWith => "endsWith",
        }
    }

    /// The entry in the shared operator table this comparison is checked against.
    pub fn filter_operator(&self) -> FilterOperator {
        match self {
            CompareOp::Assign | CompareOp::Eq | CompareOp::StrictEq => FilterOperator::Equals,
            CompareOp::NotEq | CompareOp::StrictNotEq => FilterOperator::NotEquals,
            CompareOp::Gt => FilterOperator::Gt,
            CompareOp::Lt => FilterOperator::Lt,
            CompareOp::Gte => FilterOperator::Gte,
            CompareOp::Lte => FilterOperator::Lte,
            CompareOp::Contains => FilterOperator::Contains,
            CompareOp::StartsWith => FilterOperator::StartsWith,
            CompareOp::EndsWith => FilterOperator::EndsWith,
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "contains" => Some(CompareOp::Contains),
            "startswith" => Some(CompareOp::StartsWith),
            "endswith" => Some(CompareOp::EndsWith),
            _ => None,
        }
    }
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterToken {
    // ==================== Operands ====================
    /// An unquoted word: a field name, number, boolean or bare string.
    Word(String),

    /// A quoted string with escapes resolved.
    Quoted(String),

    // ==================== Operators ====================
    /// A comparison operator.
    Compare(CompareOp),

    /// The AND operator (`&&`).
    And,

    /// The OR operator (`||`).
    Or,

    /// The NOT operator (`!`).
    Not,

    // ==================== Punctuation ====================
    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,

    /// Argument separator `,`.
    Comma,
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterToken::Word(w) => f.write_str(w),
            FilterToken::Quoted(s) => write!(f, "\"{s}\""),
            FilterToken::Compare(op) => f.write_str(op.symbol()),
            FilterToken::And => f.write_str("&&"),
            FilterToken::Or => f.write_str("||"),
            FilterToken::Not => f.write_str("!"),
            FilterToken::OpenParen => f.write_str("("),
            FilterToken::CloseParen => f.write_str(")"),
            FilterToken::Comma => f.write_str(","),
        }
    }
}

/// Characters that end a bare word.
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '&' | '|' | '!' | '=' | '<' | '>' | '(' | ')' | ',' | '"' | '\'')
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
    /// Errors encountered during tokenization.
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    /// Consumes the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(&expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Reads a bare word up to the next delimiter.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            word.push(c);
            self.next_char();
        }
        word
    }

    /// Reads a quoted string (single or double quotes), resolving `\` escapes.
    ///
    /// Returns `None` if the closing quote is missing.
    fn read_quoted_string(&mut self, quote_char: char) -> Option<String> {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            if c == quote_char {
                return Some(result);
            }
            if c == '\\' {
                if let Some(escaped) = self.next_char() {
                    result.push(escaped);
                }
            } else {
                result.push(c);
            }
        }
        None
    }

    /// Returns the next token with its position, or None if at end of input.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        loop {
            self.skip_whitespace();

            let c = *self.peek()?;
            let start = self.position;

            let token = match c {
                '&' | '|' => {
                    self.next_char();
                    if self.eat(c) {
                        if c == '&' {
                            FilterToken::And
                        } else {
                            FilterToken::Or
                        }
                    } else {
                        // Single `&` / `|` is not part of the grammar.
                        self.errors.push(LexerError::UnexpectedChar {
                            character: c,
                            position: start,
                        });
                        continue;
                    }
                }
                '!' => {
                    self.next_char();
                    if self.eat('=') {
                        if self.eat('=') {
                            FilterToken::Compare(CompareOp::StrictNotEq)
                        } else {
                            FilterToken::Compare(CompareOp::NotEq)
                        }
                    } else {
                        FilterToken::Not
                    }
                }
                '=' => {
                    self.next_char();
                    if self.eat('=') {
                        if self.eat('=') {
                            FilterToken::Compare(CompareOp::StrictEq)
                        } else {
                            FilterToken::Compare(CompareOp::Eq)
                        }
                    } else {
                        FilterToken::Compare(CompareOp::Assign)
                    }
                }
                '>' => {
                    self.next_char();
                    if self.eat('=') {
                        FilterToken::Compare(CompareOp::Gte)
                    } else {
                        FilterToken::Compare(CompareOp::Gt)
                    }
                }
                '<' => {
                    self.next_char();
                    if self.eat('=') {
                        FilterToken::Compare(CompareOp::Lte)
                    } else {
                        FilterToken::Compare(CompareOp::Lt)
                    }
                }
                '(' => {
                    self.next_char();
                    FilterToken::OpenParen
                }
                ')' => {
                    self.next_char();
                    FilterToken::CloseParen
                }
                ',' => {
                    self.next_char();
                    FilterToken::Comma
                }
                '"' | '\'' => match self.read_quoted_string(c) {
                    Some(s) => FilterToken::Quoted(s),
                    None => {
                        self.errors
                            .push(LexerError::UnterminatedString { position: start });
                        return None;
                    }
                },
                _ => {
                    let word = self.read_word();
                    match CompareOp::from_word(&word) {
                        Some(op) => FilterToken::Compare(op),
                        None => FilterToken::Word(word),
                    }
                }
            };

            return Some(PositionedToken {
                token,
                position: start,
            });
        }
    }

    /// Collects all tokens into a vector (without positions).
    #[cfg(test)]
    pub fn tokenize(self) -> Vec<FilterToken> {
        self.tokenize_with_errors()
            .tokens
            .into_iter()
            .map(|pt| pt.token)
            .collect()
    }

    /// Collects all tokens and any errors encountered.
    pub fn tokenize_with_errors(mut self) -> LexerResult {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token() {
            tokens.push(positioned_token);
        }
        LexerResult {
            tokens,
            errors: self.errors,
        }
    }
}
