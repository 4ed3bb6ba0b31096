//! Recursive descent parser for filter expressions.

use crate::field::{FieldRegistry, FieldType};
use crate::value::Value;

use super::ast::{BinaryOperator, Expr};
use super::coerce::coerce;
use super::error::{FilterError, FilterResult};
use super::lexer::{CompareOp, FilterToken, Lexer, LexerError, PositionedToken};

/// Minimum number of tokens in a non-empty expression (`field op value`).
const MIN_TOKENS: usize = 3;

/// Parser for filter expressions over a field catalog.
///
/// # Grammar
///
/// ```text
/// expression ::= or_expr
/// or_expr    ::= and_expr ("||" and_expr)*
/// and_expr   ::= comparison ("&&" comparison)*
/// comparison ::= "!" comparison | "(" expression ")" | operand comp_op operand
/// operand    ::= identifier | literal | call
/// call       ::= identifier "(" (operand ("," operand)*)? ")"
/// comp_op    ::= "=" | "==" | "===" | "!=" | "!==" | ">" | "<" | ">=" | "<="
///              | "contains" | "startsWith" | "endsWith"
/// literal    ::= number | "true" | "false" | quoted_string | bare_word
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. comparison operators
/// 2. `!` (NOT), applied to a whole comparison
/// 3. `&&` (AND), left-associative
/// 4. `||` (OR), left-associative
///
/// # Name resolution
///
/// A bare word on the left of a comparison must be a catalog field. On the
/// right it is a field if the catalog declares it, and a bare string literal
/// otherwise. Literals compared against a field are coerced to the field's
/// declared type, and the operator must be applicable to that type.
///
/// # Example
///
/// ```
/// use grid_filter_rs::field::{FieldRegistry, FieldType, FilterField};
/// use grid_filter_rs::filter::{BinaryOperator, Expr, FilterParser};
///
/// let fields = FieldRegistry::new([
///     FilterField::new("qualityFraction", FieldType::Number),
///     FilterField::new("interruptions", FieldType::Number),
/// ]);
///
/// let expr = FilterParser::parse("qualityFraction > 0.8 && interruptions < 3", &fields).unwrap();
/// assert!(matches!(expr, Expr::Binary { operator: BinaryOperator::And, .. }));
///
/// // Empty expressions match everything
/// assert!(FilterParser::parse("   ", &fields).unwrap().is_always());
/// ```
pub struct FilterParser<'a> {
    tokens: Vec<PositionedToken>,
    position: usize,
    fields: &'a FieldRegistry,
    input_len: usize,
}

/// An operand before the comparison around it has been type-checked.
struct Operand {
    kind: OperandKind,
    position: usize,
}

enum OperandKind {
    Field { name: String, field_type: FieldType },
    Literal { raw: String, quoted: bool },
    Call(Expr),
}

/// Which side of a comparison an operand appears on.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Argument,
}

impl<'a> FilterParser<'a> {
    /// Parses an expression string into an [`Expr`] tree.
    ///
    /// An empty or whitespace-only expression parses to [`Expr::always`].
    ///
    /// # Errors
    ///
    /// - [`FilterError::Parse`] for malformed syntax, including expressions of
    ///   fewer than three tokens.
    /// - [`FilterError::UnknownField`] when the left side of a comparison is
    ///   not a catalog field.
    /// - [`FilterError::TypeMismatch`] when an operator does not apply to the
    ///   field's type, or two fields of different types are compared.
    /// - [`FilterError::Coercion`] when a literal cannot become the field's type.
    pub fn parse(input: &str, fields: &'a FieldRegistry) -> FilterResult<Expr> {
        if input.trim().is_empty() {
            return Ok(Expr::always());
        }

        let lexed = Lexer::new(input).tokenize_with_errors();
        if let Some(error) = lexed.errors.first() {
            return Err(lexer_error(error));
        }

        if lexed.tokens.len() < MIN_TOKENS {
            // Non-empty input always yields at least one token here.
            let last = lexed.tokens.last().map(|t| (t.token.to_string(), t.position));
            let (token, position) = last.unwrap_or_default();
            return Err(FilterError::parse(
                format!("incomplete expression near '{token}'"),
                position,
            ));
        }

        let mut parser = Self {
            tokens: lexed.tokens,
            position: 0,
            fields,
            input_len: input.len(),
        };
        let expr = parser.parse_expression()?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.peek_positioned() {
            return Err(FilterError::parse(
                format!("unexpected token '{}'", remaining.token),
                remaining.position,
            ));
        }

        Ok(expr)
    }

    fn peek(&self) -> Option<&FilterToken> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    fn peek_positioned(&self) -> Option<&PositionedToken> {
        self.tokens.get(self.position)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<PositionedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn check(&self, expected: &FilterToken) -> bool {
        self.peek() == Some(expected)
    }

    /// Position to report when the input ends unexpectedly.
    fn end_position(&self) -> usize {
        self.input_len
    }

    fn unexpected_end(&self) -> FilterError {
        FilterError::parse("unexpected end of expression", self.end_position())
    }

    fn parse_expression(&mut self) -> FilterResult<Expr> {
        self.parse_or_expr()
    }

    /// Parses OR expressions: `and_expr ("||" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Expr> {
        let mut left = self.parse_and_expr()?;

        while self.check(&FilterToken::Or) {
            self.advance(); // consume '||'
            let right = self.parse_and_expr()?;
            left = Expr::or(left, right);
        }

        Ok(left)
    }

    /// Parses AND expressions: `comparison ("&&" comparison)*`
    fn parse_and_expr(&mut self) -> FilterResult<Expr> {
        let mut left = self.parse_comparison()?;

        while self.check(&FilterToken::And) {
            self.advance(); // consume '&&'
            let right = self.parse_comparison()?;
            left = Expr::and(left, right);
        }

        Ok(left)
    }

    /// Parses `"!" comparison | "(" expression ")" | operand comp_op operand`.
    fn parse_comparison(&mut self) -> FilterResult<Expr> {
        let Some(next) = self.peek_positioned().cloned() else {
            return Err(self.unexpected_end());
        };

        match next.token {
            FilterToken::Not => {
                self.advance(); // consume '!'
                let inner = self.parse_comparison()?;
                Ok(Expr::negate(inner))
            }
            FilterToken::OpenParen => {
                self.advance(); // consume '('
                let inner = self.parse_expression()?;
                if !self.check(&FilterToken::CloseParen) {
                    return Err(FilterError::parse("unclosed parenthesis", next.position));
                }
                self.advance(); // consume ')'
                Ok(inner)
            }
            _ => {
                let left = self.parse_operand(Side::Left)?;
                let op_token = self.advance().ok_or_else(|| self.unexpected_end())?;
                let FilterToken::Compare(op) = op_token.token else {
                    return Err(FilterError::parse(
                        format!("expected a comparison operator, found '{}'", op_token.token),
                        op_token.position,
                    ));
                };
                let right = self.parse_operand(Side::Right)?;
                self.build_comparison(left, op, op_token.position, right)
            }
        }
    }

    /// Parses a single operand.
    fn parse_operand(&mut self, side: Side) -> FilterResult<Operand> {
        let token = self.advance().ok_or_else(|| self.unexpected_end())?;
        let position = token.position;

        let kind = match token.token {
            FilterToken::Quoted(s) => OperandKind::Literal {
                raw: s,
                quoted: true,
            },
            FilterToken::Word(word) => {
                if self.check(&FilterToken::OpenParen) {
                    OperandKind::Call(self.parse_call(word)?)
                } else if let Some(field_type) = self.fields.field_type(&word) {
                    OperandKind::Field {
                        name: word,
                        field_type,
                    }
                } else if side == Side::Left && !is_self_typed(&word) {
                    return Err(FilterError::UnknownField {
                        suggestion: self.fields.suggest(&word),
                        name: word,
                        position: Some(position),
                    });
                } else {
                    OperandKind::Literal {
                        raw: word,
                        quoted: false,
                    }
                }
            }
            other => {
                return Err(FilterError::parse(
                    format!("unexpected token '{other}'"),
                    position,
                ))
            }
        };

        Ok(Operand { kind, position })
    }

    /// Parses the argument list of a call whose callee was just consumed.
    fn parse_call(&mut self, callee: String) -> FilterResult<Expr> {
        let open = self.advance().ok_or_else(|| self.unexpected_end())?; // consume '('
        let mut arguments = Vec::new();

        if self.check(&FilterToken::CloseParen) {
            self.advance();
            return Ok(Expr::Call { callee, arguments });
        }

        loop {
            let arg = self.parse_operand(Side::Argument)?;
            arguments.push(operand_to_expr(arg)?);

            match self.advance() {
                Some(PositionedToken {
                    token: FilterToken::Comma,
                    ..
                }) => continue,
                Some(PositionedToken {
                    token: FilterToken::CloseParen,
                    ..
                }) => break,
                Some(other) => {
                    return Err(FilterError::parse(
                        format!("expected ',' or ')', found '{}'", other.token),
                        other.position,
                    ))
                }
                None => return Err(FilterError::parse("unclosed parenthesis", open.position)),
            }
        }

        Ok(Expr::Call { callee, arguments })
    }

    /// Type-checks a comparison and lowers it into an [`Expr`].
    fn build_comparison(
        &self,
        left: Operand,
        op: CompareOp,
        op_position: usize,
        right: Operand,
    ) -> FilterResult<Expr> {
        let operator = binary_operator(op);

        let (left_expr, right_expr) = match (left.kind, right.kind) {
            (
                OperandKind::Field {
                    name: left_name,
                    field_type: left_type,
                },
                OperandKind::Field {
                    name: right_name,
                    field_type: right_type,
                },
            ) => {
                if left_type != right_type {
                    return Err(FilterError::type_mismatch_at(
                        format!(
                            "cannot compare {left_type} field '{left_name}' with {right_type} field '{right_name}'"
                        ),
                        right.position,
                    ));
                }
                check_applicable(op, op_position, &left_name, left_type)?;
                (Expr::Identifier(left_name), Expr::Identifier(right_name))
            }
            (OperandKind::Field { name, field_type }, OperandKind::Literal { raw, quoted }) => {
                check_applicable(op, op_position, &name, field_type)?;
                let value = coerce_literal(&raw, quoted, field_type, right.position)?;
                (Expr::Identifier(name), Expr::Literal(value))
            }
            (OperandKind::Literal { raw, quoted }, OperandKind::Field { name, field_type }) => {
                check_applicable(op, op_position, &name, field_type)?;
                let value = coerce_literal(&raw, quoted, field_type, left.position)?;
                (Expr::Literal(value), Expr::Identifier(name))
            }
            (OperandKind::Field { name, field_type }, other) => {
                check_applicable(op, op_position, &name, field_type)?;
                (Expr::Identifier(name), operand_kind_to_expr(other)?)
            }
            (other, OperandKind::Field { name, field_type }) => {
                check_applicable(op, op_position, &name, field_type)?;
                (operand_kind_to_expr(other)?, Expr::Identifier(name))
            }
            (left_kind, right_kind) => (
                operand_kind_to_expr(left_kind)?,
                operand_kind_to_expr(right_kind)?,
            ),
        };

        Ok(Expr::binary(operator, left_expr, right_expr))
    }
}

/// Returns true for bare words whose type is evident without a field:
/// numbers and booleans.
fn is_self_typed(word: &str) -> bool {
    infer_literal(word) != Value::String(word.to_string())
}

/// Infers the value of a bare word that is not compared against a field.
fn infer_literal(word: &str) -> Value {
    match word.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    match word.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::String(word.to_string()),
    }
}

fn operand_to_expr(operand: Operand) -> FilterResult<Expr> {
    operand_kind_to_expr(operand.kind)
}

fn operand_kind_to_expr(kind: OperandKind) -> FilterResult<Expr> {
    Ok(match kind {
        OperandKind::Field { name, .. } => Expr::Identifier(name),
        OperandKind::Literal { raw, quoted: true } => Expr::Literal(Value::String(raw)),
        OperandKind::Literal { raw, quoted: false } => Expr::Literal(infer_literal(&raw)),
        OperandKind::Call(expr) => expr,
    })
}

/// Converts a literal compared against a field into the field's type.
///
/// Quoted text is already unescaped by the lexer and is taken verbatim for
/// string fields.
fn coerce_literal(
    raw: &str,
    quoted: bool,
    field_type: FieldType,
    position: usize,
) -> FilterResult<Value> {
    if quoted && field_type == FieldType::String {
        return Ok(Value::String(raw.to_string()));
    }
    coerce(raw, field_type).map_err(|e| e.with_position(position))
}

fn check_applicable(
    op: CompareOp,
    op_position: usize,
    field: &str,
    field_type: FieldType,
) -> FilterResult<()> {
    if op.filter_operator().applies_to(field_type) {
        Ok(())
    } else {
        Err(FilterError::type_mismatch_at(
            format!(
                "'{}' is not valid for {} field '{}'",
                op.symbol(),
                field_type,
                field
            ),
            op_position,
        ))
    }
}

fn binary_operator(op: CompareOp) -> BinaryOperator {
    match op {
        CompareOp::Assign | CompareOp::Eq => BinaryOperator::Eq,
        CompareOp::StrictEq => BinaryOperator::StrictEq,
        CompareOp::NotEq => BinaryOperator::NotEq,
        CompareOp::StrictNotEq => BinaryOperator::StrictNotEq,
        CompareOp::Gt => BinaryOperator::Gt,
        CompareOp::Lt => BinaryOperator::Lt,
        CompareOp::Gte => BinaryOperator::Gte,
        CompareOp::Lte => BinaryOperator::Lte,
        CompareOp::Contains => BinaryOperator::Contains,
        CompareOp::StartsWith => BinaryOperator::StartsWith,
        CompareOp::EndsWith => BinaryOperator::EndsWith,
    }
}

fn lexer_error(error: &LexerError) -> FilterError {
    let message = match error {
        LexerError::UnexpectedChar { character, .. } => {
            format!("unexpected character '{character}'")
        }
        LexerError::UnterminatedString { .. } => "unterminated string".to_string(),
    };
    FilterError::parse(message, error.position())
}

