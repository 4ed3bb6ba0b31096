//! Abstract Syntax Tree (AST) for filter expressions.

use std::fmt;

use crate::value::Value;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `!` boolean negation of the operand's truthiness.
    Not,
    /// `-` numeric negation.
    Minus,
    /// `+` numeric conversion.
    Plus,
}

impl UnaryOperator {
    /// The source spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // ==================== Arithmetic ====================
    Add,
    Subtract,
    Multiply,
    Divide,

    // ==================== Comparison ====================
    /// Loose equality (`==`, also written `=`).
    Eq,
    /// Strict equality (`===`).
    StrictEq,
    /// Loose inequality (`!=`).
    NotEq,
    /// Strict inequality (`!==`).
    StrictNotEq,
    Gt,
    Lt,
    Gte,
    Lte,

    // ==================== Text ====================
    Contains,
    StartsWith,
    EndsWith,

    // ==================== Logical ====================
    And,
    Or,
}

impl BinaryOperator {
    /// The source spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Eq => "==",
            BinaryOperator::StrictEq => "===",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::StrictNotEq => "!==",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gte => ">=",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Contains => "contains",
            BinaryOperator::StartsWith => "startsWith",
            BinaryOperator::EndsWith => "endsWith",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    /// Returns true for `&&` and `||`.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Returns true for `+ - * /`.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }
}

/// A parsed filter expression.
///
/// Trees are built bottom-up by the parser (or by hand through the
/// constructor helpers) and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant.
    Literal(Value),

    /// A reference to a record attribute.
    Identifier(String),

    /// A unary operation.
    Unary {
        operator: UnaryOperator,
        argument: Box<Expr>,
    },

    /// A binary operation.
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// A call to a function registered in the evaluation scope.
    Call { callee: String, arguments: Vec<Expr> },
}

impl Expr {
    /// The expression an empty filter parses to: always true.
    pub fn always() -> Self {
        Expr::Literal(Value::Bool(true))
    }

    /// Returns true if this is the constant produced by [`Expr::always`].
    pub fn is_always(&self) -> bool {
        matches!(self, Expr::Literal(Value::Bool(true)))
    }

    /// Creates a literal node.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates an identifier node.
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    /// Creates a binary node.
    pub fn binary(operator: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a unary node.
    pub fn unary(operator: UnaryOperator, argument: Expr) -> Self {
        Expr::Unary {
            operator,
            argument: Box::new(argument),
        }
    }

    /// Creates a logical AND.
    ///
    /// # Example
    ///
    /// ```
    /// use grid_filter_rs::filter::{BinaryOperator, Expr};
    ///
    /// let expr = Expr::and(Expr::ident("a"), Expr::ident("b"));
    /// assert!(matches!(expr, Expr::Binary { operator: BinaryOperator::And, .. }));
    /// ```
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::binary(BinaryOperator::And, left, right)
    }

    /// Creates a logical OR.
    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::binary(BinaryOperator::Or, left, right)
    }

    /// Creates a logical NOT.
    pub fn negate(inner: Expr) -> Self {
        Expr::unary(UnaryOperator::Not, inner)
    }

    /// Collects every identifier referenced by the expression, in order of
    /// first appearance.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Identifier(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Unary { argument, .. } => argument.collect_identifiers(names),
            Expr::Binary { left, right, .. } => {
                left.collect_identifiers(names);
                right.collect_identifiers(names);
            }
            Expr::Call { arguments, .. } => {
                for arg in arguments {
                    arg.collect_identifiers(names);
                }
            }
        }
    }
}

/// Canonical source form.
///
/// Logical and arithmetic operations are always parenthesized, so printing a
/// parsed expression and parsing it again yields the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => f.write_str(&value.to_literal()),
            Expr::Identifier(name) => f.write_str(name),
            Expr::Unary { operator, argument } => write!(f, "{}{}", operator.symbol(), argument),
            Expr::Binary {
                operator,
                left,
                right,
            } => {
                if operator.is_logical() || operator.is_arithmetic() {
                    write!(f, "({} {} {})", left, operator.symbol(), right)
                } else {
                    write!(f, "{} {} {}", left, operator.symbol(), right)
                }
            }
            Expr::Call { callee, arguments } => {
                write!(f, "{callee}(")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
