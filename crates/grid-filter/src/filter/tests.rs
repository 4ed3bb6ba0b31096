//! Tests for the filter parser.

use super::*;
use crate::field::{FieldRegistry, FieldType, FilterField};
use crate::value::Value;
use chrono::{TimeZone, Utc};

// ==================== Test Helpers ====================

fn fields() -> FieldRegistry {
    FieldRegistry::new([
        FilterField::new("qualityFraction", FieldType::Number),
        FilterField::new("interruptions", FieldType::Number),
        FilterField::new("name", FieldType::String),
        FilterField::new("status", FieldType::String),
        FilterField::new("age", FieldType::Number),
        FilterField::new("score", FieldType::Number),
        FilterField::new("active", FieldType::Boolean),
        FilterField::new("startedAt", FieldType::Date),
    ])
}

fn parse(input: &str) -> FilterResult<Expr> {
    FilterParser::parse(input, &fields())
}

fn cmp(operator: BinaryOperator, field: &str, value: impl Into<Value>) -> Expr {
    Expr::binary(operator, Expr::ident(field), Expr::literal(value))
}

// ==================== Basic Parsing ====================

#[test]
fn test_parse_quality_and_interruptions() {
    let expr = parse("qualityFraction > 0.8 && interruptions < 3").unwrap();
    assert_eq!(
        expr,
        Expr::and(
            cmp(BinaryOperator::Gt, "qualityFraction", 0.8),
            cmp(BinaryOperator::Lt, "interruptions", 3.0),
        )
    );
}

#[test]
fn test_parse_empty_is_always_true() {
    assert!(parse("").unwrap().is_always());
    assert!(parse("  \t\n").unwrap().is_always());
}

#[test]
fn test_parse_all_comparison_operators() {
    let cases = [
        ("age = 3", BinaryOperator::Eq),
        ("age == 3", BinaryOperator::Eq),
        ("age === 3", BinaryOperator::StrictEq),
        ("age != 3", BinaryOperator::NotEq),
        ("age !== 3", BinaryOperator::StrictNotEq),
        ("age > 3", BinaryOperator::Gt),
        ("age < 3", BinaryOperator::Lt),
        ("age >= 3", BinaryOperator::Gte),
        ("age <= 3", BinaryOperator::Lte),
    ];
    for (input, operator) in cases {
        assert_eq!(parse(input).unwrap(), cmp(operator, "age", 3.0), "{input}");
    }
}

#[test]
fn test_parse_without_whitespace() {
    assert_eq!(
        parse("age>=3&&name=bob").unwrap(),
        Expr::and(
            cmp(BinaryOperator::Gte, "age", 3.0),
            cmp(BinaryOperator::Eq, "name", "bob"),
        )
    );
}

#[test]
fn test_parse_text_operators() {
    assert_eq!(
        parse("name contains smith").unwrap(),
        cmp(BinaryOperator::Contains, "name", "smith")
    );
    assert_eq!(
        parse("name startsWith 'Dr.'").unwrap(),
        cmp(BinaryOperator::StartsWith, "name", "Dr.")
    );
    assert_eq!(
        parse("name ENDSWITH \"son\"").unwrap(),
        cmp(BinaryOperator::EndsWith, "name", "son")
    );
}

#[test]
fn test_parse_quoted_string_with_spaces_and_escapes() {
    assert_eq!(
        parse(r#"status = "on \"hold\" now""#).unwrap(),
        cmp(BinaryOperator::Eq, "status", r#"on "hold" now"#)
    );
}

#[test]
fn test_parse_quoted_string_keeps_inner_quotes() {
    assert_eq!(
        parse(r#"name == "'x'""#).unwrap(),
        cmp(BinaryOperator::Eq, "name", "'x'")
    );
    assert_eq!(
        parse(r#"name = '"quoted"'"#).unwrap(),
        cmp(BinaryOperator::Eq, "name", "\"quoted\"")
    );
}

#[test]
fn test_parse_negative_number() {
    assert_eq!(
        parse("score > -2.5").unwrap(),
        cmp(BinaryOperator::Gt, "score", -2.5)
    );
}

#[test]
fn test_parse_literal_on_left() {
    assert_eq!(
        parse("3 < age").unwrap(),
        Expr::binary(BinaryOperator::Lt, Expr::literal(3.0), Expr::ident("age"))
    );
}

#[test]
fn test_parse_field_against_field() {
    assert_eq!(
        parse("age > score").unwrap(),
        Expr::binary(BinaryOperator::Gt, Expr::ident("age"), Expr::ident("score"))
    );
}

#[test]
fn test_parse_coerces_boolean_and_date_literals() {
    assert_eq!(
        parse("active === TRUE").unwrap(),
        cmp(BinaryOperator::StrictEq, "active", true)
    );
    let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(
        parse("startedAt >= 2024-01-01").unwrap(),
        cmp(BinaryOperator::Gte, "startedAt", date)
    );
}

#[test]
fn test_parse_number_field_keeps_string_digits_numeric() {
    // Quoted digits compared to a number field become a number
    assert_eq!(parse("age = \"42\"").unwrap(), cmp(BinaryOperator::Eq, "age", 42.0));
}

#[test]
fn test_parse_call() {
    assert_eq!(
        parse("len(name) > 3").unwrap(),
        Expr::binary(
            BinaryOperator::Gt,
            Expr::Call {
                callee: "len".to_string(),
                arguments: vec![Expr::ident("name")],
            },
            Expr::literal(3.0),
        )
    );
    assert_eq!(
        parse("between(age, 1, 5) == true").unwrap(),
        Expr::binary(
            BinaryOperator::Eq,
            Expr::Call {
                callee: "between".to_string(),
                arguments: vec![Expr::ident("age"), Expr::literal(1.0), Expr::literal(5.0)],
            },
            Expr::literal(true),
        )
    );
}

// ==================== Precedence and Grouping ====================

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(
        parse("age > 1 || score > 2 && active = true").unwrap(),
        Expr::or(
            cmp(BinaryOperator::Gt, "age", 1.0),
            Expr::and(
                cmp(BinaryOperator::Gt, "score", 2.0),
                cmp(BinaryOperator::Eq, "active", true),
            ),
        )
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        parse("(age > 1 || score > 2) && active = true").unwrap(),
        Expr::and(
            Expr::or(
                cmp(BinaryOperator::Gt, "age", 1.0),
                cmp(BinaryOperator::Gt, "score", 2.0),
            ),
            cmp(BinaryOperator::Eq, "active", true),
        )
    );
}

#[test]
fn test_and_is_left_associative() {
    assert_eq!(
        parse("age > 1 && age < 9 && score = 3").unwrap(),
        Expr::and(
            Expr::and(
                cmp(BinaryOperator::Gt, "age", 1.0),
                cmp(BinaryOperator::Lt, "age", 9.0),
            ),
            cmp(BinaryOperator::Eq, "score", 3.0),
        )
    );
}

#[test]
fn test_not_applies_to_comparison_and_group() {
    assert_eq!(
        parse("!age > 3").unwrap(),
        Expr::negate(cmp(BinaryOperator::Gt, "age", 3.0))
    );
    assert_eq!(
        parse("!(age > 3 || active = false)").unwrap(),
        Expr::negate(Expr::or(
            cmp(BinaryOperator::Gt, "age", 3.0),
            cmp(BinaryOperator::Eq, "active", false),
        ))
    );
}

// ==================== Round Trip ====================

#[test]
fn test_display_parses_back_to_same_tree() {
    let inputs = [
        "qualityFraction > 0.8 && interruptions < 3",
        "name contains \"o'neil\" || !(status = done && age >= -4)",
        "startedAt < 2024-03-01T12:30:00Z",
        "active !== false",
        "len(name, 2) > score",
        "name = 'say \"hi\"'",
    ];
    for input in inputs {
        let expr = parse(input).unwrap();
        let printed = expr.to_string();
        let reparsed = parse(&printed).unwrap_or_else(|e| panic!("{printed}: {e}"));
        assert_eq!(expr, reparsed, "{input} -> {printed}");
    }
}

// ==================== Error Tests ====================

#[test]
fn test_error_fewer_than_three_tokens() {
    let err = parse("age >").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "incomplete expression near '>'".to_string(),
            position: 4,
        }
    );
    assert_eq!(
        err.to_string(),
        "incomplete expression near '>' at position 4"
    );

    assert!(matches!(parse("status").unwrap_err(), FilterError::Parse { position: 0, .. }));
}

#[test]
fn test_error_unknown_field_with_suggestion() {
    let err = parse("statsu = open").unwrap_err();
    assert_eq!(
        err,
        FilterError::UnknownField {
            name: "statsu".to_string(),
            position: Some(0),
            suggestion: Some("status".to_string()),
        }
    );
    assert_eq!(
        err.to_string(),
        "unknown field 'statsu' (did you mean 'status'?)"
    );
}

#[test]
fn test_error_unknown_field_without_suggestion() {
    let err = parse("age > 1 && zzzzzzzz = 1").unwrap_err();
    assert_eq!(
        err,
        FilterError::UnknownField {
            name: "zzzzzzzz".to_string(),
            position: Some(11),
            suggestion: None,
        }
    );
}

#[test]
fn test_error_ordering_on_string_field() {
    let err = parse("name > 3").unwrap_err();
    assert_eq!(
        err,
        FilterError::TypeMismatch {
            message: "'>' is not valid for string field 'name'".to_string(),
            position: Some(5),
        }
    );
}

#[test]
fn test_error_text_operator_on_number_field() {
    let err = parse("age contains 3").unwrap_err();
    assert!(matches!(err, FilterError::TypeMismatch { position: Some(4), .. }));
}

#[test]
fn test_error_comparing_fields_of_different_types() {
    let err = parse("age = name").unwrap_err();
    assert!(matches!(err, FilterError::TypeMismatch { position: Some(6), .. }));
}

#[test]
fn test_error_coercion() {
    assert_eq!(
        parse("age > abc").unwrap_err(),
        FilterError::Coercion {
            raw: "abc".to_string(),
            expected: FieldType::Number,
            position: Some(6),
        }
    );
    assert_eq!(
        parse("active = maybe").unwrap_err(),
        FilterError::Coercion {
            raw: "maybe".to_string(),
            expected: FieldType::Boolean,
            position: Some(9),
        }
    );
    assert!(matches!(
        parse("startedAt > yesterday").unwrap_err(),
        FilterError::Coercion { expected: FieldType::Date, position: Some(12), .. }
    ));
}

#[test]
fn test_error_coercion_of_left_literal_points_at_literal() {
    let err = parse("\"abc\" < age").unwrap_err();
    assert_eq!(err.position(), Some(0));
    assert_eq!(err.kind(), "coercion");
}

#[test]
fn test_error_operator_not_valid_against_call() {
    let err = parse("name > len(age)").unwrap_err();
    assert!(matches!(err, FilterError::TypeMismatch { position: Some(5), .. }));

    let err = parse("len(age) <= name").unwrap_err();
    assert!(matches!(err, FilterError::TypeMismatch { position: Some(9), .. }));

    let err = parse("active contains f()").unwrap_err();
    assert!(matches!(err, FilterError::TypeMismatch { position: Some(7), .. }));

    assert!(parse("name contains upper(status)").is_ok());
    assert!(parse("age > len(name)").is_ok());
}

#[test]
fn test_error_trailing_operator() {
    let err = parse("age > 3 &&").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "unexpected end of expression".to_string(),
            position: 10,
        }
    );
}

#[test]
fn test_error_unclosed_parenthesis() {
    let err = parse("(age > 3").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "unclosed parenthesis".to_string(),
            position: 0,
        }
    );
}

#[test]
fn test_error_unexpected_close_paren() {
    let err = parse("age > 3 )").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "unexpected token ')'".to_string(),
            position: 8,
        }
    );
}

#[test]
fn test_error_missing_comparison_operator() {
    let err = parse("age 3 4").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "expected a comparison operator, found '3'".to_string(),
            position: 4,
        }
    );
}

#[test]
fn test_error_single_ampersand() {
    let err = parse("age = 3 & score = 1").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "unexpected character '&'".to_string(),
            position: 8,
        }
    );
}

#[test]
fn test_error_unterminated_string() {
    let err = parse("name = \"abc").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "unterminated string".to_string(),
            position: 7,
        }
    );
}

#[test]
fn test_error_bad_call_arguments() {
    let err = parse("len(name name) > 1").unwrap_err();
    assert_eq!(
        err,
        FilterError::Parse {
            message: "expected ',' or ')', found 'name'".to_string(),
            position: 9,
        }
    );
}

#[test]
fn test_error_kinds_and_positions() {
    assert_eq!(parse("age >").unwrap_err().kind(), "parse");
    assert_eq!(parse("agx > 1").unwrap_err().kind(), "unknown_field");
    assert_eq!(parse("name > 1").unwrap_err().position(), Some(5));
    assert_eq!(parse("age > x").unwrap_err().position(), None);
}
