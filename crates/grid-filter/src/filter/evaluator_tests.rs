//! Tests for filter evaluation.

use super::*;
use crate::field::{FieldRegistry, FieldType, FilterField};
use crate::value::Value;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

// ==================== Test Helpers ====================

fn eval(expr: &Expr, record: &serde_json::Value) -> FilterResult<Value> {
    evaluate(expr, &EvalContext::new(record))
}

fn eval_binary(operator: BinaryOperator, left: Value, right: Value) -> FilterResult<Value> {
    let expr = Expr::binary(operator, Expr::Literal(left), Expr::Literal(right));
    eval(&expr, &json!({}))
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn s(text: &str) -> Value {
    Value::String(text.to_string())
}

fn n(number: f64) -> Value {
    Value::Number(number)
}

fn assert_table(table: Vec<(BinaryOperator, Value, Value, bool)>) {
    for (operator, left, right, expected) in table {
        let result = eval_binary(operator, left.clone(), right.clone());
        assert_eq!(
            result,
            Ok(Value::Bool(expected)),
            "{left:?} {} {right:?}",
            operator.symbol()
        );
    }
}

// ==================== Truth Tables ====================

#[test]
fn test_equality_truth_table() {
    use BinaryOperator::*;
    assert_table(vec![
        (Eq, n(0.0), n(0.0), true),
        (Eq, n(0.0), s("0"), true),
        (Eq, n(0.0), s(""), true),
        (Eq, n(0.0), Value::Bool(false), true),
        (Eq, n(1.0), Value::Bool(true), true),
        (Eq, n(-3.5), s(" -3.5 "), true),
        (Eq, s("abc"), s("ABC"), false),
        (Eq, Value::Null, Value::Null, true),
        (Eq, Value::Null, n(0.0), false),
        (Eq, Value::Null, s(""), false),
        (Eq, n(f64::NAN), n(f64::NAN), false),
        (Eq, s("abc"), n(f64::NAN), false),
        (StrictEq, n(0.0), s("0"), false),
        (StrictEq, n(-1.0), n(-1.0), true),
        (StrictEq, Value::Bool(true), n(1.0), false),
        (StrictEq, n(f64::NAN), n(f64::NAN), false),
        (NotEq, s("a"), s("b"), true),
        (NotEq, n(0.0), s("0"), false),
        (StrictNotEq, n(1.0), Value::Bool(true), true),
        (StrictNotEq, s("x"), s("x"), false),
    ]);
}

#[test]
fn test_ordering_truth_table() {
    use BinaryOperator::*;
    assert_table(vec![
        (Gt, n(-1.0), n(0.0), false),
        (Lt, n(-1.0), n(0.0), true),
        (Gte, n(0.0), n(0.0), true),
        (Lte, n(0.0), n(-0.0), true),
        (Gt, n(0.0), n(-0.0), false),
        (Gt, s("10"), n(9.0), true),
        (Gt, s("b"), s("a"), true),
        (Lt, s("B"), s("a"), true),
        (Gt, Value::Bool(true), Value::Bool(false), true),
        (Gte, Value::Bool(true), n(1.0), true),
        // NaN-producing coercions are unordered
        (Gt, s("abc"), n(1.0), false),
        (Lt, s("abc"), n(1.0), false),
        (Gte, n(f64::NAN), n(f64::NAN), false),
        // null against non-booleans has no order
        (Gte, Value::Null, n(1.0), false),
        (Lte, Value::Null, n(1.0), false),
        (Lt, s("x"), Value::Null, false),
    ]);
}

#[test]
fn test_date_truth_table() {
    use BinaryOperator::*;
    let jan = Value::Date(day(2024, 1, 1));
    let feb = Value::Date(day(2024, 2, 1));
    assert_table(vec![
        (Eq, jan.clone(), jan.clone(), true),
        (StrictEq, jan.clone(), Value::Date(day(2024, 1, 1)), true),
        (Gte, jan.clone(), jan.clone(), true),
        (Gt, jan.clone(), jan.clone(), false),
        (Lt, jan.clone(), feb.clone(), true),
        (Eq, jan.clone(), s("2024-01-01"), true),
        (Lt, s("2024-01-15"), feb.clone(), true),
        (Gt, jan.clone(), s("not a date"), false),
        (Eq, jan.clone(), n(day(2024, 1, 1).timestamp_millis() as f64), true),
        (StrictEq, jan.clone(), s("2024-01-01"), false),
    ]);
}

#[test]
fn test_text_truth_table() {
    use BinaryOperator::*;
    assert_table(vec![
        (Contains, s("Hello"), s("ELL"), true),
        (Contains, s("Hello"), s("xyz"), false),
        (Contains, s("Hello"), s(""), true),
        (StartsWith, s("Hello"), s("he"), true),
        (StartsWith, s("Hello"), s("lo"), false),
        (EndsWith, s("Hello"), s("LO"), true),
        (Contains, n(1234.0), s("23"), true),
        (Contains, Value::Null, s(""), false),
        (EndsWith, s("x"), Value::Null, false),
    ]);
}

#[test]
fn test_arithmetic() {
    use BinaryOperator::*;
    let cases = [
        (Add, n(1.0), n(2.0), 3.0),
        (Subtract, n(0.0), n(5.0), -5.0),
        (Multiply, s("3"), n(2.0), 6.0),
        (Add, Value::Bool(true), n(1.0), 2.0),
        (Add, Value::Null, n(4.0), 4.0),
        (Divide, n(1.0), n(0.0), f64::INFINITY),
        (Divide, n(-1.0), n(4.0), -0.25),
    ];
    for (operator, left, right, expected) in cases {
        assert_eq!(eval_binary(operator, left, right), Ok(n(expected)));
    }

    let Ok(Value::Number(nan)) = eval_binary(Divide, n(0.0), n(0.0)) else {
        panic!("expected a number");
    };
    assert!(nan.is_nan());
    let Ok(Value::Number(nan)) = eval_binary(Add, s("abc"), n(1.0)) else {
        panic!("expected a number");
    };
    assert!(nan.is_nan());
}

#[test]
fn test_logical_operators_return_booleans() {
    use BinaryOperator::*;
    assert_table(vec![
        (And, n(1.0), n(0.0), false),
        (And, s("a"), Value::Date(day(2024, 1, 1)), true),
        (And, n(f64::NAN), Value::Bool(true), false),
        (Or, n(0.0), s("x"), true),
        (Or, Value::Null, n(0.0), false),
        (Or, s(""), n(-1.0), true),
    ]);
}

#[test]
fn test_unary_operators() {
    let cases = [
        (UnaryOperator::Not, n(0.0), Value::Bool(true)),
        (UnaryOperator::Not, s(""), Value::Bool(true)),
        (UnaryOperator::Not, s("x"), Value::Bool(false)),
        (UnaryOperator::Not, Value::Null, Value::Bool(true)),
        (UnaryOperator::Minus, s("5"), n(-5.0)),
        (UnaryOperator::Minus, n(-2.0), n(2.0)),
        (UnaryOperator::Plus, Value::Bool(true), n(1.0)),
        (UnaryOperator::Plus, s(""), n(0.0)),
    ];
    for (operator, argument, expected) in cases {
        let expr = Expr::unary(operator, Expr::Literal(argument));
        assert_eq!(eval(&expr, &json!({})), Ok(expected));
    }
}

// ==================== Errors ====================

#[test]
fn test_ordering_type_mismatch() {
    let err = eval_binary(BinaryOperator::Gt, Value::Null, Value::Bool(true)).unwrap_err();
    assert!(matches!(err, FilterError::TypeMismatch { position: None, .. }));

    let err = eval_binary(
        BinaryOperator::Lt,
        Value::Bool(true),
        Value::Date(day(2024, 1, 1)),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "type mismatch: cannot order boolean against date"
    );
}

#[test]
fn test_missing_identifier_is_unknown_field() {
    let expr = Expr::binary(BinaryOperator::Gt, Expr::ident("age"), Expr::literal(1.0));
    let err = eval(&expr, &json!({"name": "x"})).unwrap_err();
    assert_eq!(
        err,
        FilterError::UnknownField {
            name: "age".to_string(),
            position: None,
            suggestion: None,
        }
    );
}

#[test]
fn test_missing_identifier_suggests_from_registry() {
    let registry = FieldRegistry::new([FilterField::new("age", FieldType::Number)]);
    let record = json!({"agee": 3});
    let context = EvalContext::new(&record).with_registry(&registry);
    let err = evaluate(&Expr::ident("Age"), &context).unwrap_err();
    assert!(matches!(
        err,
        FilterError::UnknownField { suggestion: Some(ref s), .. } if s == "age"
    ));
}

#[test]
fn test_null_attribute_is_not_missing() {
    let expr = Expr::binary(BinaryOperator::Eq, Expr::ident("note"), Expr::Literal(Value::Null));
    assert_eq!(eval(&expr, &json!({"note": null})), Ok(Value::Bool(true)));
}

#[test]
fn test_logical_operators_short_circuit() {
    let missing = Expr::ident("missing");
    let expr = Expr::and(Expr::literal(false), missing.clone());
    assert_eq!(eval(&expr, &json!({})), Ok(Value::Bool(false)));
    let expr = Expr::or(Expr::literal(true), missing.clone());
    assert_eq!(eval(&expr, &json!({})), Ok(Value::Bool(true)));
    let expr = Expr::or(Expr::literal(false), missing);
    assert!(eval(&expr, &json!({})).is_err());
}

// ==================== Calls ====================

#[test]
fn test_call_without_function_table_is_unsupported() {
    let expr = Expr::Call {
        callee: "now".to_string(),
        arguments: vec![],
    };
    assert_eq!(
        eval(&expr, &json!({"now": 5})),
        Err(FilterError::UnsupportedCall {
            callee: "now".to_string()
        })
    );
}

#[test]
fn test_call_registered_function() {
    let mut functions = FunctionTable::new();
    functions
        .register("len", |args: &[Value]| {
            Ok(n(args.first().map(|v| v.to_string().len()).unwrap_or(0) as f64))
        })
        .register("fail", |_: &[Value]| Err(FilterError::unsupported_call("fail")));

    let record = json!({"name": "Alice"});
    let context = EvalContext::new(&record).with_functions(&functions);

    let call = Expr::Call {
        callee: "len".to_string(),
        arguments: vec![Expr::ident("name")],
    };
    assert_eq!(evaluate(&call, &context), Ok(n(5.0)));

    let failing = Expr::Call {
        callee: "fail".to_string(),
        arguments: vec![],
    };
    assert!(evaluate(&failing, &context).is_err());

    let unknown = Expr::Call {
        callee: "eval".to_string(),
        arguments: vec![],
    };
    assert!(matches!(
        evaluate(&unknown, &context),
        Err(FilterError::UnsupportedCall { .. })
    ));
    assert!(functions.contains("len"));
    assert!(!functions.contains("eval"));
}

#[test]
fn test_call_arguments_are_evaluated_first() {
    let mut functions = FunctionTable::new();
    functions.register("first", |args: &[Value]| Ok(args[0].clone()));
    let record = json!({});
    let context = EvalContext::new(&record).with_functions(&functions);
    let call = Expr::Call {
        callee: "first".to_string(),
        arguments: vec![Expr::ident("missing")],
    };
    assert!(matches!(
        evaluate(&call, &context),
        Err(FilterError::UnknownField { .. })
    ));
}

// ==================== Registry Conformance ====================

#[test]
fn test_registry_conforms_record_strings() {
    let registry = FieldRegistry::new([
        FilterField::new("age", FieldType::Number),
        FilterField::new("startedAt", FieldType::Date),
    ]);
    let record = json!({"age": "42", "startedAt": "2024-03-01T08:00:00Z"});
    let strict = Expr::binary(BinaryOperator::StrictEq, Expr::ident("age"), Expr::literal(42.0));

    assert_eq!(eval(&strict, &record), Ok(Value::Bool(false)));
    let context = EvalContext::new(&record).with_registry(&registry);
    assert_eq!(evaluate(&strict, &context), Ok(Value::Bool(true)));

    let after = Expr::binary(
        BinaryOperator::Gt,
        Expr::ident("startedAt"),
        Expr::literal(day(2024, 3, 1)),
    );
    assert_eq!(evaluate(&after, &context), Ok(Value::Bool(true)));
}

// ==================== FilterEvaluator ====================

#[test]
fn test_evaluator_quality_scenario() {
    let fields = FieldRegistry::new([
        FilterField::new("qualityFraction", FieldType::Number),
        FilterField::new("interruptions", FieldType::Number),
    ]);
    let expr = FilterParser::parse("qualityFraction > 0.8 && interruptions < 3", &fields).unwrap();
    let evaluator = FilterEvaluator::new(&expr).with_registry(&fields);

    assert!(evaluator
        .matches(&json!({"qualityFraction": 0.85, "interruptions": 1}))
        .unwrap());
    assert!(!evaluator
        .matches(&json!({"qualityFraction": 0.85, "interruptions": 4}))
        .unwrap());
    assert!(!evaluator
        .matches(&json!({"qualityFraction": 0.5, "interruptions": 0}))
        .unwrap());
}

#[test]
fn test_evaluator_matches_surfaces_missing_field() {
    let fields = FieldRegistry::new([FilterField::new("age", FieldType::Number)]);
    let expr = FilterParser::parse("age >= 18", &fields).unwrap();
    let evaluator = FilterEvaluator::new(&expr);

    assert!(evaluator.matches(&json!({"id": 1, "age": 30})).unwrap());
    assert!(!evaluator.matches(&json!({"id": 2, "age": 12})).unwrap());
    assert!(matches!(
        evaluator.matches(&json!({"id": 3})),
        Err(FilterError::UnknownField { ref name, .. }) if name == "age"
    ));
}

#[test]
fn test_evaluator_with_hash_map_records() {
    use std::collections::HashMap;

    let fields = FieldRegistry::new([FilterField::new("status", FieldType::String)]);
    let expr = FilterParser::parse("status startsWith rev", &fields).unwrap();
    let record: HashMap<String, Value> =
        HashMap::from([("status".to_string(), s("Reviewed"))]);
    assert!(FilterEvaluator::new(&expr).matches(&record).unwrap());
}
