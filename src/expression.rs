//! The `{}` expression dialect.
//!
//! Expressions are evaluated by `evalexpr` against a context holding the
//! math functions map scripts call (`Sin`, `Pow`, `Round`, `if`, ...). Every
//! integer literal is read as a float first, so `{1/2}` is `0.5` and never
//! integer division. Integral results still print without a fraction.

use std::sync::OnceLock;

use evalexpr::{
    eval_with_context, ContextWithMutableFunctions, EvalexprError, EvalexprResult, Function,
    HashMapContext, Value,
};

use crate::error::{Result, ScriptError};
use crate::functions::format_number;

/// Evaluate one arithmetic / boolean expression.
pub fn eval_expression(expression: &str) -> Result<String> {
    let malformed = |message: String| ScriptError::MalformedExpression {
        expression: expression.to_string(),
        message,
    };
    static CONTEXT: OnceLock<EvalexprResult<HashMapContext>> = OnceLock::new();
    let context = CONTEXT
        .get_or_init(math_context)
        .as_ref()
        .map_err(|e| malformed(e.to_string()))?;

    eval_with_context(&float_literals(expression), context)
        .map(render)
        .map_err(|e| malformed(e.to_string()))
}

fn render(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Float(f) => format_number(f),
        Value::Int(i) => i.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Tuple(items) => items.into_iter().map(render).collect::<Vec<_>>().join(","),
        Value::Empty => String::new(),
    }
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || !b.is_ascii()
}

/// Append `.0` to every bare integer literal outside string literals.
fn float_literals(expression: &str) -> String {
    let bytes = expression.as_bytes();
    let mut out = String::with_capacity(expression.len() + 8);
    let mut copied = 0;
    let mut quoted = false;
    let mut escaped = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if quoted {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                quoted = false;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            quoted = true;
            i += 1;
            continue;
        }
        if !b.is_ascii_digit() || (i > 0 && is_word(bytes[i - 1])) {
            i += 1;
            continue;
        }

        let end = bytes[i..]
            .iter()
            .position(|c| !c.is_ascii_digit())
            .map_or(bytes.len(), |n| i + n);
        // `1.5`, `1e3` and `2x` are left to the evaluator.
        if !bytes.get(end).is_some_and(|&c| is_word(c)) {
            out.push_str(&expression[copied..end]);
            out.push_str(".0");
            copied = end;
        }
        i = end;
    }
    out.push_str(&expression[copied..]);
    out
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

fn arguments(argument: &Value) -> Vec<Value> {
    match argument {
        Value::Tuple(items) => items.clone(),
        Value::Empty => Vec::new(),
        other => vec![other.clone()],
    }
}

fn numbers(name: &str, argument: &Value, arity: usize) -> EvalexprResult<Vec<f64>> {
    let args = arguments(argument);
    if args.len() != arity {
        return Err(EvalexprError::CustomMessage(format!(
            "{} expects {} argument(s), got {}",
            name,
            arity,
            args.len()
        )));
    }
    args.iter().map(Value::as_number).collect()
}

fn unary(name: &'static str, f: fn(f64) -> f64) -> Function {
    Function::new(move |argument| Ok(Value::Float(f(numbers(name, argument, 1)?[0]))))
}

fn binary(name: &'static str, f: fn(f64, f64) -> f64) -> Function {
    Function::new(move |argument| {
        let n = numbers(name, argument, 2)?;
        Ok(Value::Float(f(n[0], n[1])))
    })
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `Round(x)` or `Round(x, digits)`, half to even.
fn round(argument: &Value) -> EvalexprResult<Value> {
    let n = match arguments(argument).len() {
        1 => numbers("Round", argument, 1)?,
        _ => numbers("Round", argument, 2)?,
    };
    let value = match n.get(1) {
        Some(&digits) => {
            let scale = 10f64.powi(digits as i32);
            (n[0] * scale).round_ties_even() / scale
        }
        None => n[0].round_ties_even(),
    };
    Ok(Value::Float(value))
}

fn choose(argument: &Value) -> EvalexprResult<Value> {
    match arguments(argument).as_slice() {
        [condition, then, otherwise] => Ok(if condition.as_boolean()? {
            then.clone()
        } else {
            otherwise.clone()
        }),
        args => Err(EvalexprError::CustomMessage(format!(
            "if expects 3 arguments, got {}",
            args.len()
        ))),
    }
}

fn contains(argument: &Value) -> EvalexprResult<Value> {
    match arguments(argument).split_first() {
        Some((needle, haystack)) if !haystack.is_empty() => {
            Ok(Value::Boolean(haystack.contains(needle)))
        }
        _ => Err(EvalexprError::CustomMessage(
            "in expects a value and at least one candidate".into(),
        )),
    }
}

fn math_context() -> EvalexprResult<HashMapContext> {
    let mut context = HashMapContext::new();
    let unaries: [(&'static str, fn(f64) -> f64); 14] = [
        ("Abs", f64::abs),
        ("Acos", f64::acos),
        ("Asin", f64::asin),
        ("Atan", f64::atan),
        ("Ceiling", f64::ceil),
        ("Cos", f64::cos),
        ("Exp", f64::exp),
        ("Floor", f64::floor),
        ("Log10", f64::log10),
        ("Sign", sign),
        ("Sin", f64::sin),
        ("Sqrt", f64::sqrt),
        ("Tan", f64::tan),
        ("Truncate", f64::trunc),
    ];
    for (name, f) in unaries {
        context.set_function(name.to_string(), unary(name, f))?;
    }

    let binaries: [(&'static str, fn(f64, f64) -> f64); 5] = [
        ("Pow", f64::powf),
        ("Log", f64::log),
        ("Max", f64::max),
        ("Min", f64::min),
        ("IEEERemainder", |a, b| a - b * (a / b).round_ties_even()),
    ];
    for (name, f) in binaries {
        context.set_function(name.to_string(), binary(name, f))?;
    }

    context.set_function("Round".to_string(), Function::new(round))?;
    context.set_function("if".to_string(), Function::new(choose))?;
    context.set_function("in".to_string(), Function::new(contains))?;
    Ok(context)
}
