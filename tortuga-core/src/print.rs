//! Value printing and procedure-definition text.

use crate::eval::UserProc;
use crate::parser::Token;
use crate::value::Value;

/// Decorated form: lists print inside `[ ]`, arrays inside `{ }` (used by
/// `SHOW` and nested positions everywhere).
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Word(w) => w.as_text(),
        Value::List(items) => {
            let parts: Vec<String> = items.borrow().iter().map(stringify).collect();
            format!("[{}]", parts.join(" "))
        }
        Value::Array(a) => {
            let a = a.borrow();
            let parts: Vec<String> = a.items.iter().map(stringify).collect();
            if a.origin == 1 {
                format!("{{{}}}", parts.join(" "))
            } else {
                format!("{{{}}}@{}", parts.join(" "), a.origin)
            }
        }
    }
}

/// Undecorated form: a top-level list loses its brackets (used by `PRINT`
/// and `TYPE`); nested structure keeps them.
pub fn stringify_nodecorate(value: &Value) -> String {
    match value {
        Value::List(items) => {
            let parts: Vec<String> = items.borrow().iter().map(stringify).collect();
            parts.join(" ")
        }
        _ => stringify(value),
    }
}

/// Source text of one stored body token.
pub fn token_text(token: &Token) -> String {
    match token {
        Token::Word(w) => w.clone(),
        Token::Minus => "-".to_string(),
        Token::Literal(v) => stringify(v),
    }
}

/// Body tokens joined for definition text. A unary-minus sentinel binds to
/// the following atom, so it is emitted without a trailing space.
pub fn body_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && !matches!(tokens[i - 1], Token::Minus) {
            out.push(' ');
        }
        out.push_str(&token_text(token));
    }
    out
}

/// The canonical textual form of a user procedure, as emitted by `DEF` and
/// handed to the save hook:
///
/// ```text
/// to NAME :arg1 :arg2
///   <body tokens>
/// end
/// ```
pub fn routine_text(proc: &UserProc) -> String {
    let mut out = format!("to {}", proc.name);
    for input in &proc.inputs {
        out.push_str(" :");
        out.push_str(input);
    }
    out.push('\n');
    if !proc.body.is_empty() {
        out.push_str("  ");
        out.push_str(&body_text(&proc.body));
        out.push('\n');
    }
    out.push_str("end");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringify_decorates_nested_structure() {
        let v = Value::list(vec![
            Value::word("a"),
            Value::list(vec![Value::word("b"), Value::num(2.0)]),
        ]);
        assert_eq!(stringify(&v), "[a [b 2]]");
        assert_eq!(stringify_nodecorate(&v), "a [b 2]");
    }

    #[test]
    fn arrays_carry_nondefault_origin() {
        let v = Value::array(vec![Value::num(1.0), Value::num(2.0)], 1);
        assert_eq!(stringify(&v), "{1 2}");
        let v = Value::array(vec![Value::word("a")], 0);
        assert_eq!(stringify(&v), "{a}@0");
    }

    #[test]
    fn body_text_binds_unary_minus_tight() {
        let tokens = vec![
            Token::Word("fd".to_string()),
            Token::Minus,
            Token::Word("10".to_string()),
        ];
        assert_eq!(body_text(&tokens), "fd -10");
    }

    #[test]
    fn routine_text_round_trip_shape() {
        let proc = UserProc {
            name: "sq".to_string(),
            inputs: vec!["n".to_string()],
            body: vec![
                Token::Word("fd".to_string()),
                Token::Word(":n".to_string()),
            ],
        };
        assert_eq!(routine_text(&proc), "to sq :n\n  fd :n\nend");
    }
}
