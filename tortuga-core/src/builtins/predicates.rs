//! Type, equality, ordering, and membership predicates.

use super::*;
use crate::eval::RunResult;
use crate::value::{values_equal, values_identical};

pub(crate) fn install(it: &mut Interpreter) {
    it.prim(&["wordp", "word?"], 1, builtin_wordp);
    it.prim(&["listp", "list?"], 1, builtin_listp);
    it.prim(&["arrayp", "array?"], 1, builtin_arrayp);
    it.prim(&["numberp", "number?"], 1, builtin_numberp);
    it.prim(&["emptyp", "empty?"], 1, builtin_emptyp);
    it.prim(&["equalp", "equal?"], 2, builtin_equalp);
    it.prim(&["notequalp", "notequal?"], 2, builtin_notequalp);
    it.prim(&["beforep", "before?"], 2, builtin_beforep);
    it.prim(&[".eq"], 2, builtin_dot_eq);
    it.prim(&["memberp", "member?"], 2, builtin_memberp);
    it.prim(&["substringp", "substring?"], 2, builtin_substringp);
    it.prim(&["lessp", "less?"], 2, builtin_lessp);
    it.prim(&["greaterp", "greater?"], 2, builtin_greaterp);
    it.prim(&["lessequalp", "lessequal?"], 2, builtin_lessequalp);
    it.prim(&["greaterequalp", "greaterequal?"], 2, builtin_greaterequalp);
    it.prim(&["true"], 0, builtin_true);
    it.prim(&["false"], 0, builtin_false);
    it.prim(&["xor"], 2, builtin_xor);
    it.prim(&["not"], 1, builtin_not);
}

pub(crate) fn builtin_wordp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(arg(it, &args, 0)?.is_word())))
}

pub(crate) fn builtin_listp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(arg(it, &args, 0)?.is_list())))
}

pub(crate) fn builtin_arrayp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(arg(it, &args, 0)?.is_array())))
}

pub(crate) fn builtin_numberp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(arg(it, &args, 0)?.is_number())))
}

pub(crate) fn builtin_emptyp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let empty = match arg(it, &args, 0)? {
        Value::Word(w) => w.as_text().is_empty(),
        Value::List(l) => l.borrow().is_empty(),
        Value::Array(_) => false,
    };
    Ok(Some(Value::bool(empty)))
}

pub(crate) fn builtin_equalp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = arg(it, &args, 0)?;
    let b = arg(it, &args, 1)?;
    Ok(Some(Value::bool(values_equal(a, b))))
}

pub(crate) fn builtin_notequalp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = arg(it, &args, 0)?;
    let b = arg(it, &args, 1)?;
    Ok(Some(Value::bool(!values_equal(a, b))))
}

/// Text ordering over words.
pub(crate) fn builtin_beforep(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = expect_word(it, arg(it, &args, 0)?)?;
    let b = expect_word(it, arg(it, &args, 1)?)?;
    Ok(Some(Value::bool(a < b)))
}

/// Identity comparison: words by exact text, lists/arrays by handle.
pub(crate) fn builtin_dot_eq(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = arg(it, &args, 0)?;
    let b = arg(it, &args, 1)?;
    Ok(Some(Value::bool(values_identical(a, b))))
}

pub(crate) fn builtin_memberp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let thing = arg(it, &args, 0)?;
    let found = match arg(it, &args, 1)? {
        Value::List(items) => items.borrow().iter().any(|v| values_equal(v, thing)),
        Value::Word(w) => {
            let needle = expect_word(it, thing)?;
            w.as_text().contains(&needle)
        }
        Value::Array(_) => return Err(it.err("{_PROC_}: Expected list", &[])),
    };
    Ok(Some(Value::bool(found)))
}

pub(crate) fn builtin_substringp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let needle = arg(it, &args, 0)?;
    let haystack = arg(it, &args, 1)?;
    let result = match (needle.as_word(), haystack.as_word()) {
        (Some(a), Some(b)) => b.as_text().contains(&a.as_text()),
        _ => false,
    };
    Ok(Some(Value::bool(result)))
}

fn numeric_pair(it: &Interpreter, args: &[Value]) -> Result<(f64, f64), Flow> {
    let a = expect_number(it, arg(it, args, 0)?)?;
    let b = expect_number(it, arg(it, args, 1)?)?;
    Ok((a, b))
}

pub(crate) fn builtin_lessp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let (a, b) = numeric_pair(it, &args)?;
    Ok(Some(Value::bool(a < b)))
}

pub(crate) fn builtin_greaterp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let (a, b) = numeric_pair(it, &args)?;
    Ok(Some(Value::bool(a > b)))
}

pub(crate) fn builtin_lessequalp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let (a, b) = numeric_pair(it, &args)?;
    Ok(Some(Value::bool(a <= b)))
}

pub(crate) fn builtin_greaterequalp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let (a, b) = numeric_pair(it, &args)?;
    Ok(Some(Value::bool(a >= b)))
}

pub(crate) fn builtin_true(_it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(true)))
}

pub(crate) fn builtin_false(_it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(false)))
}

pub(crate) fn builtin_xor(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let mut acc = false;
    for value in &args {
        acc ^= expect_bool(it, value)?;
    }
    Ok(Some(Value::bool(acc)))
}

pub(crate) fn builtin_not(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let b = expect_bool(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::bool(!b)))
}
