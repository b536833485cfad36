//! Built-in primitive library.
//!
//! Primitives take pre-evaluated `Vec<Value>` arguments and return
//! `RunResult` (noeval forms take thunks, special forms take the raw token
//! cursor). Natural arity guarantees the declared argument count; explicit
//! `( … )` calls may pass more or fewer, so shared `expect_*` helpers police
//! everything a primitive touches.

use crate::error::Flow;
use crate::eval::Interpreter;
use crate::value::{ArrayHandle, ListHandle, Value};

pub(crate) mod arithmetic;
pub(crate) mod control;
pub(crate) mod data;
pub(crate) mod graphics;
pub(crate) mod higher_order;
pub(crate) mod predicates;
pub(crate) mod text;
pub(crate) mod workspace;

#[cfg(test)]
mod tests;

/// Register every primitive into a fresh interpreter.
pub(crate) fn install(it: &mut Interpreter) {
    arithmetic::install(it);
    control::install(it);
    data::install(it);
    graphics::install(it);
    higher_order::install(it);
    predicates::install(it);
    text::install(it);
    workspace::install(it);
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Fetch the i-th argument, raising when an explicit call under-supplied.
pub(super) fn arg<'a>(
    it: &Interpreter,
    args: &'a [Value],
    index: usize,
) -> Result<&'a Value, Flow> {
    args.get(index).ok_or_else(|| {
        let name = it.proc_stack.last().cloned().unwrap_or_default();
        it.err("Not enough inputs for {name:U}", &[("name", &name)])
    })
}

/// Extract a number, signaling "Expected number" if not.
pub(super) fn expect_number(it: &Interpreter, value: &Value) -> Result<f64, Flow> {
    it.number(value)
}

/// Extract a number and truncate it to an integer index/count.
pub(super) fn expect_int(it: &Interpreter, value: &Value) -> Result<i64, Flow> {
    Ok(expect_number(it, value)?.trunc() as i64)
}

/// Extract word text, signaling "Expected string" for lists and arrays.
pub(super) fn expect_word(it: &Interpreter, value: &Value) -> Result<String, Flow> {
    value
        .as_word()
        .map(|w| w.as_text())
        .ok_or_else(|| it.err("{_PROC_}: Expected string", &[]))
}

pub(super) fn expect_list(it: &Interpreter, value: &Value) -> Result<ListHandle, Flow> {
    value
        .as_list()
        .cloned()
        .ok_or_else(|| it.err("{_PROC_}: Expected list", &[]))
}

pub(super) fn expect_array(it: &Interpreter, value: &Value) -> Result<ArrayHandle, Flow> {
    value
        .as_array()
        .cloned()
        .ok_or_else(|| it.err("{_PROC_}: Expected array", &[]))
}

/// A list of exactly `len` elements, returned as an owned snapshot.
pub(super) fn expect_list_of_len(
    it: &Interpreter,
    value: &Value,
    len: usize,
) -> Result<Vec<Value>, Flow> {
    let list = expect_list(it, value)?;
    let items = list.borrow();
    if items.len() != len {
        let text = len.to_string();
        return Err(it.err(
            "{_PROC_}: Expected list of length {length}",
            &[("length", &text)],
        ));
    }
    Ok(items.clone())
}

pub(super) fn expect_bool(it: &Interpreter, value: &Value) -> Result<bool, Flow> {
    it.truth(value)
}

/// Variable-name argument: a word, with any leading quote/colon already
/// stripped by evaluation.
pub(super) fn expect_name(it: &Interpreter, value: &Value) -> Result<String, Flow> {
    expect_word(it, value)
}

/// A positive integer, for array sizes.
pub(super) fn expect_positive_int(it: &Interpreter, value: &Value) -> Result<usize, Flow> {
    let n = expect_number(it, value)?;
    if n < 1.0 || n.fract() != 0.0 {
        return Err(it.err("{_PROC_}: Array size must be positive integer", &[]));
    }
    Ok(n as usize)
}
