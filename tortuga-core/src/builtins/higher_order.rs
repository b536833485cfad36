//! Higher-order procedures. A template is a procedure-name word, a lambda
//! list `[[inputs] body…]`, or a body list whose `?` slots read the current
//! inputs.

use super::*;
use crate::env::{Binding, Frame};
use crate::error::Flow;
use crate::eval::RunResult;

pub(crate) fn install(it: &mut Interpreter) {
    it.prim(&["apply"], 2, builtin_apply);
    it.prim(&["invoke"], 2, builtin_invoke);
    it.prim(&["foreach"], 2, builtin_foreach);
    it.prim(&["map"], 2, builtin_map);
    it.prim(&["filter"], 2, builtin_filter);
    it.prim(&["find"], 2, builtin_find);
    it.prim(&["reduce"], 2, builtin_reduce);
    it.prim(&["crossmap"], 2, builtin_crossmap);
    it.prim(&["?"], 0, builtin_slot);
}

/// Invoke a template with the given inputs.
pub(crate) fn call_template(
    it: &mut Interpreter,
    template: &Value,
    args: Vec<Value>,
) -> RunResult {
    match template {
        Value::Word(w) => it.call_routine_values(&w.as_text(), args),
        Value::List(items) => {
            let items = items.borrow().clone();
            if let Some(Value::List(params)) = items.first() {
                call_lambda(it, &params.borrow().clone(), &items[1..], args)
            } else {
                let tokens = it.reparse(template)?;
                it.with_slots(args, |it| {
                    unwind_template(it.execute_tokens(tokens, true))
                })
            }
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected procedure name or list", &[])),
    }
}

/// `[[inputs] body…]`: behaves like an anonymous user procedure.
fn call_lambda(
    it: &mut Interpreter,
    params: &[Value],
    body: &[Value],
    args: Vec<Value>,
) -> RunResult {
    let mut frame = Frame::default();
    for (i, param) in params.iter().enumerate() {
        let name = expect_word(it, param)?;
        let name = name.strip_prefix(':').unwrap_or(&name).to_string();
        frame.insert(&name, Binding::new(args.get(i).cloned()));
    }
    let tokens = it.reparse(&Value::list(body.to_vec()))?;
    it.scopes.push(frame);
    let result = unwind_template(it.execute_tokens(tokens, true));
    it.scopes.pop();
    result
}

/// Templates catch `OUTPUT`/`STOP` like a procedure boundary.
fn unwind_template(result: RunResult) -> RunResult {
    match result {
        Err(Flow::Output(value)) => Ok(Some(value)),
        Err(Flow::Stop) => Ok(None),
        other => other,
    }
}

/// The current inputs of the innermost template application.
pub(crate) fn builtin_slot(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let index = match args.first() {
        Some(v) => expect_int(it, v)?,
        None => 1,
    };
    let slots = it
        .template_slots
        .last()
        .ok_or_else(|| it.err("{_PROC_}: Index out of bounds", &[]))?;
    if index < 1 || index as usize > slots.len() {
        return Err(it.err("{_PROC_}: Index out of bounds", &[]));
    }
    Ok(Some(slots[index as usize - 1].clone()))
}

/// `apply template inputlist`.
pub(crate) fn builtin_apply(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let template = arg(it, &args, 0)?.clone();
    let inputs = expect_list(it, arg(it, &args, 1)?)?;
    let inputs = inputs.borrow().clone();
    call_template(it, &template, inputs)
}

/// `(invoke template input…)`.
pub(crate) fn builtin_invoke(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let template = arg(it, &args, 0)?.clone();
    let inputs = args[1..].to_vec();
    call_template(it, &template, inputs)
}

/// `foreach data template` — data first, template last.
pub(crate) fn builtin_foreach(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let data = expect_list(it, arg(it, &args, 0)?)?;
    let template = arg(it, &args, 1)?.clone();
    let items = data.borrow().clone();
    for item in items {
        call_template(it, &template, vec![item])?;
        it.host.yield_now();
    }
    Ok(None)
}

/// `map template data` / `(map template data1 data2 …)` — parallel over
/// the shortest input.
pub(crate) fn builtin_map(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let template = arg(it, &args, 0)?.clone();
    let mut columns = Vec::new();
    for data in &args[1..] {
        columns.push(expect_list(it, data)?.borrow().clone());
    }
    if columns.is_empty() {
        columns.push(expect_list(it, arg(it, &args, 1)?)?.borrow().clone());
    }
    let len = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let slots: Vec<Value> = columns.iter().map(|c| c[i].clone()).collect();
        let value = call_template(it, &template, slots)?;
        out.push(it.require_output(value)?);
    }
    Ok(Some(Value::list(out)))
}

pub(crate) fn builtin_filter(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let template = arg(it, &args, 0)?.clone();
    let data = expect_list(it, arg(it, &args, 1)?)?;
    let items = data.borrow().clone();
    let mut kept = Vec::new();
    for item in items {
        let verdict = call_template(it, &template, vec![item.clone()])?;
        let verdict = it.require_output(verdict)?;
        if it.truth(&verdict)? {
            kept.push(item);
        }
    }
    Ok(Some(Value::list(kept)))
}

/// First member the template accepts, or the empty list.
pub(crate) fn builtin_find(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let template = arg(it, &args, 0)?.clone();
    let data = expect_list(it, arg(it, &args, 1)?)?;
    let items = data.borrow().clone();
    for item in items {
        let verdict = call_template(it, &template, vec![item.clone()])?;
        let verdict = it.require_output(verdict)?;
        if it.truth(&verdict)? {
            return Ok(Some(item));
        }
    }
    Ok(Some(Value::empty_list()))
}

/// Left fold: the template sees the accumulated value then the next member.
pub(crate) fn builtin_reduce(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let template = arg(it, &args, 0)?.clone();
    let data = expect_list(it, arg(it, &args, 1)?)?;
    let items = data.borrow().clone();
    let Some(mut acc) = items.first().cloned() else {
        return Err(it.err("{_PROC_}: Expected non-empty list", &[]));
    };
    for item in &items[1..] {
        let value = call_template(it, &template, vec![acc, item.clone()])?;
        acc = it.require_output(value)?;
    }
    Ok(Some(acc))
}

/// `crossmap template [list1 list2 …]` — cartesian product, leftmost input
/// varying slowest. A flat data list means a single dimension.
pub(crate) fn builtin_crossmap(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let template = arg(it, &args, 0)?.clone();
    let data = expect_list(it, arg(it, &args, 1)?)?;
    let data = data.borrow().clone();
    let dims: Vec<Vec<Value>> = if !data.is_empty() && data.iter().all(Value::is_list) {
        data.iter()
            .map(|d| d.as_list().map(|l| l.borrow().clone()).unwrap_or_default())
            .collect()
    } else {
        vec![data]
    };
    let mut out = Vec::new();
    let mut slots = Vec::with_capacity(dims.len());
    cross_recurse(it, &template, &dims, &mut slots, &mut out)?;
    Ok(Some(Value::list(out)))
}

fn cross_recurse(
    it: &mut Interpreter,
    template: &Value,
    dims: &[Vec<Value>],
    slots: &mut Vec<Value>,
    out: &mut Vec<Value>,
) -> Result<(), Flow> {
    if dims.is_empty() {
        let value = call_template(it, template, slots.clone())?;
        out.push(it.require_output(value)?);
        return Ok(());
    }
    for item in &dims[0] {
        slots.push(item.clone());
        cross_recurse(it, template, &dims[1..], slots, out)?;
        slots.pop();
    }
    Ok(())
}
