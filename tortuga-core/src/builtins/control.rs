//! Control structures: RUN, the loop family, conditionals, and the
//! non-local control signals.

use super::*;
use crate::error::Flow;
use crate::eval::{Cursor, RunResult, Thunk};
use crate::parser::Token;

pub(crate) fn install(it: &mut Interpreter) {
    it.prim(&["run"], 1, builtin_run);
    it.prim(&["runresult"], 1, builtin_runresult);
    it.prim(&["repeat"], 2, builtin_repeat);
    it.prim(&["forever"], 1, builtin_forever);
    it.prim(&["repcount", "#"], 0, builtin_repcount);
    it.prim_max(&["if"], 2, 3, builtin_if);
    it.prim(&["ifelse"], 3, builtin_ifelse);
    it.prim(&["test"], 1, builtin_test);
    it.prim(&["iftrue", "ift"], 1, builtin_iftrue);
    it.prim(&["iffalse", "iff"], 1, builtin_iffalse);
    it.prim(&["stop"], 0, builtin_stop);
    it.prim(&["output", "op"], 1, builtin_output);
    it.prim(&["bye"], 0, builtin_bye);
    it.prim(&["ignore"], 1, builtin_ignore);
    it.prim(&["wait"], 1, builtin_wait);
    it.prim(&["for"], 2, builtin_for);
    it.prim(&["case"], 2, builtin_case);
    it.prim(&["cond"], 1, builtin_cond);
    it.lazy(&["and"], 2, builtin_and);
    it.lazy(&["or"], 2, builtin_or);
    it.lazy(&["while"], 2, builtin_while);
    it.lazy(&["until"], 2, builtin_until);
    it.lazy(&["do.while"], 2, builtin_do_while);
    it.lazy(&["do.until"], 2, builtin_do_until);
}

/// Run a list (or word) as a statement sequence, passing through whatever
/// value the last statement produced.
pub(crate) fn builtin_run(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let tokens = it.reparse(arg(it, &args, 0)?)?;
    it.execute_tokens(tokens, true)
}

/// `[]` if the statements produced nothing, `[value]` if they did.
pub(crate) fn builtin_runresult(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let tokens = it.reparse(arg(it, &args, 0)?)?;
    match it.execute_tokens(tokens, true)? {
        Some(value) => Ok(Some(Value::list(vec![value]))),
        None => Ok(Some(Value::empty_list())),
    }
}

/// Run a block as an expression body: the last value (if any) passes
/// through. Used by the conditional forms.
fn run_block(it: &mut Interpreter, block: &Value) -> RunResult {
    let tokens = it.reparse(block)?;
    it.execute_tokens(tokens, true)
}

/// Run a block as a command sequence: a produced value is an error.
fn run_block_cmd(it: &mut Interpreter, block: &Value) -> Result<(), Flow> {
    let tokens = it.reparse(block)?;
    it.execute_tokens(tokens, false)?;
    Ok(())
}

pub(crate) fn builtin_repeat(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let count = expect_number(it, arg(it, &args, 0)?)?;
    let block = arg(it, &args, 1)?.clone();
    let saved = it.repcount;
    let mut outcome: RunResult = Ok(None);
    let mut i = 1.0;
    while i <= count {
        it.repcount = i;
        if let Err(flow) = run_block_cmd(it, &block) {
            outcome = Err(flow);
            break;
        }
        it.host.yield_now();
        i += 1.0;
    }
    it.repcount = saved;
    outcome
}

pub(crate) fn builtin_forever(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let block = arg(it, &args, 0)?.clone();
    let saved = it.repcount;
    let mut i = 1.0;
    let result = loop {
        it.repcount = i;
        if let Err(flow) = run_block_cmd(it, &block) {
            break Err(flow);
        }
        it.host.yield_now();
        i += 1.0;
    };
    it.repcount = saved;
    result
}

pub(crate) fn builtin_repcount(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::num(it.repcount)))
}

pub(crate) fn builtin_if(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let test = it.condition(arg(it, &args, 0)?)?;
    if test {
        let block = arg(it, &args, 1)?.clone();
        run_block(it, &block)
    } else if let Some(else_block) = args.get(2) {
        let block = else_block.clone();
        run_block(it, &block)
    } else {
        Ok(None)
    }
}

pub(crate) fn builtin_ifelse(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let test = it.condition(arg(it, &args, 0)?)?;
    let block = if test {
        arg(it, &args, 1)?
    } else {
        arg(it, &args, 2)?
    };
    run_block(it, &block.clone())
}

/// `TEST` stores its result on the current frame (a sidecar slot, not a
/// binding); `IFT`/`IFF` find the dynamically nearest one.
pub(crate) fn builtin_test(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let test = it.condition(arg(it, &args, 0)?)?;
    if let Some(frame) = it.scopes.last_mut() {
        frame.test = Some(test);
    }
    Ok(None)
}

fn nearest_test(it: &Interpreter) -> Result<bool, Flow> {
    for frame in it.scopes.iter().rev() {
        if let Some(test) = frame.test {
            return Ok(test);
        }
    }
    Err(it.err("{_PROC_}: Called without TEST", &[]))
}

pub(crate) fn builtin_iftrue(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let block = arg(it, &args, 0)?.clone();
    if nearest_test(it)? {
        run_block(it, &block)
    } else {
        Ok(None)
    }
}

pub(crate) fn builtin_iffalse(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let block = arg(it, &args, 0)?.clone();
    if !nearest_test(it)? {
        run_block(it, &block)
    } else {
        Ok(None)
    }
}

pub(crate) fn builtin_stop(_it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Err(Flow::Stop)
}

pub(crate) fn builtin_output(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Err(Flow::Output(arg(it, &args, 0)?.clone()))
}

pub(crate) fn builtin_bye(_it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Err(Flow::Bye)
}

pub(crate) fn builtin_ignore(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let _ = arg(it, &args, 0)?;
    Ok(None)
}

/// Delay in sixtieths of a second, delegated to the host.
pub(crate) fn builtin_wait(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let sixtieths = expect_number(it, arg(it, &args, 0)?)?;
    it.host.wait(sixtieths);
    Ok(None)
}

fn sign(n: f64) -> f64 {
    if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `FOR [var start limit step?] body`. Start and limit are expressions
/// evaluated from the control list in order; the step expression (when
/// present) is re-evaluated each iteration from a saved copy, defaulting to
/// `sign(limit - start)`.
pub(crate) fn builtin_for(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let control = arg(it, &args, 0)?.clone();
    let body = arg(it, &args, 1)?.clone();
    let tokens = it.reparse(&control)?;
    let mut cursor = Cursor::new(tokens);
    let Some(Token::Word(var)) = cursor.next() else {
        return Err(it.err("{_PROC_}: Expected list of length {length}", &[("length", "3")]));
    };
    let start_thunk = it.expression(&mut cursor)?;
    let start = it.demand(&start_thunk)?;
    let start = it.number(&start)?;
    let limit_thunk = it.expression(&mut cursor)?;
    let limit = it.demand(&limit_thunk)?;
    let limit = it.number(&limit)?;
    let mut step_tokens = Vec::new();
    while let Some(token) = cursor.next() {
        step_tokens.push(token);
    }

    let mut current = start;
    loop {
        let step = if step_tokens.is_empty() {
            sign(limit - start)
        } else {
            let value = it.evaluate_single(step_tokens.clone())?;
            let value = it.require_output(value)?;
            it.number(&value)?
        };
        if sign(current - limit) == sign(step) {
            return Ok(None);
        }
        it.set_var(&var, Value::num(current));
        run_block_cmd(it, &body)?;
        it.host.yield_now();
        current += step;
    }
}

/// `CASE value clauses`: each clause head is a candidate list or `ELSE`;
/// the first match's remainder is evaluated as an expression.
pub(crate) fn builtin_case(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let value = arg(it, &args, 0)?.clone();
    let clauses = expect_list(it, arg(it, &args, 1)?)?;
    let clauses = clauses.borrow().clone();
    for clause in clauses {
        let clause = expect_list(it, &clause)?;
        let clause = clause.borrow().clone();
        let Some(head) = clause.first() else {
            continue;
        };
        let matched = match head {
            Value::Word(w) if it.keyword_matches(&w.as_text(), "ELSE") => true,
            Value::List(candidates) => candidates
                .borrow()
                .iter()
                .any(|c| crate::value::values_equal(c, &value)),
            _ => false,
        };
        if matched {
            let rest = Value::list(clause[1..].to_vec());
            let tokens = it.reparse(&rest)?;
            return it.evaluate_single(tokens);
        }
    }
    Ok(None)
}

/// `COND clauses`: each clause head is a condition expression or `ELSE`.
pub(crate) fn builtin_cond(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let clauses = expect_list(it, arg(it, &args, 0)?)?;
    let clauses = clauses.borrow().clone();
    for clause in clauses {
        let clause = expect_list(it, &clause)?;
        let clause = clause.borrow().clone();
        let Some(head) = clause.first() else {
            continue;
        };
        let matched = match head {
            Value::Word(w) if it.keyword_matches(&w.as_text(), "ELSE") => true,
            other => it.condition(other)?,
        };
        if matched {
            let rest = Value::list(clause[1..].to_vec());
            let tokens = it.reparse(&rest)?;
            return it.evaluate_single(tokens);
        }
    }
    Ok(None)
}

/// A condition thunk's value may itself be a list to re-parse and evaluate.
fn thunk_condition(it: &mut Interpreter, thunk: &Thunk) -> Result<bool, Flow> {
    let value = it.demand(thunk)?;
    it.condition(&value)
}

/// Short-circuit: stop at the first false operand.
pub(crate) fn builtin_and(it: &mut Interpreter, args: &[Thunk]) -> RunResult {
    for thunk in args {
        if !thunk_condition(it, thunk)? {
            return Ok(Some(Value::bool(false)));
        }
    }
    Ok(Some(Value::bool(true)))
}

/// Short-circuit: stop at the first true operand.
pub(crate) fn builtin_or(it: &mut Interpreter, args: &[Thunk]) -> RunResult {
    for thunk in args {
        if thunk_condition(it, thunk)? {
            return Ok(Some(Value::bool(true)));
        }
    }
    Ok(Some(Value::bool(false)))
}

fn loop_body(it: &mut Interpreter, thunk: &Thunk) -> Result<(), Flow> {
    let block = it.demand(thunk)?;
    run_block_cmd(it, &block)?;
    it.host.yield_now();
    Ok(())
}

pub(crate) fn builtin_while(it: &mut Interpreter, args: &[Thunk]) -> RunResult {
    let (cond, body) = lazy_pair(it, args)?;
    while thunk_condition(it, cond)? {
        loop_body(it, body)?;
    }
    Ok(None)
}

pub(crate) fn builtin_until(it: &mut Interpreter, args: &[Thunk]) -> RunResult {
    let (cond, body) = lazy_pair(it, args)?;
    while !thunk_condition(it, cond)? {
        loop_body(it, body)?;
    }
    Ok(None)
}

pub(crate) fn builtin_do_while(it: &mut Interpreter, args: &[Thunk]) -> RunResult {
    let (body, cond) = lazy_pair(it, args)?;
    loop {
        loop_body(it, body)?;
        if !thunk_condition(it, cond)? {
            return Ok(None);
        }
    }
}

pub(crate) fn builtin_do_until(it: &mut Interpreter, args: &[Thunk]) -> RunResult {
    let (body, cond) = lazy_pair(it, args)?;
    loop {
        loop_body(it, body)?;
        if thunk_condition(it, cond)? {
            return Ok(None);
        }
    }
}

fn lazy_pair<'a>(it: &Interpreter, args: &'a [Thunk]) -> Result<(&'a Thunk, &'a Thunk), Flow> {
    match args {
        [a, b, ..] => Ok((a, b)),
        _ => {
            let name = it.proc_stack.last().cloned().unwrap_or_default();
            Err(it.err("Not enough inputs for {name:U}", &[("name", &name)]))
        }
    }
}
