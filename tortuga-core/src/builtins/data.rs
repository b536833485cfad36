//! Word, list, and array constructors, selectors, and mutators.

use super::*;
use crate::eval::RunResult;
use crate::value::{values_equal, LogoArray};

pub(crate) fn install(it: &mut Interpreter) {
    it.prim(&["word"], 2, builtin_word);
    it.prim(&["list"], 2, builtin_list);
    it.prim(&["sentence", "se"], 2, builtin_sentence);
    it.prim(&["fput"], 2, builtin_fput);
    it.prim(&["lput"], 2, builtin_lput);
    it.prim(&["combine"], 2, builtin_combine);
    it.prim(&["reverse"], 1, builtin_reverse);
    it.prim(&["gensym"], 0, builtin_gensym);
    it.prim(&["array"], 1, builtin_array);
    it.prim(&["mdarray"], 1, builtin_mdarray);
    it.prim(&["listtoarray"], 1, builtin_listtoarray);
    it.prim(&["arraytolist"], 1, builtin_arraytolist);
    it.prim(&["first"], 1, builtin_first);
    it.prim(&["firsts"], 1, builtin_firsts);
    it.prim(&["last"], 1, builtin_last);
    it.prim(&["butfirst", "bf"], 1, builtin_butfirst);
    it.prim(&["butfirsts", "bfs"], 1, builtin_butfirsts);
    it.prim(&["butlast", "bl"], 1, builtin_butlast);
    it.prim(&["item"], 2, builtin_item);
    it.prim(&["mditem"], 2, builtin_mditem);
    it.prim(&["pick"], 1, builtin_pick);
    it.prim(&["remove"], 2, builtin_remove);
    it.prim(&["remdup"], 1, builtin_remdup);
    it.prim(&["quoted"], 1, builtin_quoted);
    it.prim(&["setitem"], 3, builtin_setitem);
    it.prim(&["mdsetitem"], 3, builtin_mdsetitem);
    it.prim(&[".setfirst"], 2, builtin_dot_setfirst);
    it.prim(&[".setbf"], 2, builtin_dot_setbf);
    it.prim(&[".setitem"], 3, builtin_dot_setitem);
    it.prim(&["push"], 2, builtin_push);
    it.prim(&["pop"], 1, builtin_pop);
    it.prim(&["queue"], 2, builtin_queue);
    it.prim(&["dequeue"], 1, builtin_dequeue);
    it.prim(&["member"], 2, builtin_member);
    it.prim(&["count"], 1, builtin_count);
    it.prim(&["ascii"], 1, builtin_ascii);
    it.prim(&["char"], 1, builtin_char);
    it.prim(&["lowercase"], 1, builtin_lowercase);
    it.prim(&["uppercase"], 1, builtin_uppercase);
}

fn index_error(it: &Interpreter) -> Flow {
    it.err("{_PROC_}: Index out of bounds", &[])
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

pub(crate) fn builtin_word(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let mut text = String::new();
    for value in &args {
        text.push_str(&expect_word(it, value)?);
    }
    Ok(Some(Value::word(text)))
}

pub(crate) fn builtin_list(_it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Ok(Some(Value::list(args)))
}

/// `SENTENCE` splices list arguments one level deep.
pub(crate) fn builtin_sentence(_it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let mut items = Vec::new();
    for value in args {
        match value {
            Value::List(l) => items.extend(l.borrow().iter().cloned()),
            other => items.push(other),
        }
    }
    Ok(Some(Value::list(items)))
}

pub(crate) fn builtin_fput(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let thing = arg(it, &args, 0)?.clone();
    match arg(it, &args, 1)? {
        Value::List(l) => {
            let mut items = vec![thing];
            items.extend(l.borrow().iter().cloned());
            Ok(Some(Value::list(items)))
        }
        Value::Word(w) => {
            let prefix = expect_word(it, &thing)?;
            Ok(Some(Value::word(format!("{}{}", prefix, w.as_text()))))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_lput(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let thing = arg(it, &args, 0)?.clone();
    match arg(it, &args, 1)? {
        Value::List(l) => {
            let mut items: Vec<Value> = l.borrow().clone();
            items.push(thing);
            Ok(Some(Value::list(items)))
        }
        Value::Word(w) => {
            let suffix = expect_word(it, &thing)?;
            Ok(Some(Value::word(format!("{}{}", w.as_text(), suffix))))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

/// `COMBINE thing group`: `WORD` when the group is a word, `FPUT` otherwise.
pub(crate) fn builtin_combine(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 1)? {
        Value::Word(_) => builtin_word(it, args),
        _ => builtin_fput(it, args),
    }
}

pub(crate) fn builtin_reverse(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::List(l) => {
            let mut items: Vec<Value> = l.borrow().clone();
            items.reverse();
            Ok(Some(Value::list(items)))
        }
        Value::Word(w) => Ok(Some(Value::word(w.as_text().chars().rev().collect::<String>()))),
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_gensym(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.gensym_counter += 1;
    Ok(Some(Value::word(format!("G{}", it.gensym_counter))))
}

/// `array size` / `(array size origin)` — members start as empty lists.
pub(crate) fn builtin_array(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let size = expect_positive_int(it, arg(it, &args, 0)?)?;
    let origin = match args.get(1) {
        Some(v) => expect_int(it, v)?,
        None => 1,
    };
    let items = (0..size).map(|_| Value::empty_list()).collect();
    Ok(Some(Value::array(items, origin)))
}

pub(crate) fn builtin_mdarray(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let sizes_list = expect_list(it, arg(it, &args, 0)?)?;
    let origin = match args.get(1) {
        Some(v) => expect_int(it, v)?,
        None => 1,
    };
    let sizes = sizes_list.borrow().clone();
    if sizes.is_empty() {
        return Err(it.err("{_PROC_}: Array size must be positive integer", &[]));
    }
    let mut dims = Vec::with_capacity(sizes.len());
    for size in &sizes {
        dims.push(expect_positive_int(it, size)?);
    }
    Ok(Some(build_dimension(&dims, origin)))
}

fn build_dimension(dims: &[usize], origin: i64) -> Value {
    let size = dims[0];
    let items = (0..size)
        .map(|_| {
            if dims.len() > 1 {
                build_dimension(&dims[1..], origin)
            } else {
                Value::empty_list()
            }
        })
        .collect();
    Value::array(items, origin)
}

pub(crate) fn builtin_listtoarray(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let list = expect_list(it, arg(it, &args, 0)?)?;
    let origin = match args.get(1) {
        Some(v) => expect_int(it, v)?,
        None => 1,
    };
    let items = list.borrow().clone();
    Ok(Some(Value::array(items, origin)))
}

pub(crate) fn builtin_arraytolist(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let array = expect_array(it, arg(it, &args, 0)?)?;
    let items = array.borrow().items.clone();
    Ok(Some(Value::list(items)))
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

pub(crate) fn builtin_first(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::List(l) => l.borrow().first().cloned().ok_or_else(|| index_error(it)).map(Some),
        Value::Word(w) => {
            let text = w.as_text();
            let c = text.chars().next().ok_or_else(|| index_error(it))?;
            Ok(Some(Value::word(c.to_string())))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_firsts(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let list = expect_list(it, arg(it, &args, 0)?)?;
    let items = list.borrow().clone();
    let mut firsts = Vec::with_capacity(items.len());
    for item in items {
        let first = builtin_first(it, vec![item])?;
        firsts.push(it.require_output(first)?);
    }
    Ok(Some(Value::list(firsts)))
}

pub(crate) fn builtin_last(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::List(l) => l.borrow().last().cloned().ok_or_else(|| index_error(it)).map(Some),
        Value::Word(w) => {
            let text = w.as_text();
            let c = text.chars().last().ok_or_else(|| index_error(it))?;
            Ok(Some(Value::word(c.to_string())))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_butfirst(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::List(l) => {
            let items = l.borrow();
            if items.is_empty() {
                return Err(index_error(it));
            }
            Ok(Some(Value::list(items[1..].to_vec())))
        }
        Value::Word(w) => {
            let text = w.as_text();
            let mut chars = text.chars();
            if chars.next().is_none() {
                return Err(index_error(it));
            }
            Ok(Some(Value::word(chars.as_str())))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_butfirsts(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let list = expect_list(it, arg(it, &args, 0)?)?;
    let items = list.borrow().clone();
    let mut rests = Vec::with_capacity(items.len());
    for item in items {
        let rest = builtin_butfirst(it, vec![item])?;
        rests.push(it.require_output(rest)?);
    }
    Ok(Some(Value::list(rests)))
}

pub(crate) fn builtin_butlast(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::List(l) => {
            let items = l.borrow();
            if items.is_empty() {
                return Err(index_error(it));
            }
            Ok(Some(Value::list(items[..items.len() - 1].to_vec())))
        }
        Value::Word(w) => {
            let text = w.as_text();
            if text.is_empty() {
                return Err(index_error(it));
            }
            let mut chars: Vec<char> = text.chars().collect();
            chars.pop();
            Ok(Some(Value::word(chars.into_iter().collect::<String>())))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

/// `item index thing` — 1-based for words and lists, origin-based for arrays.
pub(crate) fn builtin_item(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let index = expect_int(it, arg(it, &args, 0)?)?;
    match arg(it, &args, 1)? {
        Value::List(l) => {
            let items = l.borrow();
            if index < 1 || index as usize > items.len() {
                return Err(index_error(it));
            }
            Ok(Some(items[index as usize - 1].clone()))
        }
        Value::Word(w) => {
            let text = w.as_text();
            if index < 1 {
                return Err(index_error(it));
            }
            let c = text.chars().nth(index as usize - 1).ok_or_else(|| index_error(it))?;
            Ok(Some(Value::word(c.to_string())))
        }
        Value::Array(a) => {
            let array = a.borrow();
            let slot = array_slot(&array, index).ok_or_else(|| index_error(it))?;
            Ok(Some(array.items[slot].clone()))
        }
    }
}

fn array_slot(array: &LogoArray, index: i64) -> Option<usize> {
    let offset = index - array.origin;
    if offset < 0 || offset as usize >= array.items.len() {
        None
    } else {
        Some(offset as usize)
    }
}

pub(crate) fn builtin_mditem(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let indexes = expect_list(it, arg(it, &args, 0)?)?;
    let indexes = indexes.borrow().clone();
    let mut current = arg(it, &args, 1)?.clone();
    for index in indexes {
        let item = builtin_item(it, vec![index, current])?;
        current = it.require_output(item)?;
    }
    Ok(Some(current))
}

pub(crate) fn builtin_pick(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::List(l) => {
            let items = l.borrow();
            if items.is_empty() {
                return Err(index_error(it));
            }
            let i = it.prng.below(items.len() as i64) as usize;
            Ok(Some(items[i].clone()))
        }
        Value::Word(w) => {
            let chars: Vec<char> = w.as_text().chars().collect();
            if chars.is_empty() {
                return Err(index_error(it));
            }
            let i = it.prng.below(chars.len() as i64) as usize;
            Ok(Some(Value::word(chars[i].to_string())))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_remove(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let thing = arg(it, &args, 0)?;
    match arg(it, &args, 1)? {
        Value::List(l) => {
            let items: Vec<Value> = l
                .borrow()
                .iter()
                .filter(|v| !values_equal(v, thing))
                .cloned()
                .collect();
            Ok(Some(Value::list(items)))
        }
        Value::Word(w) => {
            let needle = expect_word(it, thing)?;
            Ok(Some(Value::word(w.as_text().replace(&needle, ""))))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

/// Duplicate members removed; the last occurrence survives.
pub(crate) fn builtin_remdup(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let list = expect_list(it, arg(it, &args, 0)?)?;
    let items = list.borrow().clone();
    let mut kept = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if !items[i + 1..].iter().any(|later| values_equal(later, item)) {
            kept.push(item.clone());
        }
    }
    Ok(Some(Value::list(kept)))
}

pub(crate) fn builtin_quoted(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::Word(w) => Ok(Some(Value::word(format!("\"{}", w.as_text())))),
        other => Ok(Some(other.clone())),
    }
}

// ---------------------------------------------------------------------------
// Mutators
// ---------------------------------------------------------------------------

pub(crate) fn builtin_setitem(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    set_array_item(it, &args, true)
}

pub(crate) fn builtin_dot_setitem(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    set_array_item(it, &args, false)
}

fn set_array_item(it: &mut Interpreter, args: &[Value], check_circular: bool) -> RunResult {
    let index = expect_int(it, arg(it, args, 0)?)?;
    let array = expect_array(it, arg(it, args, 1)?)?;
    let value = arg(it, args, 2)?.clone();
    if check_circular && value.contains_array(&array) {
        return Err(it.err("{_PROC_}: Can't create circular array", &[]));
    }
    let mut borrow = array.borrow_mut();
    let slot = array_slot(&borrow, index).ok_or_else(|| index_error(it))?;
    borrow.items[slot] = value;
    Ok(None)
}

pub(crate) fn builtin_mdsetitem(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let indexes_list = expect_list(it, arg(it, &args, 0)?)?;
    let indexes = indexes_list.borrow().clone();
    if indexes.is_empty() {
        return Err(index_error(it));
    }
    let mut current = arg(it, &args, 1)?.clone();
    for index in &indexes[..indexes.len() - 1] {
        let item = builtin_item(it, vec![index.clone(), current])?;
        current = it.require_output(item)?;
    }
    let last = indexes[indexes.len() - 1].clone();
    set_array_item(it, &[last, current, arg(it, &args, 2)?.clone()], true)
}

pub(crate) fn builtin_dot_setfirst(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let list = expect_list(it, arg(it, &args, 0)?)?;
    let value = arg(it, &args, 1)?.clone();
    let mut items = list.borrow_mut();
    if items.is_empty() {
        return Err(it.err("{_PROC_}: Expected non-empty list", &[]));
    }
    items[0] = value;
    Ok(None)
}

/// Replaces everything after the first member. The error message for a
/// non-list destination and for an empty one is the same "Expected list".
pub(crate) fn builtin_dot_setbf(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let list = expect_list(it, arg(it, &args, 0)?)?;
    let rest = expect_list(it, arg(it, &args, 1)?)?;
    let replacement = rest.borrow().clone();
    let mut items = list.borrow_mut();
    if items.is_empty() {
        return Err(it.err("{_PROC_}: Expected list", &[]));
    }
    items.truncate(1);
    items.extend(replacement);
    Ok(None)
}

// ---------------------------------------------------------------------------
// Stacks and queues (operate on a named variable)
// ---------------------------------------------------------------------------

pub(crate) fn builtin_push(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let thing = arg(it, &args, 1)?.clone();
    let current = it.get_var(&name)?;
    let list = expect_list(it, &current)?;
    let mut items = vec![thing];
    items.extend(list.borrow().iter().cloned());
    it.set_var(&name, Value::list(items));
    Ok(None)
}

pub(crate) fn builtin_pop(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let current = it.get_var(&name)?;
    let list = expect_list(it, &current)?;
    let items = list.borrow().clone();
    let Some(first) = items.first().cloned() else {
        return Err(index_error(it));
    };
    it.set_var(&name, Value::list(items[1..].to_vec()));
    Ok(Some(first))
}

pub(crate) fn builtin_queue(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let thing = arg(it, &args, 1)?.clone();
    let current = it.get_var(&name)?;
    let list = expect_list(it, &current)?;
    let mut items = list.borrow().clone();
    items.push(thing);
    it.set_var(&name, Value::list(items));
    Ok(None)
}

pub(crate) fn builtin_dequeue(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    builtin_pop(it, args)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// `member thing group`: the tail of the group from the first occurrence of
/// the thing, or an empty group when absent.
pub(crate) fn builtin_member(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let thing = arg(it, &args, 0)?;
    match arg(it, &args, 1)? {
        Value::List(l) => {
            let items = l.borrow();
            let tail = items
                .iter()
                .position(|v| values_equal(v, thing))
                .map(|i| items[i..].to_vec())
                .unwrap_or_default();
            Ok(Some(Value::list(tail)))
        }
        Value::Word(w) => {
            let needle = expect_word(it, thing)?;
            let text = w.as_text();
            let tail = text.find(&needle).map(|i| &text[i..]).unwrap_or("");
            Ok(Some(Value::word(tail)))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_count(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let count = match arg(it, &args, 0)? {
        Value::Word(w) => w.as_text().chars().count(),
        Value::List(l) => l.borrow().len(),
        Value::Array(a) => a.borrow().items.len(),
    };
    Ok(Some(Value::num(count as f64)))
}

pub(crate) fn builtin_ascii(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let text = expect_word(it, arg(it, &args, 0)?)?;
    let c = text.chars().next().ok_or_else(|| index_error(it))?;
    Ok(Some(Value::num(c as u32 as f64)))
}

pub(crate) fn builtin_char(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let code = expect_int(it, arg(it, &args, 0)?)?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| index_error(it))?;
    Ok(Some(Value::word(c.to_string())))
}

pub(crate) fn builtin_lowercase(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let text = expect_word(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::word(text.to_lowercase())))
}

pub(crate) fn builtin_uppercase(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let text = expect_word(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::word(text.to_uppercase())))
}
