//! Workspace primitives: variable assignment, procedure definition and
//! inspection, property lists, and the erase/bury/trace families.

use super::*;
use crate::error::Flow;
use crate::eval::{Code, Cursor, Routine, RunResult};
use crate::parser::Token;
use crate::print::routine_text;
use crate::value::is_numeric_text;

pub(crate) fn install(it: &mut Interpreter) {
    it.special(&["to"], special_to);
    it.prim(&["make"], 2, builtin_make);
    it.prim(&["name"], 2, builtin_name);
    it.prim(&["local"], 1, builtin_local);
    it.prim(&["localmake"], 2, builtin_localmake);
    it.prim(&["global"], 1, builtin_global);
    it.prim(&["thing"], 1, builtin_thing);
    it.prim(&["namep", "name?"], 1, builtin_namep);
    it.prim(&["pprop"], 3, builtin_pprop);
    it.prim(&["gprop"], 2, builtin_gprop);
    it.prim(&["remprop"], 2, builtin_remprop);
    it.prim(&["plist"], 1, builtin_plist);
    it.prim(&["plistp", "plist?"], 1, builtin_plistp);
    it.prim(&["procedures"], 0, builtin_procedures);
    it.prim(&["primitives"], 0, builtin_primitives);
    it.prim(&["globals"], 0, builtin_globals);
    it.prim(&["names"], 0, builtin_names);
    it.prim(&["plists"], 0, builtin_plists);
    it.prim(&["contents"], 0, builtin_contents);
    it.prim(&["erase", "er"], 1, builtin_erase);
    it.prim(&["erall"], 0, builtin_erall);
    it.prim(&["erps"], 0, builtin_erps);
    it.prim(&["erns"], 0, builtin_erns);
    it.prim(&["erpls"], 0, builtin_erpls);
    it.prim(&["ern"], 1, builtin_ern);
    it.prim(&["erpl"], 1, builtin_erpl);
    it.prim(&["bury"], 1, builtin_bury);
    it.prim(&["unbury"], 1, builtin_unbury);
    it.prim(&["buriedp", "buried?"], 1, builtin_buriedp);
    it.prim(&["buryall"], 0, builtin_buryall);
    it.prim(&["unburyall"], 0, builtin_unburyall);
    it.prim(&["trace"], 1, builtin_trace);
    it.prim(&["untrace"], 1, builtin_untrace);
    it.prim(&["tracedp", "traced?"], 1, builtin_tracedp);
    it.prim(&["step"], 1, builtin_step);
    it.prim(&["unstep"], 1, builtin_unstep);
    it.prim(&["steppedp", "stepped?"], 1, builtin_steppedp);
    it.prim(&["def"], 1, builtin_def);
    it.prim(&["text"], 1, builtin_text_of);
    it.prim(&["fulltext"], 1, builtin_fulltext);
    it.prim(&["define"], 2, builtin_define);
    it.prim(&["copydef"], 2, builtin_copydef);
    it.prim(&["arity"], 1, builtin_arity);
    it.prim(&["primitivep", "primitive?"], 1, builtin_primitivep);
    it.prim(&["definedp", "defined?"], 1, builtin_definedp);
    it.prim(&["procedurep", "procedure?"], 1, builtin_procedurep);
}

// ---------------------------------------------------------------------------
// TO / DEFINE
// ---------------------------------------------------------------------------

/// `TO name :input… body… END` — a special form: it consumes raw tokens,
/// registers the procedure, and produces nothing.
pub(crate) fn special_to(it: &mut Interpreter, cursor: &mut Cursor) -> Result<(), Flow> {
    let name = match cursor.next() {
        Some(Token::Word(w))
            if !w.starts_with('"') && !w.starts_with(':') && !is_numeric_text(&w) =>
        {
            w
        }
        _ => return Err(it.err("{_PROC_}: Expected identifier", &[])),
    };
    let mut inputs = Vec::new();
    while let Some(Token::Word(w)) = cursor.peek() {
        let Some(input) = w.strip_prefix(':') else {
            break;
        };
        inputs.push(input.to_string());
        cursor.advance();
    }
    let mut body = Vec::new();
    loop {
        match cursor.next() {
            None => return Err(it.err("Expected END", &[])),
            Some(Token::Word(w)) if it.keyword_matches(&w, "END") => break,
            Some(token) => body.push(token),
        }
    }
    it.define_user_proc(&name, inputs, body)
}

/// `DEFINE name [[inputs] [body…]]` — same registration path as `TO`, with
/// the body re-parsed out of its bare-word list form.
pub(crate) fn builtin_define(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let spec = expect_list_of_len(it, arg(it, &args, 1)?, 2)?;
    let inputs_list = expect_list(it, &spec[0])?;
    let mut inputs = Vec::new();
    for input in inputs_list.borrow().iter() {
        let text = expect_word(it, input)?;
        inputs.push(text.strip_prefix(':').unwrap_or(&text).to_string());
    }
    let body = it.reparse(&spec[1])?;
    it.define_user_proc(&name, inputs, body)?;
    Ok(None)
}

fn user_proc(it: &Interpreter, name: &str) -> Result<std::rc::Rc<crate::eval::UserProc>, Flow> {
    match it.routines.get(&name.to_uppercase()) {
        Some(routine) => match routine.defined() {
            Some(proc) => Ok(proc.clone()),
            None => Err(it.err(
                "Can't show definition of primitive {name:U}",
                &[("name", name)],
            )),
        },
        None => Err(it.err("Don't know how to {name:U}", &[("name", name)])),
    }
}

/// Definition text, as persisted by the save hook.
pub(crate) fn builtin_def(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let proc = user_proc(it, &name)?;
    Ok(Some(Value::word(routine_text(&proc))))
}

pub(crate) fn builtin_fulltext(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    builtin_def(it, args)
}

/// `[[inputs] [body…]]`, the `DEFINE`-shaped view of a procedure.
pub(crate) fn builtin_text_of(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let proc = user_proc(it, &name)?;
    let inputs = proc.inputs.iter().map(|input| Value::word(input)).collect();
    let body = proc
        .body
        .iter()
        .map(|token| match token {
            Token::Word(w) => Value::word(w),
            Token::Minus => Value::word("-"),
            Token::Literal(v) => v.clone(),
        })
        .collect();
    Ok(Some(Value::list(vec![
        Value::list(inputs),
        Value::list(body),
    ])))
}

pub(crate) fn builtin_copydef(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let new_name = expect_name(it, arg(it, &args, 0)?)?;
    let old_name = expect_name(it, arg(it, &args, 1)?)?;
    let Some(old) = it.routines.get(&old_name.to_uppercase()).cloned() else {
        return Err(it.err("Don't know how to {name:U}", &[("name", &old_name)]));
    };
    if let Some(existing) = it.routines.get(&new_name.to_uppercase()) {
        if existing.is_special() {
            return Err(it.err(
                "Can't redefine special form {name:U}",
                &[("name", &new_name)],
            ));
        }
        if existing.is_primitive() && !it.flag_enabled("REDEFP") {
            return Err(it.err(
                "Can't redefine primitive {name:U}",
                &[("name", &new_name)],
            ));
        }
    }
    let mut copied = old;
    copied.name = new_name.clone();
    it.routines.insert(new_name.to_uppercase(), copied);
    Ok(None)
}

/// `[minimum default maximum]`; primitives accept extra explicit inputs, so
/// their maximum is unbounded (-1).
pub(crate) fn builtin_arity(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let Some(routine) = it.routines.get(&name.to_uppercase()) else {
        return Err(it.err("Don't know how to {name:U}", &[("name", &name)]));
    };
    let arity = routine.arity as f64;
    let max = match routine.code {
        Code::Eager(_) | Code::Lazy(_) => -1.0,
        Code::Special(_) => arity,
        Code::Defined(_) => arity,
    };
    Ok(Some(Value::list(vec![
        Value::num(arity),
        Value::num(arity),
        Value::num(max),
    ])))
}

pub(crate) fn builtin_primitivep(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let result = it
        .routines
        .get(&name.to_uppercase())
        .is_some_and(Routine::is_primitive);
    Ok(Some(Value::bool(result)))
}

pub(crate) fn builtin_definedp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let result = it
        .routines
        .get(&name.to_uppercase())
        .is_some_and(|r| r.defined().is_some());
    Ok(Some(Value::bool(result)))
}

pub(crate) fn builtin_procedurep(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::bool(
        it.routines.contains_key(&name.to_uppercase()),
    )))
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

pub(crate) fn builtin_make(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let value = arg(it, &args, 1)?.clone();
    it.set_var(&name, value);
    Ok(None)
}

/// `NAME value name` — `MAKE` with the inputs reversed.
pub(crate) fn builtin_name(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let value = arg(it, &args, 0)?.clone();
    let name = expect_name(it, arg(it, &args, 1)?)?;
    it.set_var(&name, value);
    Ok(None)
}

/// Accepts one name or a list of names.
fn each_name(
    it: &mut Interpreter,
    value: &Value,
    mut f: impl FnMut(&mut Interpreter, &str),
) -> Result<(), Flow> {
    match value {
        Value::List(names) => {
            let names = names.borrow().clone();
            for name in names {
                let text = expect_word(it, &name)?;
                f(it, &text);
            }
            Ok(())
        }
        other => {
            let text = expect_word(it, other)?;
            f(it, &text);
            Ok(())
        }
    }
}

pub(crate) fn builtin_local(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let target = arg(it, &args, 0)?.clone();
    each_name(it, &target, |it, name| it.local_var(name))?;
    Ok(None)
}

pub(crate) fn builtin_localmake(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    let value = arg(it, &args, 1)?.clone();
    it.local_var(&name);
    it.set_var(&name, value);
    Ok(None)
}

pub(crate) fn builtin_global(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let target = arg(it, &args, 0)?.clone();
    each_name(it, &target, |it, name| it.global_var(name))?;
    Ok(None)
}

pub(crate) fn builtin_thing(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    it.get_var(&name).map(Some)
}

pub(crate) fn builtin_namep(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::bool(it.has_var(&name))))
}

// ---------------------------------------------------------------------------
// Property lists
// ---------------------------------------------------------------------------

pub(crate) fn builtin_pprop(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let plist = expect_name(it, arg(it, &args, 0)?)?;
    let prop = expect_name(it, arg(it, &args, 1)?)?;
    let value = arg(it, &args, 2)?.clone();
    it.plists.put(&plist, &prop, value);
    Ok(None)
}

/// The empty list when either the plist or the property is absent.
pub(crate) fn builtin_gprop(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let plist = expect_name(it, arg(it, &args, 0)?)?;
    let prop = expect_name(it, arg(it, &args, 1)?)?;
    Ok(Some(
        it.plists
            .get(&plist, &prop)
            .cloned()
            .unwrap_or_else(Value::empty_list),
    ))
}

pub(crate) fn builtin_remprop(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let plist = expect_name(it, arg(it, &args, 0)?)?;
    let prop = expect_name(it, arg(it, &args, 1)?)?;
    it.plists.remove(&plist, &prop);
    Ok(None)
}

pub(crate) fn builtin_plist(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let plist = expect_name(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::list(it.plists.pairs(&plist))))
}

pub(crate) fn builtin_plistp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::bool(it.plists.has(&name))))
}

// ---------------------------------------------------------------------------
// Workspace queries
// ---------------------------------------------------------------------------

fn sorted_words(mut names: Vec<String>) -> Value {
    names.sort();
    Value::list(names.into_iter().map(Value::word).collect())
}

fn user_proc_names(it: &Interpreter) -> Vec<String> {
    it.routines
        .values()
        .filter(|r| r.defined().is_some() && !r.buried)
        .map(|r| r.name.clone())
        .collect()
}

fn variable_names(it: &Interpreter) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for frame in &it.scopes {
        for name in frame.names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

pub(crate) fn builtin_procedures(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(sorted_words(user_proc_names(it))))
}

pub(crate) fn builtin_primitives(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let names = it
        .routines
        .values()
        .filter(|r| r.is_primitive() && !r.buried)
        .map(|r| r.name.clone())
        .collect();
    Ok(Some(sorted_words(names)))
}

pub(crate) fn builtin_globals(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(sorted_words(it.scopes[0].names())))
}

pub(crate) fn builtin_names(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::list(vec![
        Value::empty_list(),
        sorted_words(variable_names(it)),
    ])))
}

pub(crate) fn builtin_plists(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(sorted_words(it.plists.names())))
}

pub(crate) fn builtin_contents(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::list(vec![
        sorted_words(user_proc_names(it)),
        sorted_words(variable_names(it)),
        sorted_words(it.plists.names()),
    ])))
}

// ---------------------------------------------------------------------------
// Erasure
// ---------------------------------------------------------------------------

fn erase_routine(it: &mut Interpreter, name: &str) -> Result<(), Flow> {
    let key = name.to_uppercase();
    let Some(routine) = it.routines.get(&key) else {
        return Err(it.err("Don't know how to {name:U}", &[("name", name)]));
    };
    if routine.is_special() {
        return Err(it.err("Can't erase special form {name:U}", &[("name", name)]));
    }
    if routine.is_primitive() && !it.flag_enabled("REDEFP") {
        return Err(it.err("Can't erase primitives unless REDEFP is TRUE", &[]));
    }
    it.routines.remove(&key);
    if let Some(hook) = it.save_hook.as_mut() {
        hook(name, None);
    }
    Ok(())
}

pub(crate) fn builtin_erase(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    match arg(it, &args, 0)? {
        Value::List(names) => {
            let names = names.borrow().clone();
            for name in names {
                let text = expect_word(it, &name)?;
                erase_routine(it, &text)?;
            }
        }
        other => {
            let text = expect_word(it, other)?;
            erase_routine(it, &text)?;
        }
    }
    Ok(None)
}

/// Erases user procedures, variables, and plists. Keys are snapshotted
/// before deletion; buried things are deleted too.
pub(crate) fn builtin_erall(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    builtin_erps(it, Vec::new())?;
    builtin_erns(it, Vec::new())?;
    builtin_erpls(it, Vec::new())?;
    Ok(None)
}

pub(crate) fn builtin_erps(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let keys: Vec<(String, String)> = it
        .routines
        .iter()
        .filter(|(_, r)| r.defined().is_some())
        .map(|(k, r)| (k.clone(), r.name.clone()))
        .collect();
    for (key, name) in keys {
        it.routines.remove(&key);
        if let Some(hook) = it.save_hook.as_mut() {
            hook(&name, None);
        }
    }
    Ok(None)
}

/// Deletes bindings from every scope, buried ones included.
pub(crate) fn builtin_erns(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    for frame in it.scopes.iter_mut() {
        for name in frame.names() {
            frame.remove(&name);
        }
    }
    Ok(None)
}

pub(crate) fn builtin_erpls(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.plists.clear();
    Ok(None)
}

/// Deletes the named binding from every scope, buried or not.
pub(crate) fn builtin_ern(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let target = arg(it, &args, 0)?.clone();
    each_name(it, &target, |it, name| {
        let folded = name.to_uppercase();
        for frame in it.scopes.iter_mut() {
            frame.remove(&folded);
        }
    })?;
    Ok(None)
}

pub(crate) fn builtin_erpl(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let target = arg(it, &args, 0)?.clone();
    each_name(it, &target, |it, name| {
        it.plists.remove_list(name);
    })?;
    Ok(None)
}

// ---------------------------------------------------------------------------
// Bury / trace / step flags
// ---------------------------------------------------------------------------

fn set_flag(it: &mut Interpreter, name: &str, flag: Flag, on: bool) {
    let key = name.to_uppercase();
    if let Some(routine) = it.routines.get_mut(&key) {
        match flag {
            Flag::Buried => routine.buried = on,
            Flag::Traced => routine.traced = on,
            Flag::Stepped => routine.stepped = on,
        }
        return;
    }
    for frame in it.scopes.iter_mut() {
        if let Some(binding) = frame.get_mut(&key) {
            match flag {
                Flag::Buried => binding.buried = on,
                Flag::Traced => binding.traced = on,
                Flag::Stepped => binding.stepped = on,
            }
        }
    }
}

fn get_flag(it: &Interpreter, name: &str, flag: Flag) -> bool {
    let key = name.to_uppercase();
    if let Some(routine) = it.routines.get(&key) {
        return match flag {
            Flag::Buried => routine.buried,
            Flag::Traced => routine.traced,
            Flag::Stepped => routine.stepped,
        };
    }
    for frame in it.scopes.iter().rev() {
        if let Some(binding) = frame.get(&key) {
            return match flag {
                Flag::Buried => binding.buried,
                Flag::Traced => binding.traced,
                Flag::Stepped => binding.stepped,
            };
        }
    }
    false
}

#[derive(Clone, Copy)]
enum Flag {
    Buried,
    Traced,
    Stepped,
}

fn flag_builtin(it: &mut Interpreter, args: &[Value], flag: Flag, on: bool) -> RunResult {
    let target = arg(it, args, 0)?.clone();
    each_name(it, &target, |it, name| set_flag(it, name, flag, on))?;
    Ok(None)
}

pub(crate) fn builtin_bury(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    flag_builtin(it, &args, Flag::Buried, true)
}

pub(crate) fn builtin_unbury(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    flag_builtin(it, &args, Flag::Buried, false)
}

pub(crate) fn builtin_buriedp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::bool(get_flag(it, &name, Flag::Buried))))
}

pub(crate) fn builtin_buryall(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let proc_names: Vec<String> = user_proc_names(it);
    for name in proc_names {
        set_flag(it, &name, Flag::Buried, true);
    }
    for name in variable_names(it) {
        set_flag(it, &name, Flag::Buried, true);
    }
    Ok(None)
}

pub(crate) fn builtin_unburyall(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let keys: Vec<String> = it.routines.keys().cloned().collect();
    for key in keys {
        if let Some(routine) = it.routines.get_mut(&key) {
            routine.buried = false;
        }
    }
    for frame in it.scopes.iter_mut() {
        for (_, binding) in frame.bindings_mut() {
            binding.buried = false;
        }
    }
    Ok(None)
}

pub(crate) fn builtin_trace(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    flag_builtin(it, &args, Flag::Traced, true)
}

pub(crate) fn builtin_untrace(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    flag_builtin(it, &args, Flag::Traced, false)
}

pub(crate) fn builtin_tracedp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::bool(get_flag(it, &name, Flag::Traced))))
}

pub(crate) fn builtin_step(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    flag_builtin(it, &args, Flag::Stepped, true)
}

pub(crate) fn builtin_unstep(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    flag_builtin(it, &args, Flag::Stepped, false)
}

pub(crate) fn builtin_steppedp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_name(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::bool(get_flag(it, &name, Flag::Stepped))))
}
