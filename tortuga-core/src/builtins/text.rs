//! Console primitives: printing and line input.

use super::*;
use crate::eval::RunResult;
use crate::parser::parse_list_text;
use crate::print::{stringify, stringify_nodecorate};

pub(crate) fn install(it: &mut Interpreter) {
    it.prim(&["print", "pr"], 1, builtin_print);
    it.prim(&["type"], 1, builtin_type);
    it.prim(&["show"], 1, builtin_show);
    it.prim(&["readword"], 0, builtin_readword);
    it.prim(&["readlist"], 0, builtin_readlist);
    it.prim(&["cleartext", "ct"], 0, builtin_cleartext);
}

/// Top-level lists print without brackets, joined by spaces, newline added.
pub(crate) fn builtin_print(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let parts: Vec<String> = args.iter().map(stringify_nodecorate).collect();
    it.stream.write(&parts.join(" "));
    it.stream.write("\n");
    Ok(None)
}

/// Like `PRINT` but with no separator and no newline.
pub(crate) fn builtin_type(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    for value in &args {
        let text = stringify_nodecorate(value);
        it.stream.write(&text);
    }
    Ok(None)
}

/// Fully decorated form, brackets kept.
pub(crate) fn builtin_show(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let parts: Vec<String> = args.iter().map(stringify).collect();
    it.stream.write(&parts.join(" "));
    it.stream.write("\n");
    Ok(None)
}

/// `readword` / `(readword prompt)` — one line as a word.
pub(crate) fn builtin_readword(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let prompt = match args.first() {
        Some(v) => Some(expect_word(it, v)?),
        None => None,
    };
    let line = it.stream.read(prompt.as_deref());
    Ok(Some(Value::word(line)))
}

/// `readlist` — one line structured into a list of bare words.
pub(crate) fn builtin_readlist(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let prompt = match args.first() {
        Some(v) => Some(expect_word(it, v)?),
        None => None,
    };
    let line = it.stream.read(prompt.as_deref());
    let items = parse_list_text(&line, &it.messages).map_err(Flow::Err)?;
    Ok(Some(Value::list(items)))
}

pub(crate) fn builtin_cleartext(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.stream.clear();
    Ok(None)
}
