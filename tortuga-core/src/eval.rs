//! Evaluator — expression parsing, procedure dispatch, and the execution
//! driver.
//!
//! Expressions are parsed out of a mutable token cursor by precedence
//! climbing. Every parse node yields a thunk; invoking the thunk produces
//! the (possibly absent) value. Dispatch reads a routine's arguments by
//! recursively parsing one expression per expected input from the same
//! cursor, which is what makes natural arity work without separators.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::builtins;
use crate::env::{Binding, Frame, PlistTable, Prng};
use crate::error::{Flow, LocalizeFn, LogoError, Messages};
use crate::host::{Host, NullHost, TextStream, Turtle};
use crate::parser::{is_infix_word, parse_tokens, Token};
use crate::print::{routine_text, stringify, stringify_nodecorate};
use crate::value::{is_numeric_text, Value};

/// Result of invoking a thunk: a value, no value (commands), or control flow.
pub type RunResult = Result<Option<Value>, Flow>;

/// A deferred expression. Cheap to clone; re-invocable (the `WHILE` family
/// re-runs its condition thunk every iteration).
pub type Thunk = Rc<dyn Fn(&mut Interpreter) -> RunResult>;

pub type EagerFn = fn(&mut Interpreter, Vec<Value>) -> RunResult;
pub type LazyFn = fn(&mut Interpreter, &[Thunk]) -> RunResult;
pub type SpecialFn = fn(&mut Interpreter, &mut Cursor) -> Result<(), Flow>;

/// A user-defined procedure.
#[derive(Clone, Debug)]
pub struct UserProc {
    /// Original-case name, as written in `TO`.
    pub name: String,
    /// Formal input names without the leading colon.
    pub inputs: Vec<String>,
    /// Raw body tokens, up to (not including) `END`.
    pub body: Vec<Token>,
}

/// How a routine consumes its inputs.
#[derive(Clone)]
pub enum Code {
    /// Receives evaluated argument values.
    Eager(EagerFn),
    /// Receives unevaluated argument thunks (`AND`, `OR`, the `WHILE` family).
    Lazy(LazyFn),
    /// Receives the raw token cursor and consumes what it needs (`TO`).
    Special(SpecialFn),
    Defined(Rc<UserProc>),
}

/// Table entry for a callable name.
#[derive(Clone)]
pub struct Routine {
    /// Canonical display name.
    pub name: String,
    /// Natural arity: expressions consumed when called without parentheses.
    pub arity: usize,
    /// Natural arity plus optional trailing list-literal inputs (`IF`'s
    /// else block).
    pub max_arity: usize,
    pub code: Code,
    pub buried: bool,
    pub traced: bool,
    pub stepped: bool,
}

impl Routine {
    pub fn is_primitive(&self) -> bool {
        !matches!(self.code, Code::Defined(_))
    }

    pub fn is_special(&self) -> bool {
        matches!(self.code, Code::Special(_))
    }

    pub fn defined(&self) -> Option<&Rc<UserProc>> {
        match &self.code {
            Code::Defined(p) => Some(p),
            _ => None,
        }
    }
}

/// Index-advancing cursor over a token vector. Sub-expressions advance the
/// same cursor.
pub struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

pub(crate) enum ArgMode {
    Natural,
    Paren,
}

/// Hook called when a procedure is defined or erased.
pub type SaveHook = dyn FnMut(&str, Option<&str>);

/// Hook mapping a case-folded word to a canonical keyword (`END`, `ELSE`).
pub type KeywordAliasFn = dyn Fn(&str) -> Option<String>;

/// The Logo interpreter core.
pub struct Interpreter {
    pub(crate) routines: HashMap<String, Routine>,
    pub(crate) scopes: Vec<Frame>,
    pub(crate) plists: PlistTable,
    pub(crate) prng: Prng,
    pub(crate) turtle: Box<dyn Turtle>,
    pub(crate) stream: Box<dyn TextStream>,
    pub(crate) host: Box<dyn Host>,
    pub(crate) save_hook: Option<Box<SaveHook>>,
    pub(crate) keyword_alias: Option<Rc<KeywordAliasFn>>,
    pub(crate) messages: Messages,
    /// Names of routines currently being dispatched, for `{_PROC_}`.
    pub(crate) proc_stack: Vec<String>,
    /// Current `REPEAT`/`FOREVER` iteration, starting at 1; -1 outside.
    pub(crate) repcount: f64,
    pub(crate) force_bye: Rc<Cell<bool>>,
    /// `?` slot lists for template-based higher-order procedures.
    pub(crate) template_slots: Vec<Vec<Value>>,
    pub(crate) gensym_counter: u64,
}

impl Interpreter {
    pub fn new(turtle: Box<dyn Turtle>, stream: Box<dyn TextStream>) -> Self {
        let mut interp = Self {
            routines: HashMap::new(),
            scopes: vec![Frame::default()],
            plists: PlistTable::default(),
            prng: Prng::default(),
            turtle,
            stream,
            host: Box::new(NullHost),
            save_hook: None,
            keyword_alias: None,
            messages: Messages::default(),
            proc_stack: Vec::new(),
            repcount: -1.0,
            force_bye: Rc::new(Cell::new(false)),
            template_slots: Vec::new(),
            gensym_counter: 0,
        };
        builtins::install(&mut interp);
        interp
    }

    pub fn set_host(&mut self, host: Box<dyn Host>) {
        self.host = host;
    }

    pub fn set_save_hook(&mut self, hook: Option<Box<SaveHook>>) {
        self.save_hook = hook;
    }

    pub fn set_keyword_alias(&mut self, hook: Option<Rc<KeywordAliasFn>>) {
        self.keyword_alias = hook;
    }

    pub fn set_localize(&mut self, hook: Option<Rc<LocalizeFn>>) {
        self.messages.set_translator(hook);
    }

    /// Shared termination flag: set it to make the driver unwind with a
    /// `Bye` at its next statement boundary.
    pub fn bye_flag(&self) -> Rc<Cell<bool>> {
        self.force_bye.clone()
    }

    // -----------------------------------------------------------------------
    // Top-level driver
    // -----------------------------------------------------------------------

    /// Run a program. Successive calls are serialized by the `&mut`
    /// receiver; `BYE` terminates silently.
    pub fn run(&mut self, source: &str) -> Result<(), LogoError> {
        let tokens = parse_tokens(source, &self.messages)?;
        match self.execute_tokens(tokens, false) {
            Ok(_) => Ok(()),
            Err(Flow::Bye) => Ok(()),
            Err(Flow::Output(_)) => Err(self.signal_text(
                "Can only use {name:U} inside a procedure",
                &[("name", "output")],
            )),
            Err(Flow::Stop) => Err(self.signal_text(
                "Can only use {name:U} inside a procedure",
                &[("name", "stop")],
            )),
            Err(Flow::Err(e)) => Err(e),
        }
    }

    /// Execute a statement sequence. With `return_result` the last produced
    /// value is kept; without it, any produced value is an error.
    pub(crate) fn execute_tokens(&mut self, tokens: Vec<Token>, return_result: bool) -> RunResult {
        let mut cursor = Cursor::new(tokens);
        let mut last: Option<Value> = None;
        loop {
            if self.force_bye.get() {
                self.force_bye.set(false);
                return Err(Flow::Bye);
            }
            if cursor.at_end() {
                return Ok(last);
            }
            let thunk = self.expression(&mut cursor)?;
            if let Some(value) = thunk(self)? {
                if return_result {
                    last = Some(value);
                } else {
                    let text = stringify(&value);
                    return Err(self.err(
                        "Don't know what to do with {result}",
                        &[("result", &text)],
                    ));
                }
            }
            self.host.yield_now();
        }
    }

    /// Evaluate exactly one expression from a token vector, ignoring any
    /// trailing tokens (the condition-list path).
    pub(crate) fn evaluate_single(&mut self, tokens: Vec<Token>) -> RunResult {
        let mut cursor = Cursor::new(tokens);
        let thunk = self.expression(&mut cursor)?;
        thunk(self)
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    pub(crate) fn err(&self, template: &str, params: &[(&str, &str)]) -> Flow {
        Flow::Err(self.signal_text(template, params))
    }

    fn signal_text(&self, template: &str, params: &[(&str, &str)]) -> LogoError {
        let current = self
            .proc_stack
            .last()
            .map(|name| name.to_uppercase())
            .unwrap_or_default();
        let mut all: Vec<(&str, &str)> = params.to_vec();
        all.push(("_PROC_", current.as_str()));
        self.messages.format(template, &all)
    }

    /// Demand a value from a completed thunk result.
    pub(crate) fn require_output(&self, value: Option<Value>) -> Result<Value, Flow> {
        value.ok_or_else(|| self.err("No output from procedure", &[]))
    }

    /// Invoke a thunk and demand a value.
    pub(crate) fn demand(&mut self, thunk: &Thunk) -> Result<Value, Flow> {
        let value = thunk(self)?;
        self.require_output(value)
    }

    pub(crate) fn number(&self, value: &Value) -> Result<f64, Flow> {
        value
            .as_number()
            .ok_or_else(|| self.err("{_PROC_}: Expected number", &[]))
    }

    pub(crate) fn truth(&self, value: &Value) -> Result<bool, Flow> {
        value
            .truthiness()
            .ok_or_else(|| self.err("{_PROC_}: Expected true/false", &[]))
    }

    // -----------------------------------------------------------------------
    // Variables (dynamic scope)
    // -----------------------------------------------------------------------

    pub(crate) fn get_var(&self, name: &str) -> Result<Value, Flow> {
        let folded = name.to_uppercase();
        for frame in self.scopes.iter().rev() {
            if let Some(binding) = frame.get(&folded) {
                if let Some(value) = &binding.value {
                    return Ok(value.clone());
                }
                break;
            }
        }
        Err(self.err("Don't know about variable {name:U}", &[("name", name)]))
    }

    /// `MAKE`: assign through the nearest existing binding, else create a
    /// global. Lists are deep-copied on assignment; arrays stay aliased.
    pub(crate) fn set_var(&mut self, name: &str, value: Value) {
        let folded = name.to_uppercase();
        let assigned = value.deep_copy();
        if let Some(index) = self.scopes.iter().rposition(|f| f.contains(&folded)) {
            if let Some(binding) = self.scopes[index].get_mut(&folded) {
                binding.value = Some(assigned);
            }
        } else {
            self.scopes[0].insert(name, Binding::new(Some(assigned)));
        }
    }

    /// `LOCAL`: an uninitialized binding in the current frame.
    pub(crate) fn local_var(&mut self, name: &str) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.insert(name, Binding::new(None));
        }
    }

    /// `GLOBAL`: an uninitialized binding in the global frame, kept if the
    /// name already exists there.
    pub(crate) fn global_var(&mut self, name: &str) {
        let folded = name.to_uppercase();
        if !self.scopes[0].contains(&folded) {
            self.scopes[0].insert(name, Binding::new(None));
        }
    }

    pub(crate) fn has_var(&self, name: &str) -> bool {
        let folded = name.to_uppercase();
        self.scopes.iter().any(|f| f.contains(&folded))
    }

    /// Read a flag variable like `REDEFP` without raising.
    pub(crate) fn flag_enabled(&self, name: &str) -> bool {
        let folded = name.to_uppercase();
        for frame in self.scopes.iter().rev() {
            if let Some(binding) = frame.get(&folded) {
                return binding
                    .value
                    .as_ref()
                    .and_then(Value::truthiness)
                    .unwrap_or(false);
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Keywords and reparsing
    // -----------------------------------------------------------------------

    /// Match a word against a canonical keyword, honoring the alias hook.
    pub(crate) fn keyword_matches(&self, word: &str, canonical: &str) -> bool {
        let folded = word.to_uppercase();
        let mapped = self
            .keyword_alias
            .as_ref()
            .and_then(|hook| hook(&folded))
            .unwrap_or(folded);
        mapped.eq_ignore_ascii_case(canonical)
    }

    /// Re-tokenize a list (or word) so its bare words regain expression
    /// structure. List contents never carry structure, so `RUN`, condition
    /// lists, and `DEFINE` all come through here.
    pub(crate) fn reparse(&self, value: &Value) -> Result<Vec<Token>, Flow> {
        let text = match value {
            Value::List(_) => stringify_nodecorate(value),
            Value::Word(w) => w.as_text(),
            Value::Array(_) => return Err(self.err("{_PROC_}: Expected list", &[])),
        };
        let escaped = text.replace('\\', "\\\\").replace(';', "\\;");
        parse_tokens(&escaped, &self.messages).map_err(Flow::Err)
    }

    /// Evaluate a condition: a boolean-ish value, or a list re-parsed and
    /// evaluated as an expression.
    pub(crate) fn condition(&mut self, value: &Value) -> Result<bool, Flow> {
        let value = if value.is_list() {
            let tokens = self.reparse(value)?;
            let result = self.evaluate_single(tokens)?;
            self.require_output(result)?
        } else {
            value.clone()
        };
        self.truth(&value)
    }

    // -----------------------------------------------------------------------
    // Procedure registration
    // -----------------------------------------------------------------------

    pub(crate) fn prim(&mut self, names: &[&str], arity: usize, f: EagerFn) {
        self.install_routine(names, arity, arity, Code::Eager(f));
    }

    pub(crate) fn prim_max(&mut self, names: &[&str], arity: usize, max: usize, f: EagerFn) {
        self.install_routine(names, arity, max, Code::Eager(f));
    }

    pub(crate) fn lazy(&mut self, names: &[&str], arity: usize, f: LazyFn) {
        self.install_routine(names, arity, arity, Code::Lazy(f));
    }

    pub(crate) fn special(&mut self, names: &[&str], f: SpecialFn) {
        self.install_routine(names, 0, 0, Code::Special(f));
    }

    fn install_routine(&mut self, names: &[&str], arity: usize, max_arity: usize, code: Code) {
        for name in names {
            self.routines.insert(
                name.to_uppercase(),
                Routine {
                    name: names[0].to_string(),
                    arity,
                    max_arity,
                    code: code.clone(),
                    buried: false,
                    traced: false,
                    stepped: false,
                },
            );
        }
    }

    /// Register a user procedure, honoring the redefinition gates, and feed
    /// the save hook its definition text.
    pub(crate) fn define_user_proc(
        &mut self,
        name: &str,
        inputs: Vec<String>,
        body: Vec<Token>,
    ) -> Result<(), Flow> {
        let key = name.to_uppercase();
        if let Some(existing) = self.routines.get(&key) {
            if existing.is_special() {
                return Err(self.err("Can't redefine special form {name:U}", &[("name", name)]));
            }
            if existing.is_primitive() && !self.flag_enabled("REDEFP") {
                return Err(self.err("Can't redefine primitive {name:U}", &[("name", name)]));
            }
        }
        let arity = inputs.len();
        let proc = Rc::new(UserProc {
            name: name.to_string(),
            inputs,
            body,
        });
        let text = routine_text(&proc);
        self.routines.insert(
            key,
            Routine {
                name: proc.name.clone(),
                arity,
                max_arity: arity,
                code: Code::Defined(proc),
                buried: false,
                traced: false,
                stepped: false,
            },
        );
        if let Some(hook) = self.save_hook.as_mut() {
            hook(name, Some(&text));
        }
        Ok(())
    }

    /// Invoke a user procedure: fresh frame, formals bound to actuals
    /// (missing actuals stay unbound, extras are ignored). `OUTPUT` and
    /// `STOP` are caught here.
    pub(crate) fn call_user(&mut self, proc: &Rc<UserProc>, args: Vec<Value>) -> RunResult {
        let mut frame = Frame::default();
        for (i, input) in proc.inputs.iter().enumerate() {
            frame.insert(input, Binding::new(args.get(i).cloned()));
        }
        self.scopes.push(frame);
        self.proc_stack.push(proc.name.clone());
        let result = self.execute_tokens(proc.body.clone(), false);
        self.proc_stack.pop();
        self.scopes.pop();
        self.host.yield_now();
        match result {
            Ok(_) => Ok(None),
            Err(Flow::Output(value)) => Ok(Some(value)),
            Err(Flow::Stop) => Ok(None),
            Err(flow) => Err(flow),
        }
    }

    /// Call a routine by name with pre-evaluated argument values (the
    /// `APPLY`/`INVOKE`/template path).
    pub(crate) fn call_routine_values(&mut self, name: &str, args: Vec<Value>) -> RunResult {
        let key = name.to_uppercase();
        let Some(routine) = self.routines.get(&key).cloned() else {
            return Err(self.err("Don't know how to {name:U}", &[("name", name)]));
        };
        match routine.code {
            Code::Eager(f) => {
                self.proc_stack.push(routine.name.clone());
                let result = f(self, args);
                self.proc_stack.pop();
                result
            }
            Code::Defined(proc) => self.call_user(&proc, args),
            Code::Lazy(_) | Code::Special(_) => {
                Err(self.err("{_PROC_}: Expected procedure name or list", &[]))
            }
        }
    }

    /// Run a closure with a fresh `?` slot list installed.
    pub(crate) fn with_slots<R>(
        &mut self,
        slots: Vec<Value>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.template_slots.push(slots);
        let result = f(self);
        self.template_slots.pop();
        result
    }

    // -----------------------------------------------------------------------
    // Expression parsing (precedence climbing over the token cursor)
    // -----------------------------------------------------------------------

    pub(crate) fn expression(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        self.relational(cursor)
    }

    fn relational(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        let mut lhs = self.additive(cursor)?;
        while let Some(op) = peek_op(cursor, &["=", "<", ">", "<=", ">=", "<>"]) {
            cursor.advance();
            let rhs = self.additive(cursor)?;
            lhs = relational_thunk(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn additive(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        let mut lhs = self.multiplicative(cursor)?;
        while let Some(op) = peek_op(cursor, &["+", "-"]) {
            cursor.advance();
            let rhs = self.multiplicative(cursor)?;
            lhs = arith_thunk(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        let mut lhs = self.power(cursor)?;
        while let Some(op) = peek_op(cursor, &["*", "/", "%"]) {
            cursor.advance();
            let rhs = self.power(cursor)?;
            lhs = arith_thunk(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn power(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        let mut operands = vec![self.unary(cursor)?];
        while peek_op(cursor, &["^"]).is_some() {
            cursor.advance();
            operands.push(self.unary(cursor)?);
        }
        if operands.len() == 1 {
            return Ok(operands.remove(0));
        }
        // Operands evaluate left to right; the fold is right-associative.
        Ok(Rc::new(move |it| {
            let mut values = Vec::with_capacity(operands.len());
            for operand in &operands {
                let v = it.demand(operand)?;
                values.push(it.number(&v)?);
            }
            let mut acc = values.pop().unwrap_or(0.0);
            while let Some(base) = values.pop() {
                acc = base.powf(acc);
            }
            Ok(Some(Value::num(acc)))
        }))
    }

    fn unary(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        if matches!(cursor.peek(), Some(Token::Minus)) {
            cursor.advance();
            let operand = self.unary(cursor)?;
            return Ok(Rc::new(move |it| {
                let v = it.demand(&operand)?;
                let n = it.number(&v)?;
                Ok(Some(Value::num(-n)))
            }));
        }
        self.final_expr(cursor)
    }

    fn final_expr(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        let Some(token) = cursor.next() else {
            return Err(self.err("Unexpected end of instructions", &[]));
        };
        match token {
            Token::Minus => Err(self.err("Couldn't parse: '{string}'", &[("string", "-")])),
            Token::Literal(value) => Ok(Rc::new(move |_| Ok(Some(value.clone())))),
            Token::Word(word) => {
                if let Some(quoted) = word.strip_prefix('"') {
                    let value = Value::word(crate::parser::unescape_word(quoted));
                    return Ok(Rc::new(move |_| Ok(Some(value.clone()))));
                }
                if let Some(name) = word.strip_prefix(':') {
                    let name = name.to_string();
                    return Ok(Rc::new(move |it| it.get_var(&name).map(Some)));
                }
                if word == "(" {
                    return self.paren_expr(cursor);
                }
                if is_numeric_text(&word) {
                    if let Ok(n) = word.parse::<f64>() {
                        let value = Value::num(n);
                        return Ok(Rc::new(move |_| Ok(Some(value.clone()))));
                    }
                }
                self.dispatch(&word, cursor, ArgMode::Natural)
            }
        }
    }

    /// After `(`: a parenthesized procedure call if a known routine name
    /// follows and the atom after it is not an infix operator, otherwise a
    /// parenthesized sub-expression.
    fn paren_expr(&mut self, cursor: &mut Cursor) -> Result<Thunk, Flow> {
        let call_name = match cursor.peek() {
            Some(Token::Word(name))
                if name != ")"
                    && !is_infix_word(name)
                    && self.routines.contains_key(&name.to_uppercase()) =>
            {
                let next_is_infix =
                    matches!(cursor.peek_at(1), Some(Token::Word(w)) if is_infix_word(w));
                if next_is_infix {
                    None
                } else {
                    Some(name.clone())
                }
            }
            _ => None,
        };
        if let Some(name) = call_name {
            cursor.advance();
            return self.dispatch(&name, cursor, ArgMode::Paren);
        }
        let inner = self.expression(cursor)?;
        match cursor.next() {
            Some(Token::Word(w)) if w == ")" => Ok(inner),
            _ => Err(self.err("Expected ')'", &[])),
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    pub(crate) fn dispatch(
        &mut self,
        name: &str,
        cursor: &mut Cursor,
        mode: ArgMode,
    ) -> Result<Thunk, Flow> {
        let key = name.to_uppercase();
        let Some(routine) = self.routines.get(&key).cloned() else {
            // `?5` is shorthand for `(? 5)`.
            if let Some(digits) = key.strip_prefix('?') {
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(n) = digits.parse::<f64>() {
                        return Ok(Rc::new(move |it| {
                            it.call_routine_values("?", vec![Value::num(n)])
                        }));
                    }
                }
            }
            let stem = key.trim_end_matches(|c: char| c.is_ascii_digit());
            if !stem.is_empty()
                && stem.len() < key.len()
                && !stem.contains('?')
                && self.routines.contains_key(stem)
            {
                let digits = key[stem.len()..].to_string();
                return Err(self.err(
                    "Need a space between {name:U} and {value}",
                    &[("name", stem), ("value", &digits)],
                ));
            }
            return Err(self.err("Don't know how to {name:U}", &[("name", name)]));
        };

        if let Code::Special(f) = routine.code {
            self.proc_stack.push(routine.name.clone());
            let result = f(self, cursor);
            self.proc_stack.pop();
            result?;
            return Ok(Rc::new(|_| Ok(None)));
        }

        let mut args: Vec<Thunk> = Vec::new();
        match mode {
            ArgMode::Natural => {
                for _ in 0..routine.arity {
                    args.push(self.expression(cursor)?);
                }
                while args.len() < routine.max_arity {
                    match cursor.peek() {
                        Some(Token::Literal(v)) if v.is_list() => {
                            args.push(self.expression(cursor)?);
                        }
                        _ => break,
                    }
                }
            }
            ArgMode::Paren => loop {
                match cursor.peek() {
                    None => return Err(self.err("Expected ')'", &[])),
                    Some(Token::Word(w)) if w == ")" => {
                        cursor.advance();
                        break;
                    }
                    _ => args.push(self.expression(cursor)?),
                }
            },
        }

        let display = routine.name.clone();
        let thunk: Thunk = match routine.code {
            Code::Eager(f) => Rc::new(move |it| {
                let mut values = Vec::with_capacity(args.len());
                for arg in &args {
                    let v = arg(it)?;
                    values.push(it.require_output(v)?);
                }
                it.proc_stack.push(display.clone());
                let result = f(it, values);
                it.proc_stack.pop();
                result
            }),
            Code::Lazy(f) => Rc::new(move |it| {
                it.proc_stack.push(display.clone());
                let result = f(it, &args);
                it.proc_stack.pop();
                result
            }),
            Code::Defined(proc) => Rc::new(move |it| {
                let mut values = Vec::with_capacity(args.len());
                for arg in &args {
                    let v = arg(it)?;
                    values.push(it.require_output(v)?);
                }
                it.call_user(&proc, values)
            }),
            // Specials returned above.
            Code::Special(_) => Rc::new(|_| Ok(None)),
        };
        Ok(thunk)
    }
}

fn peek_op(cursor: &Cursor, ops: &[&str]) -> Option<&'static str> {
    const KNOWN: &[&str] = &["=", "<", ">", "<=", ">=", "<>", "+", "-", "*", "/", "%", "^"];
    match cursor.peek() {
        Some(Token::Word(w)) if ops.contains(&w.as_str()) => {
            KNOWN.iter().find(|k| *k == w).copied()
        }
        _ => None,
    }
}

fn arith_thunk(op: &'static str, lhs: Thunk, rhs: Thunk) -> Thunk {
    Rc::new(move |it| {
        let a = it.demand(&lhs)?;
        let a = it.number(&a)?;
        let b = it.demand(&rhs)?;
        let b = it.number(&b)?;
        let result = match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => {
                if b == 0.0 {
                    return Err(it.err("Division by zero", &[]));
                }
                a / b
            }
            _ => {
                if b == 0.0 {
                    return Err(it.err("Division by zero", &[]));
                }
                a % b
            }
        };
        Ok(Some(Value::num(result)))
    })
}

fn relational_thunk(op: &'static str, lhs: Thunk, rhs: Thunk) -> Thunk {
    Rc::new(move |it| {
        let a = it.demand(&lhs)?;
        let b = it.demand(&rhs)?;
        let result = match op {
            "=" => crate::value::values_equal(&a, &b),
            "<>" => !crate::value::values_equal(&a, &b),
            _ => {
                let x = it.number(&a)?;
                let y = it.number(&b)?;
                match op {
                    "<" => x < y,
                    ">" => x > y,
                    "<=" => x <= y,
                    _ => x >= y,
                }
            }
        };
        Ok(Some(Value::bool(result)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BufferStream, RecordingTurtle};

    fn interp() -> (Interpreter, Rc<std::cell::RefCell<String>>) {
        let stream = BufferStream::new();
        let out = stream.buffer();
        let interp = Interpreter::new(Box::new(RecordingTurtle::new()), Box::new(stream));
        (interp, out)
    }

    fn output_of(src: &str) -> String {
        let (mut it, out) = interp();
        it.run(src).expect("program runs");
        let text = out.borrow().clone();
        text
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(output_of("pr 2 + 3 * 4"), "14\n");
        assert_eq!(output_of("pr (2 + 3) * 4"), "20\n");
        assert_eq!(output_of("pr 10 - 4 - 3"), "3\n");
        assert_eq!(output_of("pr 2 ^ 3 ^ 2"), "512\n");
        assert_eq!(output_of("pr 1 < 2"), "true\n");
        assert_eq!(output_of("pr \"a = \"a"), "true\n");
        assert_eq!(output_of("pr 1 <> 2"), "true\n");
    }

    #[test]
    fn unary_minus_evaluation() {
        assert_eq!(output_of("pr 3-4"), "-1\n");
        assert_eq!(output_of("pr 3 - 4"), "-1\n");
        assert_eq!(output_of("pr (- 4)"), "-4\n");
        assert_eq!(output_of("pr -4"), "-4\n");
        assert_eq!(output_of("pr 3 * -4"), "-12\n");
    }

    #[test]
    fn division_by_zero_always_raises() {
        let (mut it, _) = interp();
        let err = it.run("pr 1 / 0").unwrap_err();
        assert_eq!(err.message, "Division by zero");
        let err = it.run("pr 1 % 0").unwrap_err();
        assert_eq!(err.message, "Division by zero");
        let err = it.run("pr quotient 1 0").unwrap_err();
        assert!(err.message.contains("Division by zero"));
    }

    #[test]
    fn natural_vs_explicit_arity() {
        assert_eq!(output_of("pr sum 1 2"), "3\n");
        assert_eq!(output_of("pr (sum 1 2 3)"), "6\n");
    }

    #[test]
    fn unknown_procedure_diagnostics() {
        let (mut it, _) = interp();
        let err = it.run("wibble").unwrap_err();
        assert_eq!(err.message, "Don't know how to WIBBLE");
        let err = it.run("fd50").unwrap_err();
        assert_eq!(err.message, "Need a space between FD and 50");
    }

    #[test]
    fn value_at_top_level_is_an_error() {
        let (mut it, _) = interp();
        let err = it.run("3 + 4").unwrap_err();
        assert_eq!(err.message, "Don't know what to do with 7");
    }

    #[test]
    fn case_insensitive_lookup() {
        assert_eq!(output_of("PRINT 1 Print 2 print 3"), "1\n2\n3\n");
        assert_eq!(output_of("make \"X 9 pr :x"), "9\n");
    }

    #[test]
    fn dynamic_scope_sees_caller_binding() {
        let src = "make \"x 5 \
                   to f output :x end \
                   to g local \"x make \"x 9 output f end \
                   pr g";
        assert_eq!(output_of(src), "9\n");
    }

    #[test]
    fn natural_arity_consumes_exact_expression_count() {
        let src = "to sq :n repeat 4 [fd :n rt 90] end sq 10 + 20";
        let stream = BufferStream::new();
        let turtle = RecordingTurtle::new();
        let log = turtle.log();
        let mut it = Interpreter::new(Box::new(turtle), Box::new(stream));
        it.run(src).expect("runs");
        let entries = log.borrow().clone();
        assert_eq!(
            entries,
            vec![
                "move(30)", "turn(90)", "move(30)", "turn(90)", "move(30)", "turn(90)",
                "move(30)", "turn(90)"
            ]
        );
    }

    #[test]
    fn output_and_stop_unwind_to_procedure_boundary() {
        assert_eq!(
            output_of("to f if 1 [output 7] pr \"unreached end pr f"),
            "7\n"
        );
        assert_eq!(
            output_of("to g pr 1 stop pr 2 end g"),
            "1\n"
        );
    }

    #[test]
    fn output_at_top_level_errors() {
        let (mut it, _) = interp();
        let err = it.run("output 5").unwrap_err();
        assert_eq!(err.message, "Can only use OUTPUT inside a procedure");
        let err = it.run("stop").unwrap_err();
        assert_eq!(err.message, "Can only use STOP inside a procedure");
    }

    #[test]
    fn bye_flag_unwinds_silently() {
        let (mut it, out) = interp();
        it.run("pr 1 bye pr 2").expect("bye is silent");
        assert_eq!(&*out.borrow(), "1\n");
    }

    #[test]
    fn recursion_with_operators() {
        let src = "to fact :n if :n < 2 [output 1] output :n * fact :n - 1 end pr fact 5";
        assert_eq!(output_of(src), "120\n");
    }

    #[test]
    fn variable_reference_reads_at_evaluation_time() {
        assert_eq!(output_of("make \"a 1 repeat 3 [pr :a make \"a :a + 1]"), "1\n2\n3\n");
    }

    #[test]
    fn paren_subexpression_vs_call() {
        // First atom names a routine: parenthesized call.
        assert_eq!(output_of("pr (sum 1 2 3)"), "6\n");
        // Routine name followed by an infix operator: sub-expression.
        assert_eq!(output_of("make \"sum 0 pr (1 + 2)"), "3\n");
    }

    #[test]
    fn missing_args_read_as_unknown_variable() {
        let (mut it, _) = interp();
        let err = it
            .run("to f :a :b output :b end pr (f 1)")
            .unwrap_err();
        assert_eq!(err.message, "Don't know about variable B");
    }

    #[test]
    fn extra_paren_args_are_ignored_for_user_procs() {
        assert_eq!(output_of("to f :a output :a end pr (f 1 2 3)"), "1\n");
    }
}
