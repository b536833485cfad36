//! Logo value representation and fundamental operations.
//!
//! A value is a word (string or number), a list, or an array. Lists and
//! arrays are shared-mutable: lists are deep-copied on variable assignment,
//! arrays are aliased even then and compare by identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

/// Shared handle to a mutable list body.
pub type ListHandle = Rc<RefCell<Vec<Value>>>;

/// Shared handle to a mutable array body.
pub type ArrayHandle = Rc<RefCell<LogoArray>>;

/// An atomic Logo value: text or a number.
///
/// A word remembers which way it was written so source text round-trips,
/// but text that parses as a number compares numerically.
#[derive(Clone, Debug)]
pub enum Word {
    Text(Rc<str>),
    Num(f64),
}

/// Fixed-size mutable vector with an integer origin (default 1).
#[derive(Clone, Debug)]
pub struct LogoArray {
    pub origin: i64,
    pub items: Vec<Value>,
}

/// Runtime Logo value.
#[derive(Clone, Debug)]
pub enum Value {
    Word(Word),
    List(ListHandle),
    Array(ArrayHandle),
}

static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();

/// True if `text` is a numeric word: `-?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?`.
pub fn is_numeric_text(text: &str) -> bool {
    let re = NUMERIC_RE.get_or_init(|| {
        Regex::new(r"^-?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$").expect("numeric word pattern")
    });
    re.is_match(text)
}

/// Canonical text for a number: shortest decimal form, `-0` folded to `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{}", n)
}

impl Word {
    pub fn text(s: impl AsRef<str>) -> Self {
        Word::Text(Rc::from(s.as_ref()))
    }

    /// The word's text content (numbers in canonical form).
    pub fn as_text(&self) -> String {
        match self {
            Word::Text(s) => s.to_string(),
            Word::Num(n) => format_number(*n),
        }
    }

    /// Numeric reading of the word, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Word::Num(n) => Some(*n),
            Word::Text(s) => {
                if is_numeric_text(s) {
                    s.parse::<f64>().ok()
                } else {
                    None
                }
            }
        }
    }
}

impl Value {
    pub fn word(s: impl AsRef<str>) -> Self {
        Value::Word(Word::text(s))
    }

    pub fn num(n: f64) -> Self {
        Value::Word(Word::Num(n))
    }

    /// The words `true` / `false`.
    pub fn bool(b: bool) -> Self {
        Value::word(if b { "true" } else { "false" })
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn array(items: Vec<Value>, origin: i64) -> Self {
        Value::Array(Rc::new(RefCell::new(LogoArray { origin, items })))
    }

    pub fn empty_list() -> Self {
        Value::list(Vec::new())
    }

    // -----------------------------------------------------------------------
    // Type probes
    // -----------------------------------------------------------------------

    pub fn is_word(&self) -> bool {
        matches!(self, Value::Word(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_number(&self) -> bool {
        self.as_number().is_some()
    }

    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Value::Word(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        self.as_word().and_then(Word::as_number)
    }

    pub fn as_list(&self) -> Option<&ListHandle> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayHandle> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Truth reading: the words `true`/`false` (any case), or any numeric
    /// word where nonzero is true.
    pub fn truthiness(&self) -> Option<bool> {
        let word = self.as_word()?;
        if let Word::Text(s) = word {
            if s.eq_ignore_ascii_case("true") {
                return Some(true);
            }
            if s.eq_ignore_ascii_case("false") {
                return Some(false);
            }
        }
        word.as_number().map(|n| n != 0.0)
    }

    /// Deep copy: lists are copied recursively, arrays stay aliased,
    /// words are cheap clones. This is the `MAKE` assignment rule.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Word(w) => Value::Word(w.clone()),
            Value::List(l) => {
                let items = l.borrow().iter().map(Value::deep_copy).collect();
                Value::list(items)
            }
            Value::Array(a) => Value::Array(a.clone()),
        }
    }

    /// True if `self` transitively contains the given array (identity).
    /// Used to reject circular arrays on `setitem`/`mdsetitem`.
    pub fn contains_array(&self, target: &ArrayHandle) -> bool {
        match self {
            Value::Word(_) => false,
            Value::List(l) => l.borrow().iter().any(|v| v.contains_array(target)),
            Value::Array(a) => {
                Rc::ptr_eq(a, target)
                    || a.borrow().items.iter().any(|v| v.contains_array(target))
            }
        }
    }
}

/// Logo equality: numeric words compare by value when both sides parse as
/// numbers, otherwise words compare as exact text; lists compare
/// element-wise; arrays compare by identity only.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Word(a), Value::Word(b)) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_text() == b.as_text(),
        },
        (Value::List(a), Value::List(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let a = a.borrow();
            let b = b.borrow();
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Identity equality: words by exact text, lists and arrays by handle.
pub fn values_identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Word(a), Value::Word(b)) => a.as_text() == b.as_text(),
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::print::stringify(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_probe() {
        assert!(is_numeric_text("12"));
        assert!(is_numeric_text("-12"));
        assert!(is_numeric_text(".5"));
        assert!(is_numeric_text("2.5"));
        assert!(is_numeric_text("1e5"));
        assert!(is_numeric_text("-2.5e-3"));
        assert!(!is_numeric_text("3."));
        assert!(!is_numeric_text("abc"));
        assert!(!is_numeric_text("1.2.3"));
        assert!(!is_numeric_text(""));
    }

    #[test]
    fn word_equality_is_numeric_when_both_parse() {
        assert!(values_equal(&Value::word("3"), &Value::num(3.0)));
        assert!(values_equal(&Value::word("3.0"), &Value::word("3")));
        assert!(!values_equal(&Value::word("3a"), &Value::word("3")));
        // Non-numeric words are case-sensitive text.
        assert!(!values_equal(&Value::word("Foo"), &Value::word("foo")));
        assert!(values_equal(&Value::word("foo"), &Value::word("foo")));
    }

    #[test]
    fn list_equality_is_structural() {
        let a = Value::list(vec![Value::num(1.0), Value::word("2")]);
        let b = Value::list(vec![Value::word("1"), Value::num(2.0)]);
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn array_equality_is_identity() {
        let a = Value::array(vec![Value::num(1.0)], 1);
        let b = Value::array(vec![Value::num(1.0)], 1);
        assert!(!values_equal(&a, &b));
        assert!(values_equal(&a, &a.clone()));
    }

    #[test]
    fn deep_copy_detaches_lists_but_aliases_arrays() {
        let inner = Value::list(vec![Value::num(1.0)]);
        let arr = Value::array(vec![Value::num(9.0)], 1);
        let original = Value::list(vec![inner.clone(), arr.clone()]);
        let copy = original.deep_copy();

        inner.as_list().unwrap().borrow_mut().push(Value::num(2.0));
        let copied_inner = copy.as_list().unwrap().borrow()[0].clone();
        assert_eq!(copied_inner.as_list().unwrap().borrow().len(), 1);

        let copied_arr = copy.as_list().unwrap().borrow()[1].clone();
        assert!(Rc::ptr_eq(
            copied_arr.as_array().unwrap(),
            arr.as_array().unwrap()
        ));
    }

    #[test]
    fn circularity_probe_finds_nested_target() {
        let target = Value::array(vec![Value::num(1.0)], 1);
        let handle = target.as_array().unwrap().clone();
        let wrapped = Value::list(vec![Value::list(vec![target.clone()])]);
        assert!(wrapped.contains_array(&handle));
        let other = Value::list(vec![Value::num(5.0)]);
        assert!(!other.contains_array(&handle));
    }

    #[test]
    fn truthiness_reads_booleans_and_numbers() {
        assert_eq!(Value::word("TRUE").truthiness(), Some(true));
        assert_eq!(Value::word("False").truthiness(), Some(false));
        assert_eq!(Value::num(0.0).truthiness(), Some(false));
        assert_eq!(Value::num(2.0).truthiness(), Some(true));
        assert_eq!(Value::word("banana").truthiness(), None);
        assert_eq!(Value::empty_list().truthiness(), None);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-1.5), "-1.5");
    }
}
