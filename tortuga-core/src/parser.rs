//! Lexer and structuring parser: source text → atom stream.
//!
//! Produces a flat sequence of atoms; `[ … ]` bodies become nested list
//! values and `{ … }` bodies become array values (with an optional trailing
//! `@origin`). Whitespace sensitivity around `-` decides unary vs binary;
//! unary minus is emitted as the distinct `Token::Minus` sentinel, never as
//! the word `-`.

use crate::error::{LogoError, Messages};
use crate::value::{values_equal, Value, Word};

/// One atom of the token stream.
#[derive(Clone, Debug)]
pub enum Token {
    /// Procedure names, number literals, operators, `"quoted` and `:ref` words.
    Word(String),
    /// The unary-minus sentinel.
    Minus,
    /// A bracketed list or braced array literal.
    Literal(Value),
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Word(a), Token::Word(b)) => a == b,
            (Token::Minus, Token::Minus) => true,
            (Token::Literal(a), Token::Literal(b)) => values_equal(a, b),
            _ => false,
        }
    }
}

const OPERATOR_CHARS: &str = "+-*/%^=<>";
const GROUPING_CHARS: &str = "[]{}()";

fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(c)
}

fn is_grouping_char(c: char) -> bool {
    GROUPING_CHARS.contains(c)
}

pub(crate) fn is_infix_word(word: &str) -> bool {
    matches!(
        word,
        "+" | "-" | "*" | "/" | "%" | "^" | "=" | "<" | ">" | "<=" | ">=" | "<>"
    )
}

/// Strip backslash escapes from a finished atom, producing its value text.
pub fn unescape_word(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Tokenize a whole source text.
pub fn parse_tokens(input: &str, messages: &Messages) -> Result<Vec<Token>, LogoError> {
    let mut scanner = Scanner::new(input, messages);
    let mut out: Vec<Token> = Vec::new();
    loop {
        let leading_space = scanner.skip_space_and_comments();
        let Some(c) = scanner.current() else {
            return Ok(out);
        };
        match c {
            '[' => {
                scanner.bump();
                let items = scanner.list_body()?;
                out.push(Token::Literal(Value::list(items)));
            }
            '{' => {
                scanner.bump();
                let (items, origin) = scanner.array_body()?;
                out.push(Token::Literal(Value::array(items, origin)));
            }
            ']' | '}' => {
                return Err(scanner.unparsable(c));
            }
            '"' => {
                out.push(Token::Word(scanner.quoted_word()));
            }
            '\u{2190}'..='\u{2193}' => {
                scanner.bump();
                out.push(Token::Word(c.to_string()));
            }
            '0'..='9' => {
                out.push(Token::Word(scanner.number_word()));
            }
            '-' => {
                scanner.bump();
                let trailing_space = scanner.current().map_or(true, |c| c.is_whitespace());
                let after_opener = matches!(out.last(), Some(Token::Word(w)) if w == "(");
                let after_infix =
                    matches!(out.last(), Some(Token::Word(w)) if is_infix_word(w));
                let unary = out.is_empty()
                    || after_infix
                    || after_opener
                    || (leading_space && !trailing_space);
                if unary {
                    out.push(Token::Minus);
                } else {
                    out.push(Token::Word("-".to_string()));
                }
            }
            c if is_operator_char(c) || is_grouping_char(c) => {
                out.push(Token::Word(scanner.operator()));
            }
            _ => {
                out.push(Token::Word(scanner.bare_word()));
            }
        }
    }
}

/// Parse bare text as list contents (the `READLIST` path): whitespace
/// separated words, with nested `[ … ]` / `{ … }` structure.
pub fn parse_list_text(input: &str, messages: &Messages) -> Result<Vec<Value>, LogoError> {
    let mut scanner = Scanner::new(input, messages);
    scanner.list_items(None)
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    messages: &'a Messages,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, messages: &'a Messages) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            messages,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn unparsable(&self, c: char) -> LogoError {
        self.messages
            .format("Couldn't parse: '{string}'", &[("string", &c.to_string())])
    }

    // -- Skip policy ---------------------------------------------------------

    /// Skip whitespace, `~`-newline continuations, and `;` comments.
    /// Returns true if anything was consumed.
    fn skip_space_and_comments(&mut self) -> bool {
        let start = self.pos;
        loop {
            match self.current() {
                Some(c) if c.is_whitespace() => self.bump(),
                Some('~') if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                Some(';') => {
                    self.bump();
                    loop {
                        match self.current() {
                            None | Some('\n') => break,
                            // A comment line ending in ~ swallows the newline
                            // and keeps commenting on the next line.
                            Some('~') if self.peek_at(1) == Some('\n') => {
                                self.bump();
                                self.bump();
                            }
                            Some(_) => self.bump(),
                        }
                    }
                }
                _ => return self.pos != start,
            }
        }
    }

    // -- Atom scanners -------------------------------------------------------

    /// `"word` — consume until whitespace or one of `[](){}`.
    fn quoted_word(&mut self) -> String {
        let mut word = String::from('"');
        self.bump();
        while let Some(c) = self.current() {
            if c.is_whitespace() || is_grouping_char(c) {
                break;
            }
            if c == '\\' {
                word.push(c);
                self.bump();
                if let Some(escaped) = self.current() {
                    word.push(escaped);
                    self.bump();
                }
                continue;
            }
            word.push(c);
            self.bump();
        }
        word
    }

    /// Number literal: digits, optional `.digits`, optional `e±digits`.
    fn number_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.current() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            word.push('.');
            self.bump();
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    word.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if let Some(e @ ('e' | 'E')) = self.current() {
            let sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_offset = if sign { 2 } else { 1 };
            if self.peek_at(digit_offset).is_some_and(|c| c.is_ascii_digit()) {
                word.push(e);
                self.bump();
                if sign {
                    if let Some(s) = self.current() {
                        word.push(s);
                    }
                    self.bump();
                }
                while let Some(c) = self.current() {
                    if c.is_ascii_digit() {
                        word.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        word
    }

    /// Operator atom; recognizes the two-character `<=`, `>=`, `<>`.
    fn operator(&mut self) -> String {
        let c = self.current().unwrap_or(' ');
        self.bump();
        if c == '<' && matches!(self.current(), Some('=' | '>')) {
            let second = self.current().unwrap_or('=');
            self.bump();
            return format!("<{second}");
        }
        if c == '>' && self.current() == Some('=') {
            self.bump();
            return ">=".to_string();
        }
        c.to_string()
    }

    /// Ordinary word: consume until whitespace or an operator/grouping char.
    fn bare_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current() {
            if c.is_whitespace() || is_operator_char(c) || is_grouping_char(c) {
                break;
            }
            if c == '\\' {
                word.push(c);
                self.bump();
                if let Some(escaped) = self.current() {
                    word.push(escaped);
                    self.bump();
                }
                continue;
            }
            word.push(c);
            self.bump();
        }
        word
    }

    // -- Structured literals -------------------------------------------------

    /// Items of a `[ … ]` body; `closer` is None when scanning to EOF
    /// (the READLIST path).
    fn list_items(&mut self, closer: Option<char>) -> Result<Vec<Value>, LogoError> {
        let mut items = Vec::new();
        loop {
            self.skip_space_and_comments();
            match self.current() {
                None => {
                    return match closer {
                        None => Ok(items),
                        Some(']') => Err(self.messages.format("Expected ']'", &[])),
                        Some(_) => Err(self.messages.format("Expected '}'", &[])),
                    };
                }
                Some(c) if Some(c) == closer => {
                    self.bump();
                    return Ok(items);
                }
                Some('[') => {
                    self.bump();
                    items.push(Value::list(self.list_body()?));
                }
                Some('{') => {
                    self.bump();
                    let (body, origin) = self.array_body()?;
                    items.push(Value::array(body, origin));
                }
                Some(']' | '}') => {
                    // A closer for the wrong bracket kind, or one at top level.
                    let c = self.current().unwrap_or(']');
                    return Err(self.unparsable(c));
                }
                Some(_) => {
                    let raw = self.list_word();
                    items.push(Value::Word(Word::text(unescape_word(&raw))));
                }
            }
        }
    }

    fn list_body(&mut self) -> Result<Vec<Value>, LogoError> {
        self.list_items(Some(']'))
    }

    fn array_body(&mut self) -> Result<(Vec<Value>, i64), LogoError> {
        let items = self.list_items(Some('}'))?;
        Ok((items, self.array_origin()))
    }

    /// Optional `@origin` after a closing brace.
    fn array_origin(&mut self) -> i64 {
        let saved = self.pos;
        while self.current().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
        if self.current() != Some('@') {
            self.pos = saved;
            return 1;
        }
        self.bump();
        let mut text = String::new();
        if self.current() == Some('-') {
            text.push('-');
            self.bump();
        }
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        text.parse::<i64>().unwrap_or(1)
    }

    /// A bare word inside list/array context: only whitespace and brackets
    /// delimit; operators and parens are ordinary characters here.
    fn list_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current() {
            if c.is_whitespace() || matches!(c, '[' | ']' | '{' | '}') {
                break;
            }
            if c == '\\' {
                word.push(c);
                self.bump();
                if let Some(escaped) = self.current() {
                    word.push(escaped);
                    self.bump();
                }
                continue;
            }
            word.push(c);
            self.bump();
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lex(input: &str) -> Vec<Token> {
        parse_tokens(input, &Messages::default()).expect("lexes")
    }

    fn words(input: &str) -> Vec<String> {
        lex(input)
            .into_iter()
            .map(|t| match t {
                Token::Word(w) => w,
                Token::Minus => "<UM>".to_string(),
                Token::Literal(v) => crate::print::stringify(&v),
            })
            .collect()
    }

    #[test]
    fn words_and_numbers() {
        assert_eq!(words("fd 50 rt 90"), ["fd", "50", "rt", "90"]);
        assert_eq!(words("print 2.5e3"), ["print", "2.5e3"]);
    }

    #[test]
    fn operators_including_two_char() {
        assert_eq!(words("1<=2 3<>4 5>=6"), ["1", "<=", "2", "3", "<>", "4", "5", ">=", "6"]);
    }

    #[test]
    fn unary_minus_disambiguation() {
        // 3-4: no space either side of minus, previous atom is a number: binary.
        assert_eq!(words("3-4"), ["3", "-", "4"]);
        // Space before but not after: unary.
        assert_eq!(words("3 -4"), ["3", "<UM>", "4"]);
        // Space both sides: binary.
        assert_eq!(words("3 - 4"), ["3", "-", "4"]);
        // First atom: unary.
        assert_eq!(words("-4"), ["<UM>", "4"]);
        // After an infix operator: unary.
        assert_eq!(words("3 * -4"), ["3", "*", "<UM>", "4"]);
        // After an open paren: unary.
        assert_eq!(words("(- 4)"), ["(", "<UM>", "4", ")"]);
    }

    #[test]
    fn quoted_words_stop_at_delimiters() {
        assert_eq!(words("pr \"hello"), ["pr", "\"hello"]);
        assert_eq!(words("pr \"a(b"), ["pr", "\"a", "(", "b"]);
        // Operators do not terminate quoted words.
        assert_eq!(words("pr \"3-4"), ["pr", "\"3-4"]);
    }

    #[test]
    fn comments_and_continuations() {
        assert_eq!(words("fd 50 ; go forward\nrt 90"), ["fd", "50", "rt", "90"]);
        assert_eq!(words("fd ~\n50"), ["fd", "50"]);
        // Comment continued across a line by a trailing ~.
        assert_eq!(words("fd 50 ; part one ~\npart two\nrt 90"), ["fd", "50", "rt", "90"]);
    }

    #[test]
    fn list_literals_nest() {
        let toks = lex("repeat 4 [fd 50 [a b] rt 90]");
        let Token::Literal(list) = &toks[2] else {
            panic!("expected list literal, got {:?}", toks[2]);
        };
        let items = list.as_list().unwrap().borrow();
        assert_eq!(items.len(), 6);
        assert!(items[2].is_list());
    }

    #[test]
    fn list_words_keep_operators_whole() {
        let toks = lex("run [3+4]");
        let Token::Literal(list) = &toks[1] else {
            panic!("expected list literal");
        };
        let items = list.as_list().unwrap().borrow();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_word().unwrap().as_text(), "3+4");
    }

    #[test]
    fn array_literals_and_origin() {
        let toks = lex("{1 2 3}");
        let Token::Literal(v) = &toks[0] else {
            panic!("expected array literal");
        };
        assert_eq!(v.as_array().unwrap().borrow().origin, 1);

        let toks = lex("{a b} @0");
        let Token::Literal(v) = &toks[0] else {
            panic!("expected array literal");
        };
        assert_eq!(v.as_array().unwrap().borrow().origin, 0);
        assert_eq!(toks.len(), 1);
    }

    #[test]
    fn unclosed_brackets_error() {
        let messages = Messages::default();
        assert_eq!(
            parse_tokens("[a b", &messages).unwrap_err().message,
            "Expected ']'"
        );
        assert_eq!(
            parse_tokens("{a b", &messages).unwrap_err().message,
            "Expected '}'"
        );
        assert_eq!(
            parse_tokens("]", &messages).unwrap_err().message,
            "Couldn't parse: ']'"
        );
    }

    #[test]
    fn escapes_survive_as_pairs() {
        assert_eq!(words("pr \"a\\ b"), ["pr", "\"a\\ b"]);
        assert_eq!(unescape_word("a\\ b"), "a b");
        assert_eq!(unescape_word("a\\[b"), "a[b");
    }

    #[test]
    fn arrow_keys_are_single_char_words() {
        assert_eq!(words("\u{2190}\u{2191}"), ["\u{2190}", "\u{2191}"]);
    }

    #[test]
    fn parse_list_text_structures_readlist_input() {
        let items = parse_list_text("a [b c] 3", &Messages::default()).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[1].is_list());
    }

    proptest! {
        #[test]
        fn integer_literals_lex_as_single_word(n in 0u32..1_000_000) {
            let text = n.to_string();
            let toks = lex(&text);
            prop_assert_eq!(toks.len(), 1);
            prop_assert_eq!(&toks[0], &Token::Word(text));
        }

        #[test]
        fn spaced_binary_minus_never_becomes_unary(a in 0i32..1000, b in 0i32..1000) {
            let toks = lex(&format!("{} - {}", a, b));
            prop_assert_eq!(toks.len(), 3);
            prop_assert_eq!(&toks[1], &Token::Word("-".to_string()));
        }

        #[test]
        fn tight_trailing_minus_is_unary(a in 0i32..1000, b in 0i32..1000) {
            let toks = lex(&format!("{} -{}", a, b));
            prop_assert_eq!(toks.len(), 3);
            prop_assert_eq!(&toks[1], &Token::Minus);
        }
    }
}
