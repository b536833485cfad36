//! Errors, control signals, and message templating.
//!
//! Every fallible operation in the interpreter returns `Result<_, Flow>`.
//! `Flow` carries either a real error or one of the three non-error control
//! signals (`Output`, `Stop`, `Bye`) that unwind to a procedure boundary or
//! to the top-level driver.

use std::rc::Rc;

use thiserror::Error;

use crate::value::Value;

/// An interpreter error with its message already localized and interpolated.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct LogoError {
    pub message: String,
}

impl LogoError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Control flow raised during evaluation.
///
/// `Output` and `Stop` are caught at the nearest user-procedure boundary;
/// `Bye` only by the top-level driver. Everything else is an error that
/// unwinds the current `run` invocation.
#[derive(Clone, Debug)]
pub enum Flow {
    Err(LogoError),
    Output(Value),
    Stop,
    Bye,
}

impl From<LogoError> for Flow {
    fn from(e: LogoError) -> Self {
        Flow::Err(e)
    }
}

/// Translator applied to message templates before parameter interpolation.
pub type LocalizeFn = dyn Fn(&str) -> Option<String>;

/// Message catalogue access: applies the optional localization hook to a
/// template, then substitutes `{name}` / `{name:U}` parameters.
#[derive(Clone, Default)]
pub struct Messages {
    translate: Option<Rc<LocalizeFn>>,
}

impl Messages {
    pub fn set_translator(&mut self, f: Option<Rc<LocalizeFn>>) {
        self.translate = f;
    }

    fn localized(&self, template: &str) -> String {
        match &self.translate {
            Some(f) => f(template).unwrap_or_else(|| template.to_string()),
            None => template.to_string(),
        }
    }

    /// Build an error from a template and named parameters.
    ///
    /// `{key}` substitutes the parameter verbatim, `{key:U}` uppercased.
    pub fn format(&self, template: &str, params: &[(&str, &str)]) -> LogoError {
        let mut message = self.localized(template);
        for (key, value) in params {
            message = message.replace(&format!("{{{key}}}"), value);
            message = message.replace(&format!("{{{key}:U}}"), &value.to_uppercase());
        }
        LogoError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_substitutes_params() {
        let messages = Messages::default();
        let err = messages.format(
            "Don't know how to {name:U}",
            &[("name", "wibble")],
        );
        assert_eq!(err.message, "Don't know how to WIBBLE");
    }

    #[test]
    fn format_applies_translator_before_interpolation() {
        let mut messages = Messages::default();
        messages.set_translator(Some(Rc::new(|template: &str| {
            if template == "Expected ']'" {
                Some("Es fehlt ']'".to_string())
            } else {
                None
            }
        })));
        assert_eq!(messages.format("Expected ']'", &[]).message, "Es fehlt ']'");
        // Untranslated templates fall through unchanged.
        assert_eq!(
            messages.format("Division by zero", &[]).message,
            "Division by zero"
        );
    }

    #[test]
    fn format_handles_plain_and_uppercase_forms() {
        let messages = Messages::default();
        let err = messages.format(
            "Need a space between {name:U} and {value}",
            &[("name", "fd"), ("value", "50")],
        );
        assert_eq!(err.message, "Need a space between FD and 50");
    }
}
