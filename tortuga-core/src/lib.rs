//! Core of a Logo interpreter: lexer, structuring parser, thunk-based
//! expression evaluator, procedure dispatcher, dynamic scopes, and the
//! primitive library.
//!
//! The crate renders nothing and reads nothing itself: turtle graphics, the
//! text console, and the host scheduler are injected through the traits in
//! [`host`], and procedure persistence/localization through the hooks on
//! [`Interpreter`].
//!
//! ```
//! use tortuga_core::host::{BufferStream, RecordingTurtle};
//! use tortuga_core::Interpreter;
//!
//! let stream = BufferStream::new();
//! let out = stream.buffer();
//! let mut logo = Interpreter::new(Box::new(RecordingTurtle::new()), Box::new(stream));
//! logo.run("pr sum 1 2").unwrap();
//! assert_eq!(&*out.borrow(), "3\n");
//! ```

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod host;
pub mod parser;
pub mod print;
pub mod value;

pub use error::{Flow, LogoError};
pub use eval::{Interpreter, RunResult, Thunk};
pub use parser::{parse_tokens, Token};
pub use value::{Value, Word};
