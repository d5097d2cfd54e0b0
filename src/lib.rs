//! A small interactive shell with tab-completion of command names.
//!
//! Input is read one byte at a time in raw terminal mode by [`LineEditor`], which
//! echoes and edits the line itself and completes the first word against the
//! executables on `PATH`. Finished lines are split into words by [`lexer::tokenize`]
//! and run by [`Interpreter`], either as a builtin (`echo`, `pwd`, `cd`, `type`,
//! `exit`) or as an external program spawned with an explicit argument vector.
//!
//! The public modules [`command`] and [`env`] expose traits and types for
//! implementing your own commands and for interacting with the shell environment.
//! Terminal input is abstracted behind [`io_adapters::ByteSource`] so whole sessions
//! can be replayed from memory.

mod builtin;
pub mod command;
pub mod completion;
pub mod editor;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logging;
pub mod raw_mode;

pub use builtin::is_builtin;
pub use editor::LineEditor;
pub use error::ShellError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use io_adapters::{ScriptedBytes, StdinBytes};
