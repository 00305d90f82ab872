//! seashell: a small interactive Unix shell.
//!
//! A line typed at the prompt goes through three steps. The [`editor`] reads
//! it with the terminal in raw mode, the [`parser`] turns it into a
//! [`Pipeline`] of [`Command`] stages, and the shell either runs a builtin
//! from the [`builtin`] dispatch table or hands the pipeline to the
//! [`Executor`], which launches one process per stage.
//!
//! The main entry point is [`Shell`]. [`parse`] and [`Executor`] can be used
//! on their own to run command lines non-interactively.

pub mod builtin;
pub mod command;
pub mod completion;
pub mod config;
pub mod editor;
pub mod env;
pub mod error;
pub mod executor;
mod external;
pub mod parser;
mod shell;

pub use command::{Command, ExitSignal, Pipeline};
pub use config::Config;
pub use executor::Executor;
pub use parser::parse;
pub use shell::Shell;
