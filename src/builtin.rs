//! Builtins and the dispatch table that routes head commands to them.

mod highlight;
mod kdiff;
mod schedule;
mod shortdir;

pub use highlight::Highlight;
pub use kdiff::Kdiff;
pub use schedule::{Baca, GoodMorning};
pub use shortdir::Shortdir;

use crate::command::{Command, CommandFactory, Dispatch, ExecutableCommand};
use crate::env::ShellContext;
use crate::error::report;
use crate::executor::open_redirect;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use log::{debug, warn};
use std::io::{self, Write};
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// in-process, or through one helper subprocess they wait for.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "kdiff".
    fn name() -> &'static str;

    /// Whether the builtin claims a call with these arguments.
    ///
    /// Unclaimed calls fall through to external program lookup.
    fn accepts(_args: &[String]) -> bool {
        true
    }

    /// Executes the command, writing regular output to `stdout`.
    fn execute(self, stdout: &mut dyn Write, ctx: &mut ShellContext) -> Result<Dispatch>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<Dispatch> {
        match <T as BuiltinCommand>::execute(*self, stdout, ctx) {
            Ok(x) => Ok(x),
            Err(e) => {
                report(format_args!("{}: {:#}", T::name(), e));
                Ok(Dispatch::Continue)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _ctx: &mut ShellContext,
    ) -> Result<Dispatch> {
        if self.is_error {
            eprintln!("{}", self.output);
        } else {
            writeln!(stdout, "{}", self.output)?;
        }
        Ok(Dispatch::Continue)
    }
}

/// Factory allows creating instances of a builtin.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn try_create(
        &self,
        _ctx: &ShellContext,
        command: &Command,
    ) -> Option<Box<dyn ExecutableCommand>> {
        if command.name != T::name() || !T::accepts(&command.args) {
            return None;
        }
        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        Some(match T::from_args(&[T::name()], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

/// Maps head command names to builtins.
///
/// The first factory that claims a command runs it; [`Dispatch::NotHandled`]
/// means the executor should launch an external program instead.
pub struct DispatchTable {
    factories: Vec<Box<dyn CommandFactory>>,
}

impl DispatchTable {
    /// Create a dispatch table with a custom set of factories.
    pub fn new(factories: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { factories }
    }

    /// Names of all builtins, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Offers the head command to each builtin in turn.
    ///
    /// A builtin's standard output follows the head's `>`/`>>` redirect.
    /// Pipeline stages after a builtin are not run.
    pub fn dispatch(&self, command: &Command, ctx: &mut ShellContext) -> Dispatch {
        let Some(builtin) = self
            .factories
            .iter()
            .find_map(|factory| factory.try_create(ctx, command))
        else {
            return Dispatch::NotHandled;
        };
        debug!("running builtin {}", command.name);
        if command.next().is_some() {
            warn!("{}: builtin output is not piped, later stages ignored", command.name);
        }

        let mut stdout: Box<dyn Write> = match command.redirects.output() {
            Some((kind, path)) => match open_redirect(&command.name, kind, path) {
                Ok(file) => Box::new(file),
                Err(err) => {
                    report(&err);
                    return Dispatch::Continue;
                }
            },
            None => Box::new(io::stdout()),
        };

        let result = builtin
            .execute(&mut stdout, ctx)
            .and_then(|dispatch| stdout.flush().map(|_| dispatch).map_err(Into::into));
        match result {
            Ok(dispatch) => dispatch,
            Err(err) => {
                report(format_args!("{}: {:#}", command.name, err));
                Dispatch::Continue
            }
        }
    }
}

impl Default for DispatchTable {
    /// Create a dispatch table with every builtin of the shell.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Shortdir>::default()),
            Box::new(Factory::<Kdiff>::default()),
            Box::new(Factory::<Highlight>::default()),
            Box::new(Factory::<GoodMorning>::default()),
            Box::new(Factory::<Baca>::default()),
        ])
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, ctx: &mut ShellContext) -> Result<Dispatch> {
        let target = match self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match ctx.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => anyhow::bail!("no target and HOME not set"),
            },
        };
        ctx.change_dir(&target)?;
        Ok(Dispatch::Continue)
    }
}
