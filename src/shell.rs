use crate::builtin::DispatchTable;
use crate::command::{Dispatch, ExitSignal};
use crate::completion;
use crate::config::{Config, SHELL_NAME};
use crate::editor::{Input, LineEditor};
use crate::env::ShellContext;
use crate::executor::Executor;
use crate::parser;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::io::{self, Write};

/// The interactive shell: reads lines, runs builtins and launches pipelines.
///
/// Example
/// ```no_run
/// use seashell::{Config, Shell};
/// Shell::new(Config::from_env()).run().unwrap();
/// ```
pub struct Shell {
    ctx: ShellContext,
    editor: LineEditor,
    builtins: DispatchTable,
    executor: Executor,
    hostname: String,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        let hostname = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(err) => {
                warn!("can't read hostname: {}", err);
                String::from("localhost")
            }
        };
        Self {
            ctx: ShellContext::new(config),
            editor: LineEditor::new(),
            builtins: DispatchTable::default(),
            executor: Executor::new(),
            hostname,
        }
    }

    /// Runs the read/execute loop until `exit` or Ctrl-D.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.executor.reap_background();

            let mut stdout = io::stdout();
            write!(stdout, "{}", self.prompt())?;
            stdout.flush()?;

            let line = match self.editor.read_line().context("can't read input")? {
                Input::Line(line) => line,
                Input::Exit => break,
            };
            if let ExitSignal::ShellExit = self.handle_line(&line) {
                break;
            }
        }
        println!();
        Ok(())
    }

    /// Parses and runs one line of input.
    pub fn handle_line(&mut self, line: &str) -> ExitSignal {
        let pipeline = parser::parse(line);
        debug!("parsed `{}` into {} stage(s)", pipeline, pipeline.len());

        let head = pipeline.head();
        if pipeline.wants_completion() && !head.name.is_empty() {
            let candidates = completion::complete(
                head,
                &self.builtins.names(),
                &self.executor.search_path(),
                &self.ctx.current_dir,
            );
            if !candidates.is_empty() {
                println!("{}", candidates.join(" "));
            }
            return ExitSignal::Continue;
        }

        match self.builtins.dispatch(head, &mut self.ctx) {
            Dispatch::Continue => ExitSignal::Continue,
            Dispatch::Exit => ExitSignal::ShellExit,
            Dispatch::NotHandled => self.executor.execute(pipeline),
        }
    }

    /// `<user>@<hostname>:<cwd> seashell$ `
    pub fn prompt(&self) -> String {
        format!(
            "{}@{}:{} {}$ ",
            self.ctx.user(),
            self.hostname,
            self.ctx.current_dir.display(),
            SHELL_NAME
        )
    }
}
