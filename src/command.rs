use crate::env::ShellContext;
use anyhow::Result;
use std::fmt;
use std::io::Write;

/// What the read/execute loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    /// Show the next prompt.
    Continue,
    /// Leave the loop and terminate the shell.
    ShellExit,
}

/// Answer of the builtin dispatch table for one head command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A builtin ran; show the next prompt.
    Continue,
    /// A builtin ran and asked the shell to exit.
    Exit,
    /// No builtin claims the command; resolve it as an external program.
    NotHandled,
}

/// One of the three redirection slots of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectKind {
    /// `<path`: standard input is read from the file.
    Input,
    /// `>path`: standard output truncates the file.
    Output,
    /// `>>path`: standard output appends to the file.
    Append,
}

impl RedirectKind {
    /// Operator as written on the command line.
    pub fn symbol(self) -> &'static str {
        match self {
            RedirectKind::Input => "<",
            RedirectKind::Output => ">",
            RedirectKind::Append => ">>",
        }
    }
}

/// Redirect targets of a single stage.
///
/// `Output` and `Append` share the standard output stream, so setting one of
/// them clears the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirects {
    input: Option<String>,
    output: Option<String>,
    append: Option<String>,
}

impl Redirects {
    pub fn set(&mut self, kind: RedirectKind, path: impl Into<String>) {
        let path = path.into();
        match kind {
            RedirectKind::Input => self.input = Some(path),
            RedirectKind::Output => {
                self.append = None;
                self.output = Some(path);
            }
            RedirectKind::Append => {
                self.output = None;
                self.append = Some(path);
            }
        }
    }

    pub fn get(&self, kind: RedirectKind) -> Option<&str> {
        match kind {
            RedirectKind::Input => self.input.as_deref(),
            RedirectKind::Output => self.output.as_deref(),
            RedirectKind::Append => self.append.as_deref(),
        }
    }

    /// Path standard input is read from, if redirected.
    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    /// Where standard output goes, if redirected, and whether it appends.
    pub fn output(&self) -> Option<(RedirectKind, &str)> {
        match (&self.output, &self.append) {
            (Some(path), _) => Some((RedirectKind::Output, path)),
            (None, Some(path)) => Some((RedirectKind::Append, path)),
            (None, None) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none() && self.append.is_none()
    }

    /// Set slots in `Input`, `Output`, `Append` order.
    pub fn iter(&self) -> impl Iterator<Item = (RedirectKind, &str)> {
        [RedirectKind::Input, RedirectKind::Output, RedirectKind::Append]
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|path| (kind, path)))
    }
}

/// One stage of a pipeline.
///
/// `args` does not contain `name`; it is put back in front as `argv[0]` when
/// the program is launched. An empty `name` marks a blank input line.
/// Only the head stage carries meaningful `background` and `autocomplete`
/// flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    pub redirects: Redirects,
    pub background: bool,
    pub autocomplete: bool,
    next: Option<Box<Command>>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn redirect(mut self, kind: RedirectKind, path: impl Into<String>) -> Self {
        self.redirects.set(kind, path);
        self
    }

    /// The stage this one pipes into.
    pub fn next(&self) -> Option<&Command> {
        self.next.as_deref()
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty()
    }

    /// Argument vector as handed to the program: name first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &str) -> fmt::Result {
    let needs_quotes = word.is_empty()
        || word.contains([' ', '\t'])
        || word.starts_with(['<', '>'])
        || word == "|"
        || word == "&";
    if !needs_quotes {
        return f.write_str(word);
    }
    let quote = if word.contains('"') { '\'' } else { '"' };
    write!(f, "{quote}{word}{quote}")
}

impl fmt::Display for Command {
    /// Formats this stage only, without the stages it pipes into.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            f.write_str(" ")?;
            write_word(f, arg)?;
        }
        for (kind, path) in self.redirects.iter() {
            write!(f, " {}{}", kind.symbol(), path)?;
        }
        Ok(())
    }
}

/// An owned, non-empty chain of [`Command`] stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    head: Command,
}

impl Pipeline {
    pub fn head(&self) -> &Command {
        &self.head
    }

    /// Stages in execution order, head first.
    pub fn stages(&self) -> Stages<'_> {
        Stages {
            current: Some(&self.head),
        }
    }

    pub fn len(&self) -> usize {
        self.stages().count()
    }

    pub fn is_background(&self) -> bool {
        self.head.background
    }

    pub fn wants_completion(&self) -> bool {
        self.head.autocomplete
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{stage}")?;
        }
        if self.head.background {
            f.write_str(" &")?;
        } else if self.head.autocomplete {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Iterator over the stages of a [`Pipeline`].
pub struct Stages<'a> {
    current: Option<&'a Command>,
}

impl<'a> Iterator for Stages<'a> {
    type Item = &'a Command;

    fn next(&mut self) -> Option<Self::Item> {
        let stage = self.current?;
        self.current = stage.next();
        Some(stage)
    }
}

/// Collects stages left to right and links them into a [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    stages: Vec<Command>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Command) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Links the collected stages. Without any stage the result holds a
    /// single blank command.
    pub fn build(self) -> Pipeline {
        let mut next: Option<Box<Command>> = None;
        for mut stage in self.stages.into_iter().rev() {
            stage.next = next;
            next = Some(Box::new(stage));
        }
        Pipeline {
            head: next.map(|head| *head).unwrap_or_default(),
        }
    }
}

/// Object-safe trait for a builtin that is ready to run.
pub trait ExecutableCommand {
    /// Runs the builtin, writing its output to `stdout`.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, ctx: &mut ShellContext)
        -> Result<Dispatch>;
}

/// Factory that tries to claim a head command as a builtin.
///
/// Returns `None` when the factory doesn't recognize the command, in which
/// case the next factory (and finally the executor) gets a chance.
pub trait CommandFactory {
    /// Name the factory answers to.
    fn name(&self) -> &'static str;

    /// Attempt to create a builtin instance for the provided command.
    fn try_create(
        &self,
        ctx: &ShellContext,
        command: &Command,
    ) -> Option<Box<dyn ExecutableCommand>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_links_stages_in_order() {
        let mut builder = PipelineBuilder::new();
        builder
            .push(Command::new("cat").arg("notes.txt"))
            .push(Command::new("grep").arg("todo"))
            .push(Command::new("wc").arg("-l"));
        let pipeline = builder.build();

        let names: Vec<&str> = pipeline.stages().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cat", "grep", "wc"]);
        assert_eq!(pipeline.len(), 3);
        assert!(pipeline.stages().last().unwrap().next().is_none());
    }

    #[test]
    fn empty_builder_yields_blank_head() {
        let pipeline = PipelineBuilder::new().build();
        assert_eq!(pipeline.len(), 1);
        assert!(pipeline.head().is_blank());
    }

    #[test]
    fn output_and_append_are_exclusive() {
        let mut redirects = Redirects::default();
        redirects.set(RedirectKind::Output, "a.txt");
        redirects.set(RedirectKind::Append, "b.txt");
        assert_eq!(redirects.output(), Some((RedirectKind::Append, "b.txt")));
        assert_eq!(redirects.get(RedirectKind::Output), None);

        redirects.set(RedirectKind::Output, "c.txt");
        assert_eq!(redirects.output(), Some((RedirectKind::Output, "c.txt")));
        assert_eq!(redirects.get(RedirectKind::Append), None);
    }

    #[test]
    fn argv_puts_name_first() {
        let command = Command::new("ls").arg("-l").arg("/tmp");
        assert_eq!(command.argv(), vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn display_quotes_words_with_spaces() {
        let mut builder = PipelineBuilder::new();
        builder
            .push(
                Command::new("grep")
                    .arg("a b")
                    .redirect(RedirectKind::Input, "in.txt"),
            )
            .push(Command::new("sort").redirect(RedirectKind::Append, "out.txt"));
        let pipeline = builder.build();
        assert_eq!(
            pipeline.to_string(),
            r#"grep "a b" <in.txt | sort >>out.txt"#
        );
    }
}
