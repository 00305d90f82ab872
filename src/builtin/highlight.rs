use super::BuiltinCommand;
use crate::command::Dispatch;
use crate::env::ShellContext;
use anyhow::{Context, Result, bail};
use argh::FromArgs;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+").expect("token pattern is valid"));

const RESET: &str = "\x1b[0m";

#[derive(FromArgs)]
/// Print a file with every occurrence of a word on a colored background.
pub struct Highlight {
    #[argh(positional)]
    /// the word to highlight; only whole whitespace-separated tokens match
    pub word: String,

    #[argh(positional)]
    /// background color: r, g or b
    pub color: String,

    #[argh(positional)]
    /// file to print
    pub file: String,

    #[argh(positional, greedy)]
    /// ignored
    pub extra: Vec<String>,
}

fn background(color: &str) -> Option<&'static str> {
    match color {
        "r" => Some("\x1b[41m"),
        "g" => Some("\x1b[42m"),
        "b" => Some("\x1b[44m"),
        _ => None,
    }
}

/// Copies `text` to `stdout`, wrapping tokens equal to `word` in `color`.
fn write_highlighted(
    stdout: &mut dyn Write,
    text: &str,
    word: &str,
    color: &str,
) -> Result<()> {
    let mut last = 0;
    for m in TOKEN.find_iter(text) {
        if m.as_str() != word {
            continue;
        }
        stdout.write_all(text[last..m.start()].as_bytes())?;
        write!(stdout, "{}{}{}", color, word, RESET)?;
        last = m.end();
    }
    stdout.write_all(text[last..].as_bytes())?;
    if !text.is_empty() && !text.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}

impl BuiltinCommand for Highlight {
    fn name() -> &'static str {
        "highlight"
    }

    fn accepts(args: &[String]) -> bool {
        args.len() >= 3
    }

    fn execute(self, stdout: &mut dyn Write, _ctx: &mut ShellContext) -> Result<Dispatch> {
        let Some(color) = background(&self.color) else {
            bail!("{}: unknown color (expected r, g or b)", self.color);
        };
        let bytes = fs::read(&self.file).with_context(|| self.file.clone())?;
        let text = String::from_utf8_lossy(&bytes);
        write_highlighted(stdout, &text, &self.word, color)?;
        Ok(Dispatch::Continue)
    }
}
