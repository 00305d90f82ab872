use super::BuiltinCommand;
use crate::command::Dispatch;
use crate::env::ShellContext;
use anyhow::{Context, Result, bail};
use argh::FromArgs;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(FromArgs)]
/// Compare two files line by line (-a, the default) or byte by byte (-b).
pub struct Kdiff {
    #[argh(switch, short = 'a')]
    /// compare text files line by line
    pub lines: bool,

    #[argh(switch, short = 'b')]
    /// compare files byte by byte
    pub bytes: bool,

    #[argh(positional)]
    /// first file
    pub first: String,

    #[argh(positional)]
    /// second file
    pub second: String,
}

/// Everything after the first dot of the file name, or "" without one.
fn extension(file: &str) -> &str {
    let name = Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file);
    name.split_once('.').map(|(_, ext)| ext).unwrap_or("")
}

fn read(file: &str) -> Result<Vec<u8>> {
    fs::read(file).with_context(|| file.to_string())
}

impl Kdiff {
    fn diff_lines(&self, stdout: &mut dyn Write) -> Result<()> {
        if extension(&self.first) != extension(&self.second) {
            writeln!(stdout, "Files are not text files.")?;
            return Ok(());
        }
        let first = String::from_utf8_lossy(&read(&self.first)?).into_owned();
        let second = String::from_utf8_lossy(&read(&self.second)?).into_owned();
        let first: Vec<&str> = first.lines().collect();
        let second: Vec<&str> = second.lines().collect();

        let mut different = 0;
        for (n, (a, b)) in first.iter().zip(&second).enumerate() {
            if a != b {
                writeln!(stdout, "{} : Line: {} : {}", self.first, n + 1, a)?;
                writeln!(stdout, "{} : Line: {} : {}", self.second, n + 1, b)?;
                different += 1;
            }
        }
        different += first.len().abs_diff(second.len());

        if different == 0 {
            writeln!(stdout, "The two files are identical")?;
        } else {
            writeln!(stdout, "{} different lines found", different)?;
        }
        Ok(())
    }

    fn diff_bytes(&self, stdout: &mut dyn Write) -> Result<()> {
        let first = read(&self.first)?;
        let second = read(&self.second)?;
        let different = first.iter().zip(&second).filter(|(a, b)| a != b).count()
            + first.len().abs_diff(second.len());

        if different == 0 {
            writeln!(stdout, "The two files are identical")?;
        } else {
            writeln!(stdout, "The two files are different in {} bytes", different)?;
        }
        Ok(())
    }
}

impl BuiltinCommand for Kdiff {
    fn name() -> &'static str {
        "kdiff"
    }

    fn execute(self, stdout: &mut dyn Write, _ctx: &mut ShellContext) -> Result<Dispatch> {
        if self.lines && self.bytes {
            bail!("-a and -b can't be combined");
        }
        if self.bytes {
            self.diff_bytes(stdout)?;
        } else {
            self.diff_lines(stdout)?;
        }
        Ok(Dispatch::Continue)
    }
}
