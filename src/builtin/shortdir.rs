use super::BuiltinCommand;
use crate::command::Dispatch;
use crate::env::ShellContext;
use anyhow::{Context, Result, bail};
use argh::FromArgs;
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SEPARATOR: char = '$';

#[derive(FromArgs)]
/// Remember directories under short names and jump back to them.
/// Actions: set <name>, jump <name>, del <name>, clear, list.
pub struct Shortdir {
    #[argh(positional)]
    /// one of set, jump, del, clear or list.
    pub action: String,

    #[argh(positional)]
    /// bookmark name, required by set, jump and del.
    pub name: Option<String>,
}

/// One `name$dir` line of the bookmark file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bookmark {
    name: String,
    dir: PathBuf,
}

impl Bookmark {
    fn parse(line: &str) -> Option<Self> {
        let (name, dir) = line.split_once(SEPARATOR)?;
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            dir: PathBuf::from(dir),
        })
    }
}

fn load(file: &Path) -> Result<Vec<Bookmark>> {
    let text = match fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("{}", file.display())),
    };
    Ok(text.lines().filter_map(Bookmark::parse).collect())
}

fn store(file: &Path, bookmarks: &[Bookmark]) -> Result<()> {
    let mut text = String::new();
    for b in bookmarks {
        text.push_str(&format!("{}{}{}\n", b.name, SEPARATOR, b.dir.display()));
    }
    fs::write(file, text).with_context(|| format!("{}", file.display()))
}

impl Shortdir {
    fn required_name(&self) -> Result<&str> {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => bail!("{}: missing bookmark name", self.action),
        }
    }
}

impl BuiltinCommand for Shortdir {
    fn name() -> &'static str {
        "shortdir"
    }

    fn execute(self, stdout: &mut dyn Write, ctx: &mut ShellContext) -> Result<Dispatch> {
        let file = ctx.config.bookmarks_file();
        match self.action.as_str() {
            "set" => {
                let name = self.required_name()?;
                if name.contains(SEPARATOR) {
                    bail!("bookmark names can't contain '{}'", SEPARATOR);
                }
                ctx.config.ensure_config_dir()?;
                let mut bookmarks = load(&file)?;
                bookmarks.retain(|b| b.name != name);
                bookmarks.push(Bookmark {
                    name: name.to_string(),
                    dir: ctx.current_dir.clone(),
                });
                store(&file, &bookmarks)?;
                debug!("bookmarked {} as {}", ctx.current_dir.display(), name);
            }
            "jump" => {
                let name = self.required_name()?;
                let Some(bookmark) = load(&file)?.into_iter().find(|b| b.name == name) else {
                    bail!("{}: no such bookmark", name);
                };
                ctx.change_dir(&bookmark.dir)?;
            }
            "del" => {
                let name = self.required_name()?;
                let mut bookmarks = load(&file)?;
                let before = bookmarks.len();
                bookmarks.retain(|b| b.name != name);
                if bookmarks.len() == before {
                    bail!("{}: no such bookmark", name);
                }
                store(&file, &bookmarks)?;
            }
            "clear" => match fs::remove_file(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e).with_context(|| format!("{}", file.display())),
            },
            "list" => {
                for b in load(&file)? {
                    writeln!(stdout, "name: {} directory: {}", b.name, b.dir.display())?;
                }
            }
            other => bail!("{}: unknown action (expected set, jump, del, clear or list)", other),
        }
        Ok(Dispatch::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::tests::{lock_current_dir, test_context};
    use std::env as stdenv;

    fn run(ctx: &mut ShellContext, action: &str, name: Option<&str>) -> Result<String> {
        let cmd = Shortdir {
            action: action.to_string(),
            name: name.map(str::to_string),
        };
        let mut out = Vec::new();
        cmd.execute(&mut out, ctx)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn set_then_list() {
        let cfg = tempfile::tempdir().unwrap();
        let mut ctx = test_context(cfg.path());
        ctx.current_dir = PathBuf::from("/srv/project");

        run(&mut ctx, "set", Some("proj")).unwrap();
        ctx.current_dir = PathBuf::from("/var/log");
        run(&mut ctx, "set", Some("logs")).unwrap();

        assert_eq!(
            fs::read_to_string(ctx.config.bookmarks_file()).unwrap(),
            "proj$/srv/project\nlogs$/var/log\n"
        );
        assert_eq!(
            run(&mut ctx, "list", None).unwrap(),
            "name: proj directory: /srv/project\nname: logs directory: /var/log\n"
        );
    }

    #[test]
    fn set_replaces_existing_name() {
        let cfg = tempfile::tempdir().unwrap();
        let mut ctx = test_context(cfg.path());
        ctx.current_dir = PathBuf::from("/a");
        run(&mut ctx, "set", Some("x")).unwrap();
        ctx.current_dir = PathBuf::from("/b");
        run(&mut ctx, "set", Some("x")).unwrap();
        assert_eq!(run(&mut ctx, "list", None).unwrap(), "name: x directory: /b\n");
    }

    #[test]
    fn del_and_clear() {
        let cfg = tempfile::tempdir().unwrap();
        let mut ctx = test_context(cfg.path());
        ctx.current_dir = PathBuf::from("/a");
        run(&mut ctx, "set", Some("a")).unwrap();
        run(&mut ctx, "set", Some("b")).unwrap();

        run(&mut ctx, "del", Some("a")).unwrap();
        assert_eq!(run(&mut ctx, "list", None).unwrap(), "name: b directory: /a\n");
        assert!(run(&mut ctx, "del", Some("a")).is_err());

        run(&mut ctx, "clear", None).unwrap();
        assert!(!ctx.config.bookmarks_file().exists());
        assert_eq!(run(&mut ctx, "list", None).unwrap(), "");
        run(&mut ctx, "clear", None).unwrap();
    }

    #[test]
    fn jump_changes_directory() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let cfg = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(target.path()).unwrap();

        let mut ctx = test_context(cfg.path());
        ctx.current_dir = canonical.clone();
        run(&mut ctx, "set", Some("t")).unwrap();
        ctx.current_dir = orig.clone();

        run(&mut ctx, "jump", Some("t")).unwrap();
        assert_eq!(ctx.current_dir, canonical);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn jump_to_unknown_name_fails() {
        let cfg = tempfile::tempdir().unwrap();
        let mut ctx = test_context(cfg.path());
        let err = run(&mut ctx, "jump", Some("nowhere")).unwrap_err();
        assert_eq!(err.to_string(), "nowhere: no such bookmark");
    }

    #[test]
    fn bad_usage_is_an_error() {
        let cfg = tempfile::tempdir().unwrap();
        let mut ctx = test_context(cfg.path());
        assert!(run(&mut ctx, "set", None).is_err());
        assert!(run(&mut ctx, "set", Some("a$b")).is_err());
        assert!(run(&mut ctx, "frobnicate", None).is_err());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        assert_eq!(Bookmark::parse("no separator"), None);
        assert_eq!(Bookmark::parse("$/tmp"), None);
        assert_eq!(
            Bookmark::parse("home$/home/me"),
            Some(Bookmark {
                name: "home".to_string(),
                dir: PathBuf::from("/home/me"),
            })
        );
    }
}
