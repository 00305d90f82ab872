use super::BuiltinCommand;
use crate::command::Dispatch;
use crate::env::ShellContext;
use anyhow::{Context, Result, bail};
use argh::FromArgs;
use log::info;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process;
use std::sync::LazyLock;

static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})$").expect("time pattern is valid"));

#[derive(FromArgs)]
/// Schedule a daily alarm that plays a song at the given time.
pub struct GoodMorning {
    #[argh(positional)]
    /// wake-up time as HH.MM, e.g. 7.30
    pub time: String,

    #[argh(positional)]
    /// uri of the song, handed to rhythmbox-client
    pub uri: String,

    #[argh(positional, greedy)]
    /// ignored
    pub extra: Vec<String>,
}

impl GoodMorning {
    /// Hour and minute of `time`.
    fn parse_time(&self) -> Result<(u32, u32)> {
        let Some(caps) = TIME.captures(&self.time) else {
            bail!("{}: expected time as HH.MM", self.time);
        };
        let hour: u32 = caps[1].parse()?;
        let minute: u32 = caps[2].parse()?;
        if hour > 23 || minute > 59 {
            bail!("{}: no such time of day", self.time);
        }
        Ok((hour, minute))
    }

    fn cron_line(&self) -> Result<String> {
        let (hour, minute) = self.parse_time()?;
        Ok(format!(
            "{} {} * * * DISPLAY=:0.0 rhythmbox-client --play-uri {}\n",
            minute, hour, self.uri
        ))
    }

    /// Replaces the contents of `file` with the alarm entry.
    fn write_cron_file(&self, file: &Path) -> Result<()> {
        let line = self.cron_line()?;
        fs::write(file, line).with_context(|| format!("{}", file.display()))
    }
}

impl BuiltinCommand for GoodMorning {
    fn name() -> &'static str {
        "goodMorning"
    }

    fn accepts(args: &[String]) -> bool {
        args.len() >= 2
    }

    fn execute(self, _stdout: &mut dyn Write, ctx: &mut ShellContext) -> Result<Dispatch> {
        ctx.config.ensure_config_dir()?;
        let file = ctx.config.cron_file();
        self.write_cron_file(&file)?;

        info!("installing crontab from {}", file.display());
        let status = process::Command::new("crontab")
            .arg(&file)
            .status()
            .context("can't run crontab")?;
        if !status.success() {
            bail!("crontab exited with {}", status);
        }
        Ok(Dispatch::Continue)
    }
}

#[derive(FromArgs)]
/// Play the chimney animation.
pub struct Baca {}

impl BuiltinCommand for Baca {
    fn name() -> &'static str {
        "baca"
    }

    fn accepts(args: &[String]) -> bool {
        args.is_empty()
    }

    fn execute(self, _stdout: &mut dyn Write, ctx: &mut ShellContext) -> Result<Dispatch> {
        let script = ctx.config.animation_script();
        if !script.is_file() {
            bail!("{}: animation script not found", script.display());
        }
        let status = process::Command::new("python3")
            .arg(&script)
            .status()
            .context("can't run python3")?;
        if !status.success() {
            bail!("python3 exited with {}", status);
        }
        Ok(Dispatch::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::tests::test_context;

    fn alarm(time: &str) -> GoodMorning {
        GoodMorning {
            time: time.to_string(),
            uri: "file:///music/song.mp3".to_string(),
            extra: Vec::new(),
        }
    }

    #[test]
    fn time_is_hour_dot_minute() {
        assert_eq!(alarm("7.30").parse_time().unwrap(), (7, 30));
        assert_eq!(alarm("23.05").parse_time().unwrap(), (23, 5));
        assert!(alarm("7:30").parse_time().is_err());
        assert!(alarm("24.00").parse_time().is_err());
        assert!(alarm("7.60").parse_time().is_err());
        assert!(alarm("123.4").parse_time().is_err());
    }

    #[test]
    fn cron_file_holds_one_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("cronfile.txt");
        fs::write(&file, "stale entry\n").unwrap();

        alarm("6.45").write_cron_file(&file).unwrap();
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "45 6 * * * DISPLAY=:0.0 rhythmbox-client --play-uri file:///music/song.mp3\n"
        );
    }

    #[test]
    fn bad_time_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = test_context(tmp.path());
        assert!(alarm("noon").execute(&mut Vec::<u8>::new(), &mut ctx).is_err());
        assert!(!ctx.config.cron_file().exists());
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let cmd = GoodMorning::from_args(&["goodMorning"], &["7.30", "song", "loud"]).unwrap();
        assert_eq!(
            cmd.cron_line().unwrap(),
            "30 7 * * * DISPLAY=:0.0 rhythmbox-client --play-uri song\n"
        );
    }

    #[test]
    fn argument_counts_decide_ownership() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(!GoodMorning::accepts(&args(&["7.30"])));
        assert!(GoodMorning::accepts(&args(&["7.30", "song"])));
        assert!(Baca::accepts(&[]));
        assert!(!Baca::accepts(&args(&["x"])));
    }

    #[test]
    fn baca_without_script_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = test_context(tmp.path());
        assert!(Baca {}.execute(&mut Vec::<u8>::new(), &mut ctx).is_err());
    }
}
