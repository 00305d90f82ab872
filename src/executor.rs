//! Launches a parsed [`Pipeline`] as a chain of operating-system processes.
//!
//! Every stage is resolved before anything is spawned. Stage `i`'s standard
//! output feeds stage `i + 1` through an anonymous pipe unless a file
//! redirect claims that end; the file always wins.

use crate::command::{Command, ExitSignal, Pipeline, RedirectKind};
use crate::error::{report, ShellError, ShellResult};
use crate::external::find_command_path;
use log::{debug, warn};
use std::env;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{self, Child, ChildStdout, ExitStatus, Stdio};

/// How a pipeline run ended.
#[derive(Debug)]
pub enum Outcome {
    /// Blank line; nothing was launched.
    Skipped,
    /// The line asked the shell to exit.
    Exit,
    /// Foreground run; status of the last stage.
    Finished(ExitStatus),
    /// Background run; the number of stages left running.
    Detached(usize),
}

/// A spawned stage the executor still has to reap.
#[derive(Debug)]
struct Job {
    name: String,
    child: Child,
}

/// Runs pipelines and keeps track of children that were not waited for.
#[derive(Debug, Default)]
pub struct Executor {
    search_path: Option<OsString>,
    jobs: Vec<Job>,
}

impl Executor {
    /// Executor resolving programs against the `PATH` of the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor resolving programs against a fixed search path.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
            jobs: Vec::new(),
        }
    }

    /// Number of background children not reaped yet.
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Runs a pipeline, reporting failures to the user.
    ///
    /// The pipeline is consumed: it is released once the run is over, whether
    /// it succeeded or not.
    pub fn execute(&mut self, pipeline: Pipeline) -> ExitSignal {
        match self.run(&pipeline) {
            Ok(Outcome::Exit) => ExitSignal::ShellExit,
            Ok(_) => ExitSignal::Continue,
            Err(err) => {
                report(&err);
                ExitSignal::Continue
            }
        }
    }

    /// Runs a pipeline and returns how it ended.
    pub fn run(&mut self, pipeline: &Pipeline) -> ShellResult<Outcome> {
        self.reap_background();

        let head = pipeline.head();
        if head.is_blank() {
            return Ok(Outcome::Skipped);
        }
        if head.name == "exit" {
            return Ok(Outcome::Exit);
        }

        for (before, stage) in pipeline.stages().zip(pipeline.stages().skip(1)) {
            if stage.is_blank() {
                return Err(ShellError::EmptyStage {
                    after: before.name.clone(),
                });
            }
        }

        let programs = pipeline
            .stages()
            .map(|stage| self.resolve(stage))
            .collect::<ShellResult<Vec<PathBuf>>>()?;

        let stage_count = programs.len();
        let mut spawned: Vec<Job> = Vec::with_capacity(stage_count);
        let mut upstream: Option<ChildStdout> = None;
        for (i, (stage, program)) in pipeline.stages().zip(&programs).enumerate() {
            let is_last = i + 1 == stage_count;
            match spawn_stage(stage, program, upstream.take(), i > 0, is_last) {
                Ok(mut child) => {
                    debug!("spawned {} as pid {}", stage.name, child.id());
                    if !is_last {
                        upstream = child.stdout.take();
                    }
                    spawned.push(Job {
                        name: stage.name.clone(),
                        child,
                    });
                }
                Err(err) => {
                    drop(upstream);
                    self.settle(spawned);
                    return Err(err);
                }
            }
        }

        if pipeline.is_background() {
            let count = spawned.len();
            debug!("detached {} stage(s) of `{}`", count, pipeline);
            self.jobs.extend(spawned);
            return Ok(Outcome::Detached(count));
        }

        let Some(mut last) = spawned.pop() else {
            return Ok(Outcome::Skipped);
        };
        let status = last.child.wait().map_err(|source| ShellError::Spawn {
            name: last.name.clone(),
            source,
        })?;
        if !status.success() {
            debug!("{} exited with {}", last.name, status);
        }
        self.settle(spawned);
        Ok(Outcome::Finished(status))
    }

    /// Reaps background children that have exited, without blocking.
    ///
    /// Returns the number of children reaped.
    pub fn reap_background(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain_mut(|job| match job.child.try_wait() {
            Ok(Some(status)) => {
                debug!("reaped {} (pid {}): {}", job.name, job.child.id(), status);
                false
            }
            Ok(None) => true,
            Err(err) => {
                warn!("can't poll {} (pid {}): {}", job.name, job.child.id(), err);
                false
            }
        });
        before - self.jobs.len()
    }

    /// Reaps stages that already exited; the rest are tracked as jobs.
    fn settle(&mut self, stages: Vec<Job>) {
        for mut job in stages {
            match job.child.try_wait() {
                Ok(Some(status)) => debug!("reaped {}: {}", job.name, status),
                Ok(None) => self.jobs.push(job),
                Err(err) => warn!("can't poll {}: {}", job.name, err),
            }
        }
    }

    /// Directories searched for programs, `PATH`-style.
    pub fn search_path(&self) -> OsString {
        match &self.search_path {
            Some(path) => path.clone(),
            None => env::var_os("PATH").unwrap_or_default(),
        }
    }

    fn resolve(&self, stage: &Command) -> ShellResult<PathBuf> {
        let search_path = self.search_path();
        let program = find_command_path(&search_path, Path::new(&stage.name))
            .map(|path| path.into_owned())
            .ok_or_else(|| ShellError::NotFound {
                name: stage.name.clone(),
            })?;
        debug!("resolved {} to {}", stage.name, program.display());
        Ok(program)
    }
}

/// Opens the file behind a redirect slot with the access it needs.
pub(crate) fn open_redirect(name: &str, kind: RedirectKind, path: &str) -> ShellResult<File> {
    if path.is_empty() {
        return Err(ShellError::EmptyRedirect {
            name: name.to_string(),
        });
    }
    let mut options = OpenOptions::new();
    match kind {
        RedirectKind::Input => options.read(true),
        RedirectKind::Output => options.write(true).create(true).truncate(true),
        RedirectKind::Append => options.append(true).create(true),
    };
    options.open(path).map_err(|source| ShellError::Redirect {
        name: name.to_string(),
        path: path.to_string(),
        source,
    })
}

/// Spawns one stage with its standard streams wired.
///
/// `upstream` is the read end of the pipe from the previous stage, if that
/// stage's output was not redirected. `has_upstream` tells whether a previous
/// stage exists at all: when it does but its output went to a file, this
/// stage reads from an empty stream.
fn spawn_stage(
    stage: &Command,
    program: &Path,
    upstream: Option<ChildStdout>,
    has_upstream: bool,
    is_last: bool,
) -> ShellResult<Child> {
    let stdin = match (stage.redirects.input(), upstream) {
        (Some(path), _) => Stdio::from(open_redirect(&stage.name, RedirectKind::Input, path)?),
        (None, Some(pipe)) => Stdio::from(pipe),
        (None, None) if has_upstream => Stdio::null(),
        (None, None) => Stdio::inherit(),
    };
    let stdout = match stage.redirects.output() {
        Some((kind, path)) => Stdio::from(open_redirect(&stage.name, kind, path)?),
        None if is_last => Stdio::inherit(),
        None => Stdio::piped(),
    };

    process::Command::new(program)
        .arg0(&stage.name)
        .args(&stage.args)
        .stdin(stdin)
        .stdout(stdout)
        .spawn()
        .map_err(|source| ShellError::Spawn {
            name: stage.name.clone(),
            source,
        })
}
