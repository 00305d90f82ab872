use crate::config::SHELL_NAME;
use std::fmt::Display;
use std::io;
use thiserror::Error;

/// Failures of one pipeline execution. None of them ends the shell.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("{name}: command not found")]
    NotFound { name: String },

    #[error("{name}: missing redirect target")]
    EmptyRedirect { name: String },

    #[error("{name}: {path}: {source}")]
    Redirect {
        name: String,
        path: String,
        source: io::Error,
    },

    #[error("{name}: {source}")]
    Spawn { name: String, source: io::Error },

    #[error("{after}: missing command after `|`")]
    EmptyStage { after: String },
}

pub type ShellResult<T> = Result<T, ShellError>;

/// Prints a failure the way the shell shows it to the user.
pub fn report(err: impl Display) {
    eprintln!("-{}: {}", SHELL_NAME, err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_lead_with_command_name() {
        let err = ShellError::NotFound {
            name: "frobnicate".to_string(),
        };
        assert_eq!(err.to_string(), "frobnicate: command not found");

        let err = ShellError::Redirect {
            name: "sort".to_string(),
            path: "missing.txt".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "sort: missing.txt: No such file or directory"
        );
    }
}
