//! Turns one input line into a [`Pipeline`].
//!
//! Parsing never fails: anomalies such as a redirect without a target are
//! kept in the result (as an empty path) and surface when the executor opens
//! the file.

use crate::command::{Command, Pipeline, PipelineBuilder, RedirectKind};
use std::iter::Peekable;

fn is_splitter(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Splits a line on runs of spaces and tabs.
///
/// A token that starts with `"` or `'` runs to the matching closing quote,
/// so whitespace inside it does not split; the quotes stay in the token.
/// Without a closing quote, or for a quote inside a word, the token ends at
/// the next whitespace like any other. Yields each token with the byte
/// offset just past it.
struct Tokens<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Tokens { line, pos: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.line.as_bytes();
        while self.pos < bytes.len() && is_splitter(bytes[self.pos] as char) {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let first = bytes[start];
        if first == b'"' || first == b'\'' {
            if let Some(close) = bytes[start + 1..].iter().position(|&b| b == first) {
                self.pos = start + 1 + close + 1;
            }
        }
        while self.pos < bytes.len() && !is_splitter(bytes[self.pos] as char) {
            self.pos += 1;
        }
        Some((&self.line[start..self.pos], self.pos))
    }
}

/// Recognizes `<path`, `>path` and `>>path` tokens.
fn redirect(token: &str) -> Option<(RedirectKind, &str)> {
    if let Some(path) = token.strip_prefix(">>") {
        Some((RedirectKind::Append, path))
    } else if let Some(path) = token.strip_prefix('>') {
        Some((RedirectKind::Output, path))
    } else {
        token
            .strip_prefix('<')
            .map(|path| (RedirectKind::Input, path))
    }
}

/// Strips one layer of matching quotes from a token of at least three chars.
fn unquote(token: &str) -> &str {
    let bytes = token.as_bytes();
    let wrapped = bytes.len() > 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0];
    if wrapped {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

/// A token that may follow a bare `<`, `>` or `>>` as its target.
fn is_target(token: &str) -> bool {
    token != "|" && token != "&" && redirect(token).is_none()
}

/// Parses one stage from `line`.
///
/// Returns the stage and, when a `|` token ended it, the raw text after that
/// token with its leading whitespace removed.
fn parse_stage(line: &str) -> (Command, Option<&str>) {
    let mut tokens: Peekable<Tokens<'_>> = Tokens::new(line).peekable();
    let mut command = Command::default();

    let Some((name, _)) = tokens.next() else {
        return (command, None);
    };
    command.name = name.to_string();

    while let Some((token, end)) = tokens.next() {
        if token == "|" {
            return (command, Some(line[end..].trim_start_matches(is_splitter)));
        }
        if token == "&" {
            continue;
        }
        if let Some((kind, mut path)) = redirect(token) {
            if path.is_empty() {
                if let Some(&(next, _)) = tokens.peek().filter(|(next, _)| is_target(next)) {
                    path = next;
                    tokens.next();
                }
            }
            command.redirects.set(kind, path);
            continue;
        }
        command.args.push(unquote(token).to_string());
    }
    (command, None)
}

/// Parses a whole input line into a pipeline.
///
/// A trailing `?` marks the head for completion and is dropped before
/// tokenizing; a trailing `&` marks it for background execution. Each `|`
/// token ends the current stage and the rest of the raw line is parsed as the
/// next stage, so the spacing after the pipe is preserved as typed.
pub fn parse(line: &str) -> Pipeline {
    let trimmed = line.trim_matches(is_splitter);
    let autocomplete = trimmed.ends_with('?');
    let background = trimmed.ends_with('&');
    let body = if autocomplete {
        &trimmed[..trimmed.len() - 1]
    } else {
        trimmed
    };

    let mut builder = PipelineBuilder::new();
    let (mut head, mut rest) = parse_stage(body);
    head.background = background;
    head.autocomplete = autocomplete;
    builder.push(head);
    while let Some(source) = rest {
        let (stage, tail) = parse_stage(source);
        builder.push(stage);
        rest = tail;
    }
    builder.build()
}
