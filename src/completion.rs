//! Candidates for the autocomplete marker (`?` or Tab).

use crate::command::Command;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Completion candidates for a head command, sorted and without duplicates.
///
/// Without arguments the command name is completed from `builtins` and the
/// executables found in `search_path`. Otherwise the last argument is
/// completed as a path relative to `cwd`; directories get a trailing `/`.
pub fn complete(
    command: &Command,
    builtins: &[&str],
    search_path: &OsStr,
    cwd: &Path,
) -> Vec<String> {
    let candidates = match command.args.last() {
        None => complete_program(&command.name, builtins, search_path),
        Some(prefix) => complete_path(prefix, cwd),
    };
    candidates.into_iter().collect()
}

fn complete_program(prefix: &str, builtins: &[&str], search_path: &OsStr) -> BTreeSet<String> {
    let mut candidates: BTreeSet<String> = builtins
        .iter()
        .filter(|name| name.starts_with(prefix))
        .map(|name| name.to_string())
        .collect();

    for dir in std::env::split_paths(search_path) {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if !file_name.starts_with(prefix) {
                continue;
            }
            // Follows symlinks, most of /usr/bin is links.
            let Ok(metadata) = fs::metadata(entry.path()) else {
                continue;
            };
            if metadata.is_file() && metadata.permissions().mode() & 0o111 != 0 {
                candidates.insert(file_name);
            }
        }
    }
    candidates
}

fn complete_path(prefix: &str, cwd: &Path) -> BTreeSet<String> {
    let (dir_part, file_prefix) = match prefix.rfind('/') {
        Some(i) => (&prefix[..=i], &prefix[i + 1..]),
        None => ("", prefix),
    };
    let dir = if dir_part.is_empty() {
        cwd.to_path_buf()
    } else {
        cwd.join(dir_part)
    };

    let mut candidates = BTreeSet::new();
    let Ok(entries) = fs::read_dir(&dir) else {
        return candidates;
    };
    for entry in entries.flatten() {
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        if !file_name.starts_with(file_prefix) {
            continue;
        }
        // Hidden entries only when asked for explicitly.
        if file_name.starts_with('.') && !file_prefix.starts_with('.') {
            continue;
        }
        let suffix = if entry.path().is_dir() { "/" } else { "" };
        candidates.insert(format!("{dir_part}{file_name}{suffix}"));
    }
    candidates
}
