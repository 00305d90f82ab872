use log::trace;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Resolve a command path the way the shell launches it.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - `./foo` or a relative path with several components (e.g. `bin/sh`):
///   returns it if it exists, relative to the current directory.
/// - Single path component (no separators): search each directory of
///   `search_paths` (a `PATH` value, `:`-separated) in order and return the
///   first `dir/name` that is a regular file.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned
/// `PathBuf` when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        // Empty path -> not found
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let path = dir.join(cmd);
        trace!("probing {}", path.display());
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs::{self, File};

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn join_paths(dirs: &[&Path]) -> OsString {
        std::env::join_paths(dirs).unwrap()
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(osstr("/nowhere"), path);
        let found = res.expect("Expected to find /bin/sh via absolute path");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting-seashell-binary");
        assert!(find_command_path(osstr("/bin"), path).is_none());
    }

    #[test]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin:/usr/bin"), Path::new("nonexisting-seashell"));
        assert!(res.is_none());
    }

    #[test]
    fn first_match_in_path_order_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        File::create(first.path().join("tool")).unwrap();
        File::create(second.path().join("tool")).unwrap();

        let search = join_paths(&[second.path(), first.path()]);
        for _ in 0..3 {
            let found = find_command_path(&search, Path::new("tool")).unwrap();
            assert_eq!(found.as_ref(), second.path().join("tool"));
        }
    }

    #[test]
    fn directories_are_skipped() {
        let shadow = tempfile::tempdir().unwrap();
        let real = tempfile::tempdir().unwrap();
        fs::create_dir(shadow.path().join("tool")).unwrap();
        File::create(real.path().join("tool")).unwrap();

        let search = join_paths(&[shadow.path(), real.path()]);
        let found = find_command_path(&search, Path::new("tool")).unwrap();
        assert_eq!(found.as_ref(), real.path().join("tool"));
    }

    #[test]
    fn empty_path_entries_are_ignored() {
        let res = find_command_path(osstr("::/bin:"), Path::new("sh"));
        assert_eq!(res.unwrap().as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn nested_relative_path_is_not_searched() {
        let res = find_command_path(osstr("/"), Path::new("bin/nonexisting-seashell"));
        assert!(res.is_none());
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }
}
