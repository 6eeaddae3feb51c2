//! Capability probes: can a strategy run on this machine?
//!
//! Probes are consulted once per candidate while the registry is built.
//! They only inspect the environment (currently: executable search on
//! `PATH`) and never run the tool itself.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Outcome of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Prerequisite a strategy needs before it can be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Pure Rust code compiled into the binary.
    Always,
    /// An executable that must be found on `PATH`.
    Executable(&'static str),
}

impl Probe {
    pub fn check(&self) -> Availability {
        match self {
            Probe::Always => Availability::Available,
            Probe::Executable(program) => match find_executable(program) {
                Some(_) => Availability::Available,
                None => Availability::Unavailable(format!("cannot find {program} in PATH")),
            },
        }
    }
}

/// Locate `program` on `PATH`, the way a shell would.
///
/// A program given with a directory component is checked as-is.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return is_executable(as_path).then(|| as_path.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    find_in_dirs(program, std::env::split_paths(&path_var))
}

fn find_in_dirs(program: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    let names = candidate_names(program);
    dirs.into_iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

/// On Windows `gm` is installed as `gm.exe`.
fn candidate_names(program: &str) -> Vec<OsString> {
    let mut names = Vec::with_capacity(2);
    if cfg!(windows) && !program.to_ascii_lowercase().ends_with(".exe") {
        names.push(OsString::from(format!("{program}.exe")));
    }
    names.push(OsString::from(program));
    names
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_is_available() {
        assert!(Probe::Always.check().is_available());
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let availability = Probe::Executable("resize-bench-no-such-tool").check();
        assert_eq!(
            availability,
            Availability::Unavailable("cannot find resize-bench-no-such-tool in PATH".into())
        );
    }

    #[test]
    fn find_in_empty_dirs_is_none() {
        assert_eq!(find_in_dirs("gm", Vec::<PathBuf>::new()), None);
    }

    #[cfg(unix)]
    #[test]
    fn find_in_dirs_requires_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let tool = tmp.path().join("fake-tool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(find_in_dirs("fake-tool", vec![tmp.path().to_path_buf()]), None);

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(
            find_in_dirs("fake-tool", vec![tmp.path().to_path_buf()]),
            Some(tool)
        );
    }

    #[cfg(unix)]
    #[test]
    fn find_in_dirs_first_match_wins() {
        use std::os::unix::fs::PermissionsExt;

        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        for dir in [first.path(), second.path()] {
            let tool = dir.join("dup-tool");
            std::fs::write(&tool, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let found = find_in_dirs(
            "dup-tool",
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert_eq!(found, Some(first.path().join("dup-tool")));
    }

    #[test]
    fn directory_is_not_executable() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("gm")).unwrap();
        assert_eq!(find_in_dirs("gm", vec![tmp.path().to_path_buf()]), None);
    }

    #[cfg(unix)]
    #[test]
    fn explicit_path_is_checked_directly() {
        assert_eq!(find_executable("/nonexistent/bin/gm"), None);
    }
}
