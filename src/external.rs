use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::completion::CandidateSource;
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::Result;
use rustix::fs::Access;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Command that is not a builtin.
pub struct ExternalCommand {
    /// Name as typed by the user; becomes `argv[0]` of the child.
    name: OsString,
    /// Resolved location of the executable.
    path: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: OsString, path: PathBuf, args: Vec<OsString>) -> Self {
        Self { name, path, args }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = env.search_path();
        // Paths with a separator are relative to the shell's directory, not the process's.
        let target = if name.contains('/') {
            env.current_dir.join(name)
        } else {
            PathBuf::from(name)
        };
        let executable = find_command_path(OsStr::new(&search_paths), &target)
            .map(Cow::into_owned)
            .or_else(|| {
                // A bare name that is not on the path may still name a local file.
                let local = env.current_dir.join(name);
                local.is_file().then_some(local)
            })?;
        tracing::debug!(name, path = %executable.display(), "resolved external command");
        Some(Box::new(ExternalCommand::new(
            name.into(),
            executable,
            args.iter().map(|x| x.into()).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        // The child writes straight to the inherited descriptor.
        stdout.flush()?;

        let mut cmd = std::process::Command::new(&self.path);
        cmd.args(&self.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(&self.name);
        }

        let exit_status = cmd.status().map_err(|source| ShellError::Spawn {
            name: self.name.to_string_lossy().into_owned(),
            source,
        })?;
        let code = match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        };
        tracing::debug!(name = ?self.name, code, "external command finished");
        Ok(code)
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Ordered list of directories consulted to resolve bare command names.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Split a colon-separated `PATH` value into its directories.
    ///
    /// Empty entries are dropped; they would otherwise resolve against the process's
    /// working directory.
    pub fn new(search_paths: &OsStr) -> Self {
        Self {
            dirs: std::env::split_paths(search_paths)
                .filter(|dir| !dir.as_os_str().is_empty())
                .collect(),
        }
    }

    /// Build the search path from the `PATH` variable of `env`.
    pub fn from_env(env: &Environment) -> Self {
        Self::new(OsStr::new(&env.search_path()))
    }

    /// First directory entry named `cmd` that is an executable regular file.
    pub fn find(&self, cmd: &OsStr) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(cmd))
            .find(|path| is_executable(path))
    }

    /// Names of all executables on the path that start with `prefix`.
    ///
    /// Directories are scanned non-recursively. Directories that cannot be read are
    /// skipped. Names that are not valid UTF-8 are ignored.
    pub fn executables_with_prefix(&self, prefix: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for dir in &self.dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::trace!(dir = %dir.display(), error = %e, "skipping search path entry");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if name.starts_with(prefix) && !found.contains(&name) && is_executable(&entry.path())
                {
                    found.insert(name);
                }
            }
        }
        found
    }
}

impl CandidateSource for SearchPath {
    fn candidates(&self, prefix: &str) -> BTreeSet<String> {
        self.executables_with_prefix(prefix)
    }
}

/// Regular file (after following symlinks) that the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let is_file = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    is_file && rustix::fs::access(path, Access::EXEC_OK).is_ok()
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   for an executable regular file and return the first match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => SearchPath::new(search_paths)
            .find(x.as_os_str())
            .map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
