use crate::command::{CommandFactory, ExitCode};
use crate::editor::LineEditor;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::SearchPath;
use crate::io_adapters::ByteSource;
use crate::lexer;
use anyhow::Result;
use std::io::Write;

/// Status reported for a name that resolves to nothing, as POSIX shells do.
const NOT_FOUND_STATUS: ExitCode = 127;
/// Status reported when an executable was found but could not be started.
const NOT_EXECUTABLE_STATUS: ExitCode = 126;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only support commands defined in this crate — BuiltinCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal interactive shell that executes built-in and external commands.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to create commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```
/// use tabsh::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let code = sh.run("echo", &["hello", "world"], &mut out).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(out, b"hello world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self::with_env(Environment::new(), commands)
    }

    /// Create an interpreter over an explicit environment.
    pub fn with_env(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Builtins write to `stdout`; external programs inherit the process's streams.
    ///
    /// # Errors
    ///
    /// [`ShellError::CommandNotFound`] when no factory recognizes `name`,
    /// [`ShellError::Spawn`] when an external program cannot be started, or an I/O
    /// error from writing to `stdout`.
    pub fn run(&mut self, name: &str, args: &[&str], stdout: &mut dyn Write) -> Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                let code = cmd.execute(stdout, &mut self.env)?;
                tracing::debug!(name, code, "command finished");
                return Ok(code);
            }
        }
        Err(ShellError::CommandNotFound(name.to_string()).into())
    }

    /// Tokenize `line` and run it.
    ///
    /// Returns `None` for a blank line. A missing command is reported on `stdout` and a
    /// failed launch on stderr; both yield a status instead of an error.
    ///
    /// # Errors
    ///
    /// Only I/O errors while writing to the terminal.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<Option<ExitCode>> {
        if let Some(quote) = lexer::find_unterminated_quote(line) {
            tracing::debug!(?quote, "unterminated quote absorbed into last word");
        }
        let tokens = lexer::tokenize(line);
        let Some((name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match self.run(name, &args, stdout) {
            Ok(code) => Ok(Some(code)),
            Err(e) => match e.downcast_ref::<ShellError>() {
                Some(ShellError::CommandNotFound(_)) => {
                    writeln!(stdout, "{e}")?;
                    Ok(Some(NOT_FOUND_STATUS))
                }
                Some(ShellError::Spawn { .. }) => {
                    tracing::warn!(error = %e, "failed to launch command");
                    writeln!(std::io::stderr(), "{e}")?;
                    Ok(Some(NOT_EXECUTABLE_STATUS))
                }
                None => Err(e),
            },
        }
    }

    /// Read-eval-print loop: prompt, read a line with completion, run it.
    ///
    /// Stops at end of input, on the literal line `exit 0`, or after the `exit` builtin.
    /// Returns the status the shell should exit with.
    ///
    /// # Errors
    ///
    /// Terminal I/O errors; command failures never end the loop.
    pub fn repl<S: ByteSource>(
        &mut self,
        editor: &mut LineEditor<S>,
        stdout: &mut dyn Write,
    ) -> Result<ExitCode> {
        loop {
            // PATH may change between lines, so the candidates are rebuilt per prompt.
            let candidates = SearchPath::from_env(&self.env);
            let Some(line) = editor.read_line(stdout, &candidates)? else {
                break;
            };
            if line == "exit 0" {
                self.env.should_exit = true;
                self.env.exit_code = 0;
                break;
            }

            self.execute_line(&line, stdout)?;
            stdout.flush()?;
            if self.env.should_exit {
                break;
            }
        }
        Ok(self.env.exit_code)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `pwd`, `cd`, `echo`, `type`, `exit`
    /// - external command launcher
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Type>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::ScriptedBytes;
    use pretty_assertions::assert_eq;

    fn shell() -> Interpreter {
        let Interpreter { commands, .. } = Interpreter::default();
        let mut env = Environment::new();
        env.set_var("PATH", "/bin:/usr/bin");
        Interpreter::with_env(env, commands)
    }

    fn session(sh: &mut Interpreter, script: &str) -> (ExitCode, String) {
        let mut editor = LineEditor::new(ScriptedBytes::new(script), "$ ");
        let mut out = Vec::new();
        let code = sh.repl(&mut editor, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_run_unknown_command_is_typed_error() {
        let mut sh = shell();
        let err = sh.run("definitely_not_a_cmd_42", &[], &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShellError>(),
            Some(ShellError::CommandNotFound(name)) if name == "definitely_not_a_cmd_42"
        ));
    }

    #[test]
    fn test_execute_line_tokenizes_quotes() {
        let mut sh = shell();
        let mut out = Vec::new();
        let code = sh
            .execute_line(r#"echo 'a   b'  "c\"d" e\ f"#, &mut out)
            .unwrap();
        assert_eq!(code, Some(0));
        assert_eq!(String::from_utf8(out).unwrap(), "a   b c\"d e f\n");
    }

    #[test]
    fn test_execute_line_blank_is_noop() {
        let mut sh = shell();
        let mut out = Vec::new();
        assert_eq!(sh.execute_line("   \t ", &mut out).unwrap(), None);
        assert!(out.is_empty());
    }

    #[test]
    fn test_repl_runs_until_literal_exit_zero() {
        let mut sh = shell();
        let (code, out) = session(&mut sh, "echo hello\nnosuchcmd_zz arg\nexit 0\necho after\n");
        assert_eq!(code, 0);
        assert_eq!(
            out,
            "$ echo hello\nhello\n$ nosuchcmd_zz arg\nnosuchcmd_zz: command not found\n$ exit 0\n"
        );
    }

    #[test]
    fn test_repl_stops_on_exit_builtin() {
        let mut sh = shell();
        let (code, out) = session(&mut sh, "exit 7\necho unreachable\n");
        assert_eq!(code, 7);
        assert_eq!(out, "$ exit 7\n");
        assert!(sh.env().should_exit);
    }

    #[test]
    fn test_repl_exit_with_bad_status_still_stops() {
        let mut sh = shell();
        let (code, out) = session(&mut sh, "exit foo\necho still-running\n");
        assert_eq!(code, 0);
        assert_eq!(out, "$ exit foo\n");
        assert!(sh.env().should_exit);

        let mut sh = shell();
        let (code, out) = session(&mut sh, "exit 0 extra\necho still-running\n");
        assert_eq!(code, 0);
        assert_eq!(out, "$ exit 0 extra\n");
    }

    #[test]
    fn test_repl_pwd_ignores_extra_args() {
        let mut sh = shell();
        let dir = sh.env().current_dir.clone();
        let (_, out) = session(&mut sh, "pwd extra\n");
        assert_eq!(out, format!("$ pwd extra\n{}\n$ \n", dir.to_string_lossy()));
    }

    #[test]
    fn test_repl_ends_at_end_of_input() {
        let mut sh = shell();
        let (code, out) = session(&mut sh, "\n  \necho x");
        assert_eq!(code, 0);
        assert_eq!(out, "$ \n$   \n$ echo x\nx\n$ \n");
    }

    #[test]
    fn test_repl_cd_then_pwd() {
        let mut sh = shell();
        let root = std::fs::canonicalize("/").unwrap();
        let (_, out) = session(&mut sh, "cd /\npwd\n");
        assert_eq!(out, format!("$ cd /\n$ pwd\n{}\n$ \n", root.display()));
        assert_eq!(sh.env().current_dir, root);
    }

    #[test]
    #[cfg(unix)]
    fn test_external_command_exit_status() {
        let mut sh = shell();
        let code = sh
            .execute_line("sh -c 'exit 3'", &mut Vec::new())
            .unwrap();
        assert_eq!(code, Some(3));
    }

    #[test]
    #[cfg(unix)]
    fn test_external_command_runs_in_shell_cwd() {
        let mut sh = shell();
        let root = std::fs::canonicalize("/").unwrap();
        sh.execute_line("cd /", &mut Vec::new()).unwrap();
        let code = sh
            .execute_line(&format!("sh -c '[ \"$(pwd -P)\" = {} ]'", root.display()), &mut Vec::new())
            .unwrap();
        assert_eq!(code, Some(0));
    }
}
