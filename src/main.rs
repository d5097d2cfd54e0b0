use argh::FromArgs;
use tabsh::{Interpreter, LineEditor, StdinBytes, logging};

#[derive(FromArgs)]
/// Interactive shell with tab-completion of command names.
struct Args {
    #[argh(option, default = "String::from(\"$ \")")]
    /// text printed before each input line.
    prompt: String,

    #[argh(option)]
    /// diagnostics written to stderr: off, error, warn, info, debug or trace.
    /// Overrides $TABSH_LOG.
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    let env_level = std::env::var(logging::LOG_ENV).ok();
    let level = logging::resolve_level(args.log_level.as_deref(), env_level.as_deref())?;
    logging::init(level)?;

    let mut editor = LineEditor::new(StdinBytes, args.prompt);
    let mut shell = Interpreter::default();
    let code = shell.repl(&mut editor, &mut std::io::stdout())?;
    std::process::exit(code)
}
