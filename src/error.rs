use thiserror::Error;

/// Failures the read loop reports to the user and then moves past.
#[derive(Debug, Error)]
pub enum ShellError {
    /// No builtin matched and the name did not resolve to an executable.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// The executable was found but the process could not be started or waited on.
    #[error("{name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
