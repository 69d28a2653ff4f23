use std::{fmt, io, path::PathBuf};

/// Startup failures: anything that prevents heimd from getting to the point
/// of executing a command. Execution itself never errors upward; it reports
/// through `ExecutionResult`.
#[derive(Debug)]
pub enum HeimdError {
    /// A file we cannot run without does not exist
    MissingFile { path: PathBuf, kind: &'static str },
    /// I/O failure while reading config or inventory
    ReadError { path: PathBuf, source: io::Error },
    /// Config or inventory content did not parse
    ParseError { path: PathBuf, kind: &'static str, message: String },
    /// .env loading failure
    EnvLoadError { path: PathBuf, source: dotenvy::Error },
    /// XDG base directory lookup failure
    XdgError { message: String },
}

impl fmt::Display for HeimdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeimdError::MissingFile { path, kind } => {
                write!(f, "missing {} file: {}", kind, path.display())
            }
            HeimdError::ReadError { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            HeimdError::ParseError { path, kind, message } => {
                write!(f, "invalid {} in {}: {}", kind, path.display(), message)
            }
            HeimdError::EnvLoadError { path, source } => {
                write!(f, "cannot load environment from {}: {}", path.display(), source)
            }
            HeimdError::XdgError { message } => {
                write!(f, "xdg lookup failed: {}", message)
            }
        }
    }
}

impl std::error::Error for HeimdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeimdError::ReadError { source, .. } => Some(source),
            HeimdError::EnvLoadError { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenient result alias for heimd
pub type Result<T> = std::result::Result<T, HeimdError>;
