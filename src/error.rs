use std::fmt;
use std::path::PathBuf;

/// Errors raised while parsing, composing or resolving reflection data.
#[derive(Debug)]
pub enum Error {
    /// Malformed source. Fatal to the current file parse; nothing from the
    /// failing file is committed.
    Syntax {
        filename: Option<PathBuf>,
        line: usize,
        message: String,
    },
    /// Trait/interface merge conflict: an unresolvable method collision, a
    /// rule referencing an undeclared trait or a method it does not define.
    Composition(String),
    /// A class or constant referenced from a deferred scalar expression or
    /// an inheritance chain could not be resolved, or resolution cycled.
    Resolution(String),
    /// The factory could not locate a requested class or function.
    NotFound(String),
    /// Reading a source file failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax {
                filename,
                line,
                message,
            } => {
                write!(f, "Error at line {}", line)?;
                if let Some(filename) = filename {
                    write!(f, " in file {}", filename.display())?;
                }
                write!(f, ": {}", message)
            }
            Error::Composition(message) => write!(f, "{}", message),
            Error::Resolution(message) => write!(f, "{}", message),
            Error::NotFound(message) => write!(f, "{}", message),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
