use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run. Malformed lines are not errors at this level;
/// see [`crate::parse::MalformedRecord`].
#[derive(Debug)]
pub enum Error {
    Io { path: PathBuf, source: io::Error },
    NumericOverflow { station: String },
    ThreadPool(rayon::ThreadPoolBuildError),
    WorkerPanicked,
    NoStations,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn overflow(station: &[u8]) -> Self {
        Error::NumericOverflow {
            station: String::from_utf8_lossy(station).into_owned(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, .. } => write!(f, "I/O error on {}", path.display()),
            Error::NumericOverflow { station } => {
                write!(f, "accumulator overflow for station '{}'", station)
            }
            Error::ThreadPool(_) => write!(f, "failed to build worker pool"),
            Error::WorkerPanicked => write!(f, "a worker thread panicked"),
            Error::NoStations => write!(f, "no station names to generate from"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::ThreadPool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(e)
    }
}
