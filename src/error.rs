use core::fmt;

/// Result alias for `commune`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned at the crate's boundaries.
///
/// The network store itself is total: mutators never fail and lookups
/// signal absence with `Option`. Errors arise only from invalid engine
/// parameters and from the edge-list loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
    /// An input file could not be read.
    Io {
        /// Path that failed to open or read.
        path: String,
        /// Underlying I/O error description.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Io { path, message } => write!(f, "cannot read '{path}': {message}"),
        }
    }
}

impl std::error::Error for Error {}
