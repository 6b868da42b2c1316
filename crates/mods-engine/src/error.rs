use std::fmt;

/// Result type for mods-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while shaping tables
#[derive(Debug)]
pub enum Error {
    /// A reference-valued column held something that is not a reference
    InvalidReference(String),

    /// Table shape mismatch (index length, column width, ...)
    Shape(String),

    /// Record conversion failed in the types layer
    Types(mods_types::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidReference(value) => write!(f, "Invalid reference: {}", value),
            Error::Shape(msg) => write!(f, "Table shape error: {}", msg),
            Error::Types(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Types(err) => Some(err),
            Error::InvalidReference(_) | Error::Shape(_) => None,
        }
    }
}

impl From<mods_types::Error> for Error {
    fn from(err: mods_types::Error) -> Self {
        match err {
            mods_types::Error::InvalidReference(value) => Error::InvalidReference(value),
            other => Error::Types(other),
        }
    }
}
