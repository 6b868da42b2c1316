use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Caller-supplied argument was rejected before any request was made
    InvalidInput(String),

    /// A string that should be a reference URI did not parse as one
    InvalidReference(String),

    /// The trace store failed; propagated unchanged and never retried here
    Backend(anyhow::Error),

    /// Result cache could not be read or written
    Cache(String),

    /// Configuration could not be loaded, saved, or resolved
    Config(String),

    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::InvalidReference(value) => write!(f, "Invalid reference: {}", value),
            Error::Backend(err) => write!(f, "Backend error: {}", err),
            Error::Cache(msg) => write!(f, "Cache error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Backend(err) => Some(err.as_ref()),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Backend(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<mods_types::Error> for Error {
    fn from(err: mods_types::Error) -> Self {
        match err {
            mods_types::Error::InvalidReference(value) => Error::InvalidReference(value),
            mods_types::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            mods_types::Error::Json(err) => Error::InvalidInput(err.to_string()),
        }
    }
}

impl From<mods_engine::Error> for Error {
    fn from(err: mods_engine::Error) -> Self {
        match err {
            mods_engine::Error::InvalidReference(value) => Error::InvalidReference(value),
            mods_engine::Error::Shape(msg) => Error::InvalidInput(msg),
            mods_engine::Error::Types(err) => err.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
