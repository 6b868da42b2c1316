use std::fmt;

/// Result type for mods-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the index layer
#[derive(Debug)]
pub enum Error {
    /// Database operation failed
    Database(rusqlite::Error),

    /// Stored JSON column could not be (de)serialized
    Json(serde_json::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Referenced call or object does not exist
    NotFound(String),

    /// Query-specific error (invalid input, unsupported ref kind, etc.)
    Query(String),

    /// Store file was written with a different schema version
    SchemaVersion { found: i32, expected: i32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => {
                let msg = err.to_string();
                // Detect schema mismatch errors and provide actionable hint
                if msg.contains("no such column") || msg.contains("no such table") {
                    write!(
                        f,
                        "Database schema mismatch: {}. The store was written by a different mods version.",
                        msg
                    )
                } else {
                    write!(f, "Database error: {}", err)
                }
            }
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::NotFound(what) => write!(f, "Not found: {}", what),
            Error::Query(msg) => write!(f, "Query error: {}", msg),
            Error::SchemaVersion { found, expected } => write!(
                f,
                "Database schema mismatch: store has version {}, expected {}. \
                 Open it with a matching mods version or import its data into a new store.",
                found, expected
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::NotFound(_) | Error::Query(_) | Error::SchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<mods_types::Error> for Error {
    fn from(err: mods_types::Error) -> Self {
        Error::Query(err.to_string())
    }
}
