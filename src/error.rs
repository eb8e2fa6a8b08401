//! Structured error types for loading, decoding and synchronizing overlays.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The peer could not be reached or refused the request.
    TransportFailure,
    /// The payload carried a malformed escape sequence.
    DecodeFailure,
    /// The overlay text does not follow the config grammar.
    ParseFailure,
    /// The local overlay store could not be read or written.
    IoFailure,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::TransportFailure => write!(f, "transport failure"),
            ErrorCode::DecodeFailure => write!(f, "decode failure"),
            ErrorCode::ParseFailure => write!(f, "parse failure"),
            ErrorCode::IoFailure => write!(f, "i/o failure"),
        }
    }
}

/// A line the config parser could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at '{line}' on {location}")]
pub struct ParseError {
    /// The offending line, without its trailing newline.
    pub line: String,
    /// `source:line` of the offending line.
    pub location: String,
}

impl ParseError {
    pub fn new(line: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            location: location.into(),
        }
    }
}

/// Failure to reverse the transport escaping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid escape sequence '\\{found}' at byte {offset}")]
    InvalidEscape { found: char, offset: usize },

    #[error("truncated \\x escape at byte {offset}")]
    TruncatedHex { offset: usize },

    #[error("trailing backslash in payload")]
    TrailingBackslash,

    #[error("payload is not valid UTF-8 after decoding")]
    InvalidUtf8,

    #[error("payload was escaped twice")]
    DoubleEscaped,
}

/// Failure of the collaborator that fetches keys from a peer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("repository not found at {location}")]
    NotFound { location: String },

    #[error("cannot read from {location}: {source}")]
    Unreachable {
        location: String,
        #[source]
        source: io::Error,
    },
}

/// Failure to load a local configuration file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors surfaced by the synchronization flow.
///
/// Decode and parse failures of a fetched payload are not errors; they end
/// the flow with a rejected outcome carrying [`ErrorCode::DecodeFailure`] or
/// [`ErrorCode::ParseFailure`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("overlay store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::Transport(_) => ErrorCode::TransportFailure,
            SyncError::Store { .. } => ErrorCode::IoFailure,
        }
    }
}

/// Result type for synchronization operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = ParseError::new("garbage", "projrc:3");
        assert_eq!(err.to_string(), "parse error at 'garbage' on projrc:3");
    }

    #[test]
    fn test_error_codes() {
        let err = SyncError::from(TransportError::NotFound {
            location: "/srv/central".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::TransportFailure);
        let err = SyncError::Store {
            path: PathBuf::from("/work/.hg/projrc"),
            source: io::Error::other("disk full"),
        };
        assert_eq!(err.code(), ErrorCode::IoFailure);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::TransportFailure).unwrap();
        assert_eq!(json, "\"TRANSPORT_FAILURE\"");
    }
}
