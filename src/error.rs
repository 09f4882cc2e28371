//! TL1 error types

use thiserror::Error;

/// TL1 protocol and connection errors
#[derive(Error, Debug)]
pub enum Tl1Error {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TCP connection to the switch could not be established
    #[error("Connection to {0} failed: {1}")]
    ConnectionFailure(String, String),

    /// Read timed out waiting for the switch
    #[error("Read timed out")]
    TimedOut,

    /// Switch closed the connection mid-block
    #[error("Connection closed")]
    ConnectionClosed,

    /// Response line that does not fit the TL1 framing
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// TL1 completion error with the raw code and message from the switch
    #[error("TL1 error {code}: {message}")]
    Protocol {
        /// Error code from the completion block (e.g. "SROF", "IIAC")
        code: String,
        /// Delimited error message, outer framing stripped
        message: String,
    },

    /// Authentication rejected by the switch (PICC)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Command family not available on this switch variant (IICM)
    #[error("{0}")]
    CapabilityUnsupported(String),

    /// Invalid access identifier on the import path (IIAC)
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// Malformed port specification text
    #[error("Invalid port specification: {0}")]
    InvalidPortSpec(String),

    /// Import file rejected before any command was sent
    #[error("Import file error: {0}")]
    ImportFile(String),

    /// Caller supplied arguments that cannot form a valid command
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization error on the export/import path
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Tl1Error {
    /// Whether this error means the whole session must be abandoned.
    ///
    /// The library never terminates the process itself; a top-level driver
    /// checks this to decide.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Tl1Error::ConnectionFailure(_, _)
                | Tl1Error::AuthenticationFailed(_)
                | Tl1Error::InvalidPort(_)
                | Tl1Error::ConnectionClosed
        )
    }
}

/// Result type alias using Tl1Error
pub type Result<T> = std::result::Result<T, Tl1Error>;
