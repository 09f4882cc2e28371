//! Error classification policy for completion errors
//!
//! The switch reports command failures as a two-line block after a non-COMPLD
//! completion line: an error code, then a delimited message. Which codes are
//! fatal depends on the calling context: interactive use tolerates bad AIDs,
//! the import/export path does not. One policy value parameterizes the single
//! response reader instead of duplicating it per context.

use crate::error::Tl1Error;

/// Fixed replacement text for IICM ("command not valid for this equipment").
const UNSUPPORTED_MESSAGE: &str = "not supported on this switch";

/// Hint appended to IIAC errors on the import path.
const INVALID_PORT_HINT: &str = "check the port numbers";

/// Classifies TL1 completion error codes into typed errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// Treat IIAC (invalid access identifier) as a fatal invalid-port error.
    invalid_port_fatal: bool,
}

impl ErrorPolicy {
    /// Policy for interactive command exchanges.
    pub fn interactive() -> Self {
        Self {
            invalid_port_fatal: false,
        }
    }

    /// Policy for the import/export path, where a bad port number must abort
    /// the whole operation.
    pub fn import_export() -> Self {
        Self {
            invalid_port_fatal: true,
        }
    }

    /// Map a completion error code/message pair to a typed error.
    pub fn classify(&self, code: &str, message: &str) -> Tl1Error {
        if code == "IICM" {
            Tl1Error::CapabilityUnsupported(UNSUPPORTED_MESSAGE.to_string())
        } else if code.contains("PICC") {
            Tl1Error::AuthenticationFailed(message.to_string())
        } else if code.contains("IIAC") && self.invalid_port_fatal {
            Tl1Error::InvalidPort(format!("{} ({})", message, INVALID_PORT_HINT))
        } else {
            Tl1Error::Protocol {
                code: code.to_string(),
                message: message.to_string(),
            }
        }
    }
}
