//! Error types for netlink operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error message on the wire.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value reported by the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// A header did not fit the bytes that remain in the stream.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the header requires.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// A message declared a length the buffer cannot satisfy.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// An attribute declared a length the buffer cannot satisfy, or its
    /// payload failed to decode as the expected type.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
}

impl Error {
    /// Create a kernel error from the (negative) errno carried on the wire.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Kernel { errno, .. } if matches!(*errno, 1 | 13))
    }
}
