//! Types for errors that can occur while working with the live gateway.

use std::io;

/// An error that can occur while connecting to, subscribing with, or
/// streaming from the live gateway.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error while creating, connecting, reading, or writing the
    /// transport.
    #[error("I/O error {context}: {source}")]
    Transport {
        /// The original error.
        #[source]
        source: io::Error,
        /// The context in which the error occurred.
        context: String,
    },
    /// The gateway rejected authentication or a handshake line was missing a
    /// required field.
    #[error("authentication failed: {0}")]
    AuthDenied(String),
    /// The byte stream violated the DBN framing: a bad preamble signature, an
    /// unsupported version, or a record length below the header size.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The transport reached end-of-file mid-stream.
    #[error("connection closed unexpectedly")]
    ConnectionLost,
    /// Carry-over plus a new payload would exceed the receive buffer
    /// capacity.
    #[error("leftover data would cause buffer overflow")]
    BufferOverflow,
    /// The gateway sent an error record. The stream remains usable.
    #[error("gateway error: {0}")]
    Gateway(String),
    /// A raw field value could not be converted to an enum or string.
    #[error("couldn't convert {input} to {desired_type}")]
    Conversion {
        /// The input that failed to convert.
        input: String,
        /// The desired type name.
        desired_type: &'static str,
    },
    /// An invalid argument was passed or an operation was called in the
    /// wrong session state.
    #[error("bad argument `{param_name}`: {desc}")]
    BadArgument {
        /// The name of the parameter to which the bad argument was passed.
        param_name: String,
        /// The description of why the argument was invalid.
        desc: String,
    },
}

/// An alias for a `Result` with [`enum@Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new transport error with `context` about what caused it.
    pub fn io(source: io::Error, context: impl ToString) -> Self {
        Self::Transport {
            source,
            context: context.to_string(),
        }
    }

    /// Creates a new conversion error for an `input` that failed to convert
    /// to type `T`.
    pub fn conversion<T>(input: impl ToString) -> Self {
        Self::Conversion {
            input: input.to_string(),
            desired_type: std::any::type_name::<T>(),
        }
    }

    /// Creates a new bad-argument error.
    pub fn bad_argument(param_name: impl ToString, desc: impl ToString) -> Self {
        Self::BadArgument {
            param_name: param_name.to_string(),
            desc: desc.to_string(),
        }
    }

    /// Returns `true` if further communication over the session is unlikely
    /// to succeed. Only [`Error::Gateway`] leaves the stream usable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Gateway(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_are_not_fatal() {
        assert!(!Error::Gateway("Subscription limit reached".to_owned()).is_fatal());
        assert!(Error::ConnectionLost.is_fatal());
        assert!(Error::BufferOverflow.is_fatal());
        assert!(Error::Protocol("bad message length 8".to_owned()).is_fatal());
    }

    #[test]
    fn conversion_names_the_type() {
        let err = Error::conversion::<crate::Side>("0x05");
        assert_eq!(
            err.to_string(),
            "couldn't convert 0x05 to dbn_live::enums::Side"
        );
    }
}
