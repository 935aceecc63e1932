//! Error handling types and utilities.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for inventory operations.
pub type Result<T, E = InventoryError> = std::result::Result<T, E>;

/// Boxed cause attached to a [`InventoryError::Format`].
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building, reading or writing inventories.
///
/// Lookup misses and ambiguous matches are not errors; they are reported as
/// [`Diagnostic`](crate::search::Diagnostic)s instead.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The content of an inventory source is malformed.
    #[error("{message}")]
    Format {
        message: String,
        #[source]
        source: Option<Cause>,
    },
    /// An invalid value was passed to a constructor or operation.
    #[error("{message}")]
    Argument { message: String },
    /// Fetching a remote source failed after all retries.
    #[error(transparent)]
    Network(Box<ureq::Error>),
    /// Reading or writing a local file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl InventoryError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            source: None,
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a [`InventoryError::Format`].
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Whether this is a [`InventoryError::Argument`].
    pub const fn is_argument(&self) -> bool {
        matches!(self, Self::Argument { .. })
    }

    /// Converts an error from a codec into the error reported at the load
    /// boundary.
    ///
    /// Inventory errors pass through unchanged. Decoding failures (I/O while
    /// decompressing, invalid UTF-8, TOML syntax) become format errors with the
    /// original cause attached; anything else is an invalid source or format.
    pub(crate) fn from_codec(err: anyhow::Error, source: &str) -> Self {
        let err = match err.downcast::<Self>() {
            Ok(err) => return err,
            Err(err) => err,
        };

        let is_decode_error = err.chain().any(|cause| {
            cause.is::<std::io::Error>()
                || cause.is::<std::str::Utf8Error>()
                || cause.is::<std::string::FromUtf8Error>()
                || cause.is::<toml::de::Error>()
        });

        if is_decode_error {
            Self::Format {
                message: format!("Cannot parse inventory from {}: {:#}", source, err),
                source: Some(err.into()),
            }
        } else {
            Self::argument(format!("Invalid source or format {}: {:#}", source, err))
        }
    }
}

impl From<ureq::Error> for InventoryError {
    fn from(err: ureq::Error) -> Self {
        Self::Network(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use assert2::{check, let_assert};

    #[test]
    fn codec_errors_pass_through() {
        let err = anyhow::Error::from(InventoryError::format("Invalid Sphinx header line"));
        let converted = InventoryError::from_codec(err, "objects.inv");
        let_assert!(InventoryError::Format { message, .. } = converted);
        check!(message == "Invalid Sphinx header line");
    }

    #[test]
    fn decode_errors_become_format_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt deflate stream");
        let err = anyhow::Error::from(io).context("Failed to decompress body");
        let converted = InventoryError::from_codec(err, "objects.inv");
        check!(converted.is_format());
        check!(std::error::Error::source(&converted).is_some());
        check!(converted.to_string().contains("corrupt deflate stream"));
    }

    #[test]
    fn unexpected_errors_become_argument_errors() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("something odd")).context("while parsing");
        let converted = InventoryError::from_codec(err.unwrap_err(), "inventory.bin");
        check!(converted.is_argument());
        check!(converted.to_string().contains("Invalid source or format inventory.bin"));
    }
}
