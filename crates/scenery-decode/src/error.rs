//! Error types.

use std::io;
use std::path::PathBuf;

use crate::layer::LayerError;

/// Errors that make a definition impossible to construct.
///
/// These are fatal to one definition only. Callers scanning a library are
/// expected to substitute a fallback (see [`crate::fallback::for_path`]) and
/// carry on.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The definition file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Header or version mismatch, missing record, or truncated continuation.
    #[error("line {line}: {reason}")]
    Format { line: usize, reason: String },

    /// A layer group record named an invalid layer.
    #[error(transparent)]
    Layer(#[from] LayerError),
}

impl DecodeError {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A texture that could not be loaded.
///
/// Never returned from a parse. It is recorded on the owning definition and
/// reported later, usually batched with others.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("can't read texture {filename}: {reason}")]
pub struct TextureError {
    /// Texture file name as declared or resolved.
    pub filename: String,
    /// Underlying reason, e.g. the IO or decoder message.
    pub reason: String,
}
