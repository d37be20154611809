use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration, decoding region data or
/// building and writing schematics.
#[derive(Debug, Error)]
pub enum XrayError {
    #[error("{source_name} is unusable: {reason}")]
    Configuration { source_name: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed region data in {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("section {section_y}: {field} holds {actual} bytes, expected {expected}")]
    MalformedSection {
        section_y: i8,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("section Y={section_y} lies outside the 16 sections of a chunk column")]
    SectionOutOfRange { section_y: i8 },

    #[error("cannot encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },

    #[error("schematic write at ({x}, {y}, {z}) is outside the {width}x{height}x{length} grid")]
    Bounds {
        x: i64,
        y: i64,
        z: i64,
        width: usize,
        height: usize,
        length: usize,
    },
}

impl XrayError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
