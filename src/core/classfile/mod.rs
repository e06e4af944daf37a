//! Partial class-file parsing.
//!
//! Only as much of a class file is read as needed to reach `access_flags`:
//! the constant pool is walked entry by entry and skipped, never decoded.

mod reader;
mod scanner;

use thiserror::Error;

pub use reader::{is_public_class, ACC_PUBLIC};
pub use scanner::{is_synthetic_nested, scan_jar_packages, scan_jar_public_classes};

/// Failure while walking a class file.
#[derive(Debug, Error)]
pub enum ClassFormatError {
    #[error("class file truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { needed: u64, offset: u64 },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("read failed at offset {offset}: {source}")]
    Io {
        offset: u64,
        source: std::io::Error,
    },
}
