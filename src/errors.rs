use std::io;
use std::path::PathBuf;

/// Everything that can stop a conversion. All of these are fatal: main reports the
/// error and exits with a non-zero status.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("couldn't read {}: {source}", path.display())]
    InputNotFound { path: PathBuf, source: io::Error },

    #[error("malformed ELF file: {0}")]
    MalformedInput(String),

    #[error("missing boot stub: {} (use --stub to pick one)", path.display())]
    MissingResource { path: PathBuf },

    #[error("write of {len:#x} bytes at {dest:#x} doesn't fit in a {size:#x} byte image")]
    OversizedAddress { dest: u64, len: u64, size: u64 },

    #[error("image needs {size:#x} bytes but the limit is {max:#x}")]
    ImageTooLarge { size: u64, max: u64 },

    #[error("conflicting writes: {0}")]
    OverlappingWrites(String),

    #[error("couldn't write {}: {source}", path.display())]
    OutputWrite { path: PathBuf, source: io::Error },
}

impl ConvertError {
    pub fn malformed(err: impl std::fmt::Display) -> Self {
        ConvertError::MalformedInput(err.to_string())
    }
}
