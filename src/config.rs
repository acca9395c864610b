//! Settings for a conversion. These are resolved once, in main, and then passed down
//! so nothing below main looks at the environment.
use crate::errors::ConvertError;
use crate::image::{BuildOptions, OverlapPolicy};
use std::env;
use std::path::{Path, PathBuf};

/// Target program memory is 16 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 0x100_0000;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Boot stub template.
    pub stub_path: PathBuf,

    pub overlap: OverlapPolicy,

    /// Largest image allowed, None for no limit.
    pub max_size: Option<u64>,

    /// Number of bytes from the start of the image to hex dump, may be zero.
    pub dump: usize,

    /// Add column help to the writes table.
    pub explain: bool,
}

impl Config {
    /// If stub_path is None the stub installed next to our executable is used.
    /// max_size of zero means no limit.
    pub fn new(
        stub_path: Option<PathBuf>,
        strict: bool,
        max_size: u64,
        dump: usize,
        explain: bool,
    ) -> Result<Self, ConvertError> {
        let stub_path = match stub_path {
            Some(path) => path,
            None => default_stub_path()?,
        };
        Ok(Config {
            stub_path,
            overlap: if strict {
                OverlapPolicy::Strict
            } else {
                OverlapPolicy::Lenient
            },
            max_size: if max_size == 0 { None } else { Some(max_size) },
            dump,
            explain,
        })
    }

    /// Defaults except for the stub.
    #[cfg(test)]
    pub fn with_stub(stub_path: &Path) -> Self {
        Config {
            stub_path: stub_path.to_path_buf(),
            overlap: OverlapPolicy::default(),
            max_size: Some(DEFAULT_MAX_SIZE),
            dump: 0,
            explain: false,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            overlap: self.overlap,
            max_size: self.max_size,
        }
    }
}

/// startup/startup.bin in the directory containing the running executable.
pub fn default_stub_path() -> Result<PathBuf, ConvertError> {
    let missing = || ConvertError::MissingResource {
        path: PathBuf::from("startup/startup.bin"),
    };
    let exe = env::current_exe().map_err(|_| missing())?;
    let dir = exe.parent().ok_or_else(missing)?;
    Ok(stub_path_in(dir))
}

pub fn stub_path_in(dir: &Path) -> PathBuf {
    dir.join("startup").join("startup.bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_settings() {
        let config = Config::new(Some(PathBuf::from("/opt/stub.bin")), true, 0, 64, true).unwrap();
        assert_eq!(config.stub_path, PathBuf::from("/opt/stub.bin"));
        assert_eq!(config.overlap, OverlapPolicy::Strict);
        assert_eq!(config.max_size, None);
        assert_eq!(config.dump, 64);
        assert!(config.explain);
    }

    #[test]
    fn defaults() {
        let config = Config::new(None, false, DEFAULT_MAX_SIZE, 0, false).unwrap();
        let exe = env::current_exe().unwrap();
        assert_eq!(config.stub_path, stub_path_in(exe.parent().unwrap()));
        assert_eq!(
            config.build_options(),
            BuildOptions {
                overlap: OverlapPolicy::Lenient,
                max_size: Some(0x100_0000),
            }
        );
        assert_eq!(
            Config::with_stub(&config.stub_path).build_options(),
            config.build_options()
        );
    }
}
