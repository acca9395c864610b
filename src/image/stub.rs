//! The boot stub is a small blob of code that goes at address zero. The boot loader
//! starts executing there and the stub jumps to the program's real entry point which
//! is stored as a big-endian word right after the stub.
use crate::errors::ConvertError;
use std::fs;
use std::path::{Path, PathBuf};

pub struct BootStub {
    pub path: PathBuf,
    pub template: Vec<u8>,
}

impl BootStub {
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        match fs::read(path) {
            Ok(template) => Ok(BootStub {
                path: path.to_path_buf(),
                template,
            }),
            Err(_) => Err(ConvertError::MissingResource {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Returns template followed by entry in big-endian order.
pub fn compose_stub(template: &[u8], entry: u32) -> Vec<u8> {
    let mut stub = Vec::with_capacity(template.len() + 4);
    stub.extend_from_slice(template);
    stub.extend_from_slice(&entry.to_be_bytes());
    stub
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_big_endian_entry() {
        let stub = compose_stub(&[0xaa, 0xbb], 0x0040_1004);
        assert_eq!(stub, vec![0xaa, 0xbb, 0x00, 0x40, 0x10, 0x04]);
        assert_eq!(compose_stub(&[], 0x1004), vec![0x00, 0x00, 0x10, 0x04]);
    }

    #[test]
    fn loads_shipped_stub() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("startup/startup.bin");
        let stub = BootStub::load(&path).unwrap();
        assert_eq!(stub.template.len(), 24);
        let composed = compose_stub(&stub.template, 0x400180);
        assert_eq!(&composed[24..], &[0x00, 0x40, 0x01, 0x80]);
    }

    #[test]
    fn missing_stub() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("startup.bin");
        match BootStub::load(&path) {
            Err(ConvertError::MissingResource { path: p }) => assert_eq!(p, path),
            _ => panic!("expected MissingResource"),
        }
    }
}
