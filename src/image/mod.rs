//! Flat images are what the target's boot loader copies verbatim into program memory.
//! There is no header and no relocation: byte N of the image lands at address N. So
//! building one is just a matter of:
//! * sizing a zero filled buffer so that it covers every load segment and the GOT,
//!   rounded up to a page,
//! * copying each segment's file bytes to its virtual address (the zero fill takes
//!   care of .bss style tails),
//! * copying the boot stub to address zero with the real entry point appended to it,
//! * copying the GOT to its address.
//!
//! The writes happen in that order and later writes win where they overlap. See
//! WritePlan for the details.
pub mod builder;
pub mod plan;
pub mod stub;

pub use builder::*;
pub use plan::*;
pub use stub::*;

use crate::utils::Styling;
use crate::utils::write_styled;
use sha2::{Digest, Sha256};
use std::io::Write;

/// The target's page size. Images are always a multiple of this.
pub const PAGE_SIZE: u64 = 0x1000;

/// A PT_LOAD segment as the builder sees it.
pub struct Segment<'a> {
    pub vaddr: u64,

    /// Size in memory, at least as large as bytes.len() for sane files.
    pub mem_size: u64,

    /// The bytes stored in the ELF file.
    pub bytes: &'a [u8],
}

/// The .got section. The bytes are empty if it's a NoBits section.
pub struct GotSection<'a> {
    pub addr: u64,
    pub size: u64,
    pub bytes: &'a [u8],
}

#[derive(Debug, Eq, PartialEq)]
pub struct FlatImage {
    bytes: Vec<u8>,
}

impl FlatImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() as u64 % PAGE_SIZE == 0);
        FlatImage { bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 of the image as lower case hex. Only used for diagnostics: nothing
    /// about the digest is written into the image.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    /// Classic 16 bytes per line dump with the image offset (i.e. the target address)
    /// on the left.
    pub fn hex_dump(&self, mut out: impl Write, offset: usize, size: usize) {
        let end = offset.saturating_add(size).min(self.bytes.len());
        let mut i = offset;
        while i < end {
            let line = &self.bytes[i..end.min(i + 16)];
            write_styled!(out, "{:08x}: ", hex_offset, i);
            for (j, byte) in line.iter().enumerate() {
                if j == 8 {
                    let _ = write!(out, " ");
                }
                write_styled!(out, "{:02x} ", hex_hex, byte);
            }
            let _ = write!(out, "  ");
            for byte in line {
                let ch = *byte as char;
                if ch.is_ascii_graphic() {
                    write_styled!(out, "{}", hex_ascii, ch);
                } else {
                    write_styled!(out, ".", hex_ascii);
                }
            }
            let _ = writeln!(out);
            i += 16;
        }
    }
}
