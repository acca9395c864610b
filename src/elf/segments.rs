//! Used by loaders. Also see sections.
use super::{Reader, Stream};
use crate::{
    elf::{Bytes, Offset, VirtualAddr},
    utils,
};
use std::error::Error;

/// Describes a segment. Usually LoadSegment will be used instead of this.
pub struct ProgramHeader {
    // Elf64_Phdr or Elf32_Phdr, see https://llvm.org/doxygen/BinaryFormat_2ELF_8h_source.html
    pub stype: SegmentType,

    /// Offset to the first byte of the segment.
    pub offset: u64,

    /// Virtual address of the first byte in the segment.
    pub vaddr: u64,

    /// Number of bytes in the segment in the file.
    pub file_size: u64,

    /// Number of bytes in the segment in memory.
    pub mem_size: u64,
}

#[derive(Debug, Eq, PartialEq)]
pub enum SegmentType {
    /// Not to be used: either it's a segment that is intended to be not used or one
    /// that is not recognized.
    Null,

    /// A loadable segment, described by p_filesz and p_memsz.
    Load,

    /// Specifies dynamic linking information.
    Dynamic,

    /// Location and size of a null-terminated path name to invoke as an interpreter.
    Interpreter,

    /// The location and size of auxiliary information.
    Note,

    /// Reserved but has unspecified semantics.
    Shlib,

    /// The location and size of the program header table itself.
    Phdr,

    // The Thread-Local Storage template.
    Tls,
}

impl SegmentType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SegmentType::Null,
            1 => SegmentType::Load,
            2 => SegmentType::Dynamic,
            3 => SegmentType::Interpreter,
            4 => SegmentType::Note,
            5 => SegmentType::Shlib,
            6 => SegmentType::Phdr,
            7 => SegmentType::Tls,
            0x60000000..0x70000000 => SegmentType::Null, // OS-specific, e.g. GNU_STACK
            0x70000000..0x80000000 => SegmentType::Null, // processor-specific, e.g. MIPS_ABIFLAGS
            0x80000000.. => SegmentType::Null,           // reserved for future use
            _ => {
                utils::warn(&format!("Unknown segment type: {value}"));
                SegmentType::Null
            }
        }
    }
}

pub struct LoadSegment {
    /// The bytes stored in the ELF file. This can be smaller than vbytes in which case
    /// the rest of the segment is zero filled.
    pub obytes: Bytes<Offset>,

    /// Where the segment lives in the target's memory.
    pub vbytes: Bytes<VirtualAddr>,
}

impl ProgramHeader {
    pub fn new(reader: &Reader, offset: usize) -> Result<Self, Box<dyn Error>> {
        // Field sizes and order differ between 32-bit and 64-bit ELF files,
        // see https://llvm.org/doxygen/BinaryFormat_2ELF_8h_source.html.
        let mut s = Stream::new(reader, offset);
        if reader.sixty_four_bit {
            let p_type = SegmentType::from_u32(s.read_word()?);
            let _p_flags = s.read_word()?;
            let p_offset = s.read_offset()?;
            let p_vaddr = s.read_addr()?;
            let _p_paddr = s.read_addr()?;
            let p_filesz = s.read_xword()?;
            let p_memsz = s.read_xword()?;
            let _p_align = s.read_xword()?;
            Ok(ProgramHeader {
                stype: p_type,
                offset: p_offset,
                vaddr: p_vaddr,
                file_size: p_filesz,
                mem_size: p_memsz,
            })
        } else {
            let p_type = SegmentType::from_u32(s.read_word()?);
            let p_offset = s.read_offset()?;
            let p_vaddr = s.read_addr()?;
            let _p_paddr = s.read_addr()?;
            let p_filesz = s.read_word()? as u64;
            let p_memsz = s.read_word()? as u64;
            let _p_flags = s.read_word()?;
            let _p_align = s.read_word()?;
            Ok(ProgramHeader {
                stype: p_type,
                offset: p_offset,
                vaddr: p_vaddr,
                file_size: p_filesz,
                mem_size: p_memsz,
            })
        }
    }
}
