//! Used by the linker. Also see segments. Loaders mostly ignore sections but the GOT
//! has to be located by name.
use super::{Reader, Stream};
use crate::elf::{Bytes, Offset, VirtualAddr};
use std::error::Error;

/// Describes a section.
#[derive(Clone)]
pub struct SectionHeader {
    // Elf32_Shdr or Elf64_Shdr, see https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
    /// Index into the section name string table. Zero means no name.
    pub name: u32,

    /// Type of the section.
    pub stype: SectionType,

    /// Where the section's bytes are in the file. For NoBits sections this is where
    /// they would be.
    pub obytes: Bytes<Offset>,

    /// Where the section lives in the target's memory.
    pub vbytes: Bytes<VirtualAddr>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionType {
    /// Dynamic linking information.
    Dynamic,

    /// Uninitialized data, takes up no space in the file.
    NoBits,

    /// Arbitrary metadata.
    Note,

    /// Not to be used.
    Null,

    /// CPU instructions, constant data, and things like the GOT.
    ProgBits,

    /// Relocation entries with addends.
    RelocationsWith,

    /// Relocation entries without addends.
    RelocationsWithout,

    /// Strings for use by the linker and debugger.
    StringTable,

    /// Debugging info.
    SymbolTable,

    /// OS or processor specific, e.g. MIPS .reginfo.
    Other(u32),
}

impl SectionType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x0 => SectionType::Null,
            0x1 => SectionType::ProgBits,
            0x2 => SectionType::SymbolTable,
            0x3 => SectionType::StringTable,
            0x4 => SectionType::RelocationsWith,
            0x6 => SectionType::Dynamic,
            0x7 => SectionType::Note,
            0x8 => SectionType::NoBits,
            0x9 => SectionType::RelocationsWithout,
            _ => SectionType::Other(value),
        }
    }
}

impl SectionHeader {
    pub fn new(reader: &Reader, offset: usize) -> Result<Self, Box<dyn Error>> {
        let mut s = Stream::new(reader, offset);
        if reader.sixty_four_bit {
            let name = s.read_word()?;
            let stype = SectionType::from_u32(s.read_word()?);
            let _flags = s.read_xword()?;
            let vaddr = s.read_addr()?;
            let offset = s.read_offset()?;
            let size = s.read_xword()?;
            Ok(SectionHeader {
                name,
                stype,
                obytes: Bytes::<Offset>::from_raw(offset, size),
                vbytes: Bytes::<VirtualAddr>::from_raw(vaddr, size),
            })
        } else {
            let name = s.read_word()?;
            let stype = SectionType::from_u32(s.read_word()?);
            let _flags = s.read_word()?;
            let vaddr = s.read_addr()?;
            let offset = s.read_offset()?;
            let size = s.read_word()? as u64;
            Ok(SectionHeader {
                name,
                stype,
                obytes: Bytes::<Offset>::from_raw(offset, size),
                vbytes: Bytes::<VirtualAddr>::from_raw(vaddr, size),
            })
        }
    }

    /// Number of bytes the section occupies in the file.
    pub fn file_size(&self) -> u64 {
        if self.stype == SectionType::NoBits {
            0
        } else {
            self.obytes.size
        }
    }
}
