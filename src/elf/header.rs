//! The ELF file header, i.e. the Elf32_Ehdr or Elf64_Ehdr at the start of the file.
use super::{Reader, Stream};
use std::error::Error;

pub struct ElfHeader {
    /// Relocatable, executable, shared object, or core.
    pub etype: u16,

    /// CPU architecture.
    pub machine: u16,

    /// Address of the first instruction to execute.
    pub entry: u64,

    /// Offset in the file to the program header table.
    pub ph_offset: u64,

    /// Offset in the file to the section header table. Zero if there isn't one.
    pub section_offset: u64,

    /// Processor specific flags, e.g. the MIPS ABI.
    pub flags: u32,

    pub ph_entry_size: u16,
    pub num_ph_entries: u16,
    pub section_entry_size: u16,
    pub num_section_entries: u16,

    /// Section index containing the section names.
    pub string_table_index: u16,
}

impl ElfHeader {
    pub fn new(reader: &Reader) -> Result<Self, Box<dyn Error>> {
        // Everything after e_ident, see https://llvm.org/doxygen/BinaryFormat_2ELF_8h_source.html
        let mut s = Stream::new(reader, 0x10);
        let etype = s.read_half()?;
        let machine = s.read_half()?;
        let _version = s.read_word()?;
        let entry = s.read_addr()?;
        let ph_offset = s.read_offset()?;
        let section_offset = s.read_offset()?;
        let flags = s.read_word()?;
        let _header_size = s.read_half()?;
        let ph_entry_size = s.read_half()?;
        let num_ph_entries = s.read_half()?;
        let section_entry_size = s.read_half()?;
        let num_section_entries = s.read_half()?;
        let string_table_index = s.read_half()?;
        Ok(ElfHeader {
            etype,
            machine,
            entry,
            ph_offset,
            section_offset,
            flags,
            ph_entry_size,
            num_ph_entries,
            section_entry_size,
            num_section_entries,
            string_table_index,
        })
    }

    pub fn stype(&self) -> &'static str {
        match self.etype {
            0 => "none",
            1 => "relocatable",
            2 => "executable",
            3 => "shared object",
            4 => "core",
            _ => "unknown",
        }
    }

    pub fn machine(&self) -> String {
        match self.machine {
            0x03 => "x86".to_string(),
            0x08 => "MIPS".to_string(),
            0x14 => "PowerPC".to_string(),
            0x28 => "ARM".to_string(),
            0x3e => "x86-64".to_string(),
            0xb7 => "AArch64".to_string(),
            0xf3 => "RISC-V".to_string(),
            m => format!("machine {m:#x}"),
        }
    }
}
