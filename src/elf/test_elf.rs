//! Writes small executables for unit tests: an ELF header, program headers, segment
//! and section contents, a section name table, and section headers, in that order.

const PT_LOAD: u32 = 1;
const PT_NOTE: u32 = 4;
const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHT_NOBITS: u32 = 8;

struct TestSegment {
    stype: u32,
    vaddr: u64,
    mem_size: u64,
    data: Vec<u8>,
}

struct TestSection {
    name: String,
    stype: u32,
    addr: u64,
    size: u64,
    data: Vec<u8>,
}

pub struct ElfWriter {
    sixty_four_bit: bool,
    little_endian: bool,
    machine: u16,
    entry: u64,
    segments: Vec<TestSegment>,
    sections: Vec<TestSection>,
}

impl ElfWriter {
    pub fn new(sixty_four_bit: bool, little_endian: bool, machine: u16) -> Self {
        ElfWriter {
            sixty_four_bit,
            little_endian,
            machine,
            entry: 0,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// What the Cannon MIPS target produces.
    pub fn elf32_be() -> Self {
        ElfWriter::new(false, false, 0x08)
    }

    pub fn elf64_le() -> Self {
        ElfWriter::new(true, true, 0x3e)
    }

    pub fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    pub fn segment(mut self, vaddr: u64, mem_size: u64, data: Vec<u8>) -> Self {
        self.segments.push(TestSegment {
            stype: PT_LOAD,
            vaddr,
            mem_size,
            data,
        });
        self
    }

    pub fn note(mut self, data: Vec<u8>) -> Self {
        self.segments.push(TestSegment {
            stype: PT_NOTE,
            vaddr: 0,
            mem_size: 0,
            data,
        });
        self
    }

    pub fn section(mut self, name: &str, addr: u64, data: Vec<u8>) -> Self {
        self.sections.push(TestSection {
            name: name.to_string(),
            stype: SHT_PROGBITS,
            addr,
            size: data.len() as u64,
            data,
        });
        self
    }

    pub fn nobits_section(mut self, name: &str, addr: u64, size: u64) -> Self {
        self.sections.push(TestSection {
            name: name.to_string(),
            stype: SHT_NOBITS,
            addr,
            size,
            data: Vec::new(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let (header_size, ph_size, sh_size) = if self.sixty_four_bit {
            (64, 56, 64)
        } else {
            (52, 32, 40)
        };

        // Lay out the file before writing anything.
        let ph_offset = header_size;
        let mut offset = ph_offset + ph_size * self.segments.len();
        let mut segment_offsets = Vec::new();
        for segment in self.segments.iter() {
            segment_offsets.push(offset);
            offset += segment.data.len();
        }
        let mut section_offsets = Vec::new();
        for section in self.sections.iter() {
            section_offsets.push(offset);
            offset += section.data.len();
        }

        let mut names = vec![0u8];
        let mut name_offsets = Vec::new();
        for section in self.sections.iter() {
            name_offsets.push(names.len() as u32);
            names.extend_from_slice(section.name.as_bytes());
            names.push(0);
        }
        let names_name = names.len() as u32;
        names.extend_from_slice(b".shstrtab\0");
        let names_offset = offset;
        offset += names.len();

        // null section + ours + .shstrtab
        let (sh_offset, num_sections) = if self.sections.is_empty() {
            (0, 0)
        } else {
            ((offset + 7) & !7, self.sections.len() + 2)
        };

        let mut out = Out {
            bytes: Vec::new(),
            sixty_four_bit: self.sixty_four_bit,
            little_endian: self.little_endian,
        };
        out.bytes.extend_from_slice(&[0x7f, b'E', b'L', b'F']);
        out.bytes.push(if self.sixty_four_bit { 2 } else { 1 });
        out.bytes.push(if self.little_endian { 1 } else { 2 });
        out.bytes.push(1);
        out.bytes.resize(16, 0);
        out.half(2); // executable
        out.half(self.machine);
        out.word(1);
        out.addr(self.entry);
        out.addr(if self.segments.is_empty() { 0 } else { ph_offset as u64 });
        out.addr(sh_offset as u64);
        out.word(0);
        out.half(header_size as u16);
        out.half(ph_size as u16);
        out.half(self.segments.len() as u16);
        out.half(sh_size as u16);
        out.half(num_sections as u16);
        out.half(if num_sections > 0 { num_sections as u16 - 1 } else { 0 });
        assert_eq!(out.bytes.len(), header_size);

        for (segment, &offset) in self.segments.iter().zip(segment_offsets.iter()) {
            let file_size = segment.data.len() as u64;
            out.word(segment.stype);
            if self.sixty_four_bit {
                out.word(0x7); // rwx
                out.addr(offset as u64);
                out.addr(segment.vaddr);
                out.addr(segment.vaddr);
                out.addr(file_size);
                out.addr(segment.mem_size);
                out.addr(0x1000);
            } else {
                out.addr(offset as u64);
                out.addr(segment.vaddr);
                out.addr(segment.vaddr);
                out.addr(file_size);
                out.addr(segment.mem_size);
                out.word(0x7);
                out.addr(0x1000);
            }
        }
        for segment in self.segments.iter() {
            out.bytes.extend_from_slice(&segment.data);
        }
        for section in self.sections.iter() {
            out.bytes.extend_from_slice(&section.data);
        }
        out.bytes.extend_from_slice(&names);

        if num_sections > 0 {
            out.bytes.resize(sh_offset, 0);
            out.section(0, 0, 0, 0, 0);
            for (i, section) in self.sections.iter().enumerate() {
                let offset = section_offsets[i] as u64;
                out.section(name_offsets[i], section.stype, section.addr, offset, section.size);
            }
            out.section(
                names_name,
                SHT_STRTAB,
                0,
                names_offset as u64,
                names.len() as u64,
            );
        }
        out.bytes
    }
}

struct Out {
    bytes: Vec<u8>,
    sixty_four_bit: bool,
    little_endian: bool,
}

impl Out {
    fn half(&mut self, value: u16) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn word(&mut self, value: u32) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn addr(&mut self, value: u64) {
        if !self.sixty_four_bit {
            self.word(value as u32);
        } else if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn section(&mut self, name: u32, stype: u32, addr: u64, offset: u64, size: u64) {
        self.word(name);
        self.word(stype);
        self.addr(0); // flags
        self.addr(addr);
        self.addr(offset);
        self.addr(size);
        self.word(0); // link
        self.word(0); // info
        self.addr(1); // align
        self.addr(0); // entry size
    }
}
