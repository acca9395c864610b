//! An executable along with the bits of it that the image builder needs.
use super::{ElfHeader, LoadSegment, ProgramHeader, Reader, SegmentType, Stream};
use crate::elf::{Bytes, Offset, SectionHeader, SectionType, VirtualAddr};
use crate::errors::ConvertError;
use crate::image::{GotSection, Segment};
use crate::utils;
use memmap2::Mmap;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct ElfFile {
    pub header: ElfHeader,
    pub path: PathBuf,
    pub reader: Reader,
    pub loads: Vec<LoadSegment>,
    pub sections: Vec<SectionHeader>,
}

impl ElfFile {
    pub fn new(path: &Path) -> Result<Self, ConvertError> {
        let not_found = |source| ConvertError::InputNotFound {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(not_found)?;
        if file.metadata().map_err(not_found)?.len() == 0 {
            return Err(ConvertError::malformed("file is empty"));
        }

        // This is unsafe because it has undefined behavior if the underlying file is
        // modified while the memory map is in use.
        let bytes = unsafe { Mmap::map(&file) }.map_err(not_found)?;
        ElfFile::parse(path.to_path_buf(), Box::new(bytes)).map_err(ConvertError::malformed)
    }

    #[cfg(test)]
    pub fn from_bytes(path: PathBuf, bytes: Vec<u8>) -> Result<Self, ConvertError> {
        ElfFile::parse(path, Box::new(bytes)).map_err(ConvertError::malformed)
    }

    /// The address of the first instruction to execute.
    pub fn entry(&self) -> u64 {
        self.header.entry
    }

    /// The load segments in file order.
    pub fn segments(&self) -> Result<Vec<Segment<'_>>, ConvertError> {
        self.loads
            .iter()
            .map(|load| {
                let bytes = self
                    .read_bytes(&load.obytes)
                    .map_err(ConvertError::malformed)?;
                Ok(Segment {
                    vaddr: load.vbytes.start.0,
                    mem_size: load.vbytes.size,
                    bytes,
                })
            })
            .collect()
    }

    /// The .got section, if there is one.
    pub fn got(&self) -> Result<Option<GotSection<'_>>, ConvertError> {
        let Some(section) = self.find_section(".got") else {
            return Ok(None);
        };
        let obytes = Bytes::<Offset>::from_raw(section.obytes.start.0, section.file_size());
        let bytes = self.read_bytes(&obytes).map_err(ConvertError::malformed)?;
        Ok(Some(GotSection {
            addr: section.vbytes.start.0,
            size: section.vbytes.size,
            bytes,
        }))
    }

    pub fn find_section(&self, name: &str) -> Option<&SectionHeader> {
        self.sections
            .iter()
            .find(|s| self.find_section_name(s).as_deref() == Some(name))
    }

    /// Returns the section's name from the section name string table.
    pub fn find_section_name(&self, section: &SectionHeader) -> Option<String> {
        let table = self
            .sections
            .get(self.header.string_table_index as usize)?;
        if table.stype != SectionType::StringTable || section.name as u64 >= table.obytes.size {
            return None;
        }
        let offset = table.obytes.start.0.checked_add(section.name as u64)?;
        match Stream::new(&self.reader, offset as usize).read_string() {
            Ok(s) => Some(s),
            Err(err) => {
                utils::warn(&format!(
                    "failed to read section name {}: {err}",
                    section.name
                ));
                None
            }
        }
    }
}

impl ElfFile {
    fn parse(path: PathBuf, bytes: Box<dyn AsRef<[u8]>>) -> Result<Self, Box<dyn Error>> {
        let reader = Reader::new(bytes)?;
        let header = ElfHeader::new(&reader)?;
        let loads = ElfFile::load_loads(&reader, &header)?;
        let sections = ElfFile::load_sections(&reader, &header)?;
        Ok(ElfFile {
            header,
            path,
            reader,
            loads,
            sections,
        })
    }

    fn read_bytes(&self, obytes: &Bytes<Offset>) -> Result<&[u8], Box<dyn Error>> {
        let start = usize::try_from(obytes.start.0)?;
        let size = usize::try_from(obytes.size)?;
        self.reader.slice(start, size)
    }

    fn load_loads(
        reader: &Reader,
        header: &ElfHeader,
    ) -> Result<Vec<LoadSegment>, Box<dyn Error>> {
        let min_entry_size = if reader.sixty_four_bit { 56 } else { 32 };
        utils::require(header.num_ph_entries > 0, "no program headers")?;
        utils::require(
            header.ph_entry_size >= min_entry_size,
            &format!("bad program header size: {}", header.ph_entry_size),
        )?;

        let mut loads = Vec::new();
        let mut offset = usize::try_from(header.ph_offset)?;
        for i in 0..header.num_ph_entries {
            let ph = ProgramHeader::new(reader, offset)
                .map_err(|err| format!("failed to read program header {i}: {err}"))?;
            if ph.stype == SegmentType::Load {
                let obytes = Bytes::<Offset>::from_raw(ph.offset, ph.file_size);
                let vbytes = Bytes::<VirtualAddr>::from_raw(ph.vaddr, ph.mem_size);
                utils::require(
                    obytes.end().is_some_and(|end| end <= reader.len() as u64),
                    &format!("load segment {i} is past the end of the file"),
                )?;
                loads.push(LoadSegment { obytes, vbytes });
            }
            offset += header.ph_entry_size as usize;
        }
        Ok(loads)
    }

    // Sections are only needed to find the GOT so a file without a section table
    // is fine.
    fn load_sections(
        reader: &Reader,
        header: &ElfHeader,
    ) -> Result<Vec<SectionHeader>, Box<dyn Error>> {
        let mut sections = Vec::new();
        if header.section_offset == 0 || header.num_section_entries == 0 {
            return Ok(sections);
        }

        let min_entry_size = if reader.sixty_four_bit { 64 } else { 40 };
        utils::require(
            header.section_entry_size >= min_entry_size,
            &format!("bad section header size: {}", header.section_entry_size),
        )?;

        let mut offset = usize::try_from(header.section_offset)?;
        for i in 0..header.num_section_entries {
            let h = SectionHeader::new(reader, offset)
                .map_err(|err| format!("failed to read section header {i}: {err}"))?;
            sections.push(h);
            offset += header.section_entry_size as usize;
        }
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::test_elf::ElfWriter;

    fn parse(bytes: Vec<u8>) -> Result<ElfFile, ConvertError> {
        ElfFile::from_bytes(PathBuf::from("test.elf"), bytes)
    }

    fn malformed(bytes: Vec<u8>) -> String {
        match parse(bytes) {
            Err(ConvertError::MalformedInput(mesg)) => mesg,
            Err(err) => panic!("expected MalformedInput but got {err}"),
            Ok(_) => panic!("expected MalformedInput"),
        }
    }

    #[test]
    fn mips_header() {
        let bytes = ElfWriter::elf32_be()
            .entry(0x400180)
            .segment(0x400000, 0x200, vec![0x11; 0x180])
            .build();
        let file = parse(bytes).unwrap();
        let s = format!(
            "{} {} entry {:#x}",
            file.header.stype(),
            file.header.machine(),
            file.entry()
        );
        insta::assert_snapshot!(s, @"executable MIPS entry 0x400180");
    }

    #[test]
    fn segments_keep_file_order_and_sizes() {
        let bytes = ElfWriter::elf64_le()
            .segment(0x2000, 0x100, vec![0xcd; 0x40])
            .segment(0x1000, 0x20, vec![0xab; 0x20])
            .build();
        let file = parse(bytes).unwrap();
        let segments = file.segments().unwrap();
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].vaddr, 0x2000);
        assert_eq!(segments[0].mem_size, 0x100);
        assert_eq!(segments[0].bytes, &[0xcd; 0x40][..]);

        assert_eq!(segments[1].vaddr, 0x1000);
        assert_eq!(segments[1].mem_size, 0x20);
        assert_eq!(segments[1].bytes, &[0xab; 0x20][..]);
    }

    #[test]
    fn non_load_segments_are_skipped() {
        let bytes = ElfWriter::elf32_be()
            .note(vec![0; 0x10])
            .segment(0x1000, 0x10, vec![1; 0x10])
            .build();
        let file = parse(bytes).unwrap();
        assert_eq!(file.loads.len(), 1);
        assert_eq!(file.segments().unwrap()[0].vaddr, 0x1000);
    }

    #[test]
    fn finds_got() {
        let bytes = ElfWriter::elf32_be()
            .segment(0x1000, 0x100, vec![0; 0x100])
            .section(".text", 0x1000, vec![0; 0x10])
            .section(".got", 0x1080, vec![0xee; 8])
            .build();
        let file = parse(bytes).unwrap();
        let got = file.got().unwrap().unwrap();
        assert_eq!(got.addr, 0x1080);
        assert_eq!(got.size, 8);
        assert_eq!(got.bytes, &[0xee; 8][..]);

        let text = file.find_section(".text").unwrap();
        assert_eq!(text.vbytes.start.0, 0x1000);
        assert!(file.find_section(".data").is_none());
    }

    #[test]
    fn got_is_optional() {
        let bytes = ElfWriter::elf64_le()
            .segment(0x1000, 0x10, vec![0; 0x10])
            .section(".text", 0x1000, vec![0; 0x10])
            .build();
        assert!(parse(bytes).unwrap().got().unwrap().is_none());

        let bytes = ElfWriter::elf64_le()
            .segment(0x1000, 0x10, vec![0; 0x10])
            .build();
        let file = parse(bytes).unwrap();
        assert!(file.sections.is_empty());
        assert!(file.got().unwrap().is_none());
    }

    #[test]
    fn nobits_got_has_no_bytes() {
        let bytes = ElfWriter::elf32_be()
            .segment(0x1000, 0x100, vec![0; 0x10])
            .nobits_section(".got", 0x1040, 0x20)
            .build();
        let file = parse(bytes).unwrap();
        let got = file.got().unwrap().unwrap();
        assert_eq!(got.addr, 0x1040);
        assert_eq!(got.size, 0x20);
        assert!(got.bytes.is_empty());
    }

    #[test]
    fn rejects_non_elf() {
        let mut script = b"#!/bin/sh\necho this is not an executable\n".to_vec();
        assert_eq!(malformed(script.clone()), "file is much too small");

        script.resize(0x80, b'\n');
        assert_eq!(malformed(script), "not an ELF file (bad magic)");
    }

    #[test]
    fn rejects_missing_program_headers() {
        let bytes = ElfWriter::elf32_be().section(".got", 0, vec![0; 4]).build();
        assert_eq!(malformed(bytes), "no program headers");
    }

    #[test]
    fn rejects_truncated_files() {
        let bytes = ElfWriter::elf64_le()
            .segment(0x1000, 0x100, vec![0x5a; 0x100])
            .build();

        // cut into the segment data
        let mesg = malformed(bytes[..0x100].to_vec());
        assert_eq!(mesg, "load segment 0 is past the end of the file");

        // cut into the program headers
        let mesg = malformed(bytes[..0x50].to_vec());
        assert!(mesg.starts_with("failed to read program header 0"), "{mesg}");
    }

    #[test]
    fn missing_file() {
        let path = std::path::Path::new("/definitely/not/here.elf");
        match ElfFile::new(path) {
            Err(ConvertError::InputNotFound { path: p, .. }) => assert_eq!(p, path),
            _ => panic!("expected InputNotFound"),
        }
    }

    #[test]
    fn maps_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.elf");
        let bytes = ElfWriter::elf32_be()
            .entry(0x1000)
            .segment(0x1000, 0x10, vec![7; 0x10])
            .build();
        std::fs::write(&path, bytes).unwrap();

        let file = ElfFile::new(&path).unwrap();
        assert_eq!(file.path, path);
        assert_eq!(file.entry(), 0x1000);
        assert_eq!(file.segments().unwrap()[0].bytes, &[7; 0x10][..]);

        let empty = dir.path().join("empty.elf");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            ElfFile::new(&empty),
            Err(ConvertError::MalformedInput(_))
        ));
    }
}
