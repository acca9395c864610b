use crate::utils;
use std::error::Error;

/// Endian and word size aware access to the bytes of an ELF file. Usually the bytes
/// come from a memory mapped file but tests use plain vectors.
pub struct Reader {
    pub little_endian: bool,
    pub sixty_four_bit: bool,
    bytes: Box<dyn AsRef<[u8]>>,
}

impl Reader {
    /// Note that these functions all return a Result because the input may be
    /// truncated or not an ELF file at all.
    pub fn new(bytes: Box<dyn AsRef<[u8]>>) -> Result<Self, Box<dyn Error>> {
        // see https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
        let data = (*bytes).as_ref();
        utils::require(data.len() >= 0x34, "file is much too small")?;
        utils::require(
            data[0] == 0x7f && data[1] == 0x45 && data[2] == 0x4c && data[3] == 0x46,
            "not an ELF file (bad magic)",
        )?;

        let ei_class = data[0x04];
        let ei_data = data[0x05];
        let ei_version = data[0x06];
        utils::require(
            ei_class == 1 || ei_class == 2,
            &format!("bad elf class: {ei_class}"),
        )?;
        utils::require(
            ei_data == 1 || ei_data == 2,
            &format!("bad elf data encoding: {ei_data}"),
        )?;
        utils::require(ei_version == 1, &format!("bad elf version: {ei_version}"))?;
        if ei_class == 2 {
            utils::require(data.len() >= 0x40, "file is too small for a 64-bit header")?;
        }

        Ok(Reader {
            bytes,
            sixty_four_bit: ei_class == 2,
            little_endian: ei_data == 1,
        })
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&[u8], Box<dyn Error>> {
        match offset.checked_add(size) {
            Some(end) if end <= self.len() => Ok(&self.data()[offset..end]),
            _ => Err(format!(
                "{size:#x} bytes at offset {offset:#x} are past the end of the file ({:#x} bytes)",
                self.len()
            )
            .into()),
        }
    }

    pub fn read_byte(&self, offset: usize) -> Result<u8, Box<dyn Error>> {
        self.data()
            .get(offset)
            .ok_or_else(|| format!("couldn't read byte at offset {offset:#x}").into())
            .copied()
    }

    pub fn read_half(&self, offset: usize) -> Result<u16, Box<dyn Error>> {
        let slice = self.slice(offset, 2)?;
        if self.little_endian {
            Ok(u16::from_le_bytes(slice.try_into()?))
        } else {
            Ok(u16::from_be_bytes(slice.try_into()?))
        }
    }

    pub fn read_word(&self, offset: usize) -> Result<u32, Box<dyn Error>> {
        let slice = self.slice(offset, 4)?;
        if self.little_endian {
            Ok(u32::from_le_bytes(slice.try_into()?))
        } else {
            Ok(u32::from_be_bytes(slice.try_into()?))
        }
    }

    pub fn read_xword(&self, offset: usize) -> Result<u64, Box<dyn Error>> {
        let slice = self.slice(offset, 8)?;
        if self.little_endian {
            Ok(u64::from_le_bytes(slice.try_into()?))
        } else {
            Ok(u64::from_be_bytes(slice.try_into()?))
        }
    }

    /// Read either a u32 or u64 word depending on whether the file is 64-bit.
    /// But, for sanity, always return the result as 64 bits.
    pub fn read_addr(&self, offset: usize) -> Result<u64, Box<dyn Error>> {
        if self.sixty_four_bit {
            self.read_xword(offset)
        } else {
            Ok(self.read_word(offset)? as u64)
        }
    }

    fn data(&self) -> &[u8] {
        (*self.bytes).as_ref()
    }
}

pub struct Stream<'a> {
    pub reader: &'a Reader,
    pub offset: usize,
}

impl<'a> Stream<'a> {
    pub fn new(reader: &'a Reader, offset: usize) -> Self {
        Stream { reader, offset }
    }

    pub fn read_byte(&mut self) -> Result<u8, Box<dyn Error>> {
        let byte = self.reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16, Box<dyn Error>> {
        let half = self.reader.read_half(self.offset)?;
        self.offset += 2;
        Ok(half)
    }

    pub fn read_word(&mut self) -> Result<u32, Box<dyn Error>> {
        let word = self.reader.read_word(self.offset)?;
        self.offset += 4;
        Ok(word)
    }

    pub fn read_xword(&mut self) -> Result<u64, Box<dyn Error>> {
        let xword = self.reader.read_xword(self.offset)?;
        self.offset += 8;
        Ok(xword)
    }

    /// Addresses, offsets, and sizes are 32 bits in ELF32 files and 64 bits in ELF64
    /// files.
    pub fn read_addr(&mut self) -> Result<u64, Box<dyn Error>> {
        let addr = self.reader.read_addr(self.offset)?;
        self.offset += if self.reader.sixty_four_bit { 8 } else { 4 };
        Ok(addr)
    }

    pub fn read_offset(&mut self) -> Result<u64, Box<dyn Error>> {
        self.read_addr()
    }

    /// Read a null-terminated ASCII string.
    pub fn read_string(&mut self) -> Result<String, Box<dyn Error>> {
        let mut s = String::new();
        loop {
            let byte = self.read_byte()?;
            if byte == 0 {
                break;
            }
            s.push(byte as char);
        }
        Ok(s)
    }
}
