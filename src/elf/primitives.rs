/// An index into a byte within an ELF file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Offset(pub u64);

/// The address a byte will have once the program is loaded into the target's memory.
/// For a flat image this is also the offset into the image.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct VirtualAddr(pub u64);

impl From<Offset> for u64 {
    fn from(offset: Offset) -> u64 {
        offset.0
    }
}

impl From<VirtualAddr> for u64 {
    fn from(addr: VirtualAddr) -> u64 {
        addr.0
    }
}

/// A range of bytes that can be addressed using either offsets into an ELF file or
/// virtual addresses. Segments and sections have one of each and the sizes of the two
/// can differ, e.g. .bss takes up memory but no space in the file.
#[derive(Copy, Clone, Debug)]
pub struct Bytes<A>
where
    A: Into<u64> + Copy + Ord,
{
    pub start: A,
    pub size: u64,
}

impl Bytes<Offset> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: Offset(start),
            size,
        }
    }
}

impl Bytes<VirtualAddr> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: VirtualAddr(start),
            size,
        }
    }
}

impl<A: Into<u64> + Copy + Ord> Bytes<A> {
    /// One past the last byte, or None if that doesn't fit into 64 bits (which
    /// happens with garbage headers).
    pub fn end(&self) -> Option<u64> {
        self.start.into().checked_add(self.size)
    }
}
