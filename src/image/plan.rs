//! Everything that goes into an image is a write of some bytes at some address. Writes
//! are applied in order (segments, then the stub, then the GOT) so where they overlap
//! the later one wins. Overlaps are normal (the stub always lands on top of whatever
//! the first segment has at address zero and the GOT usually sits inside a data
//! segment with identical bytes) but a write that changes bytes an earlier write put
//! down is suspicious, see Overlap.
use super::{FlatImage, GotSection, PAGE_SIZE, Segment};
use crate::errors::ConvertError;
use crate::utils;
use rangemap::RangeMap;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteKind {
    /// Index into the load segments.
    Segment(usize),
    Stub,
    Got,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteKind::Segment(i) => write!(f, "segment {i}"),
            WriteKind::Stub => write!(f, "stub"),
            WriteKind::Got => write!(f, ".got"),
        }
    }
}

pub struct Write<'a> {
    pub kind: WriteKind,
    pub dest: u64,
    pub bytes: Cow<'a, [u8]>,
}

impl Write<'_> {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// None if the write runs off the end of the address space.
    pub fn range(&self) -> Option<Range<u64>> {
        self.dest.checked_add(self.len()).map(|end| self.dest..end)
    }
}

/// Two writes that touch the same bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Overlap {
    pub earlier: WriteKind,
    pub later: WriteKind,
    pub range: Range<u64>,

    /// The later write changes at least one of the bytes in range.
    pub conflicting: bool,
}

impl Overlap {
    /// The stub is supposed to replace whatever a segment has at address zero.
    pub fn expected(&self) -> bool {
        self.later == WriteKind::Stub && matches!(self.earlier, WriteKind::Segment(_))
    }
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} overwrites {} at {:#x}..{:#x}",
            self.later, self.earlier, self.range.start, self.range.end
        )
    }
}

pub struct WritePlan<'a> {
    /// Highest address covered by a segment or the GOT.
    pub end_addr: u64,

    /// end_addr rounded up to a page.
    pub size: u64,

    /// In the order they are applied.
    pub writes: Vec<Write<'a>>,
}

impl<'a> WritePlan<'a> {
    pub fn new(
        segments: &[Segment<'a>],
        got: Option<&GotSection<'a>>,
        stub: Vec<u8>,
    ) -> Result<Self, ConvertError> {
        let end_addr = end_address(segments, got)?;
        let size = utils::align_up(end_addr, PAGE_SIZE).ok_or_else(|| {
            ConvertError::malformed(format!("end address {end_addr:#x} can't be page aligned"))
        })?;

        let mut writes: Vec<Write<'a>> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| Write {
                kind: WriteKind::Segment(i),
                dest: segment.vaddr,
                bytes: Cow::Borrowed(segment.bytes),
            })
            .collect();
        writes.push(Write {
            kind: WriteKind::Stub,
            dest: 0,
            bytes: Cow::Owned(stub),
        });
        if let Some(got) = got {
            writes.push(Write {
                kind: WriteKind::Got,
                dest: got.addr,
                bytes: Cow::Borrowed(got.bytes),
            });
        }

        Ok(WritePlan {
            end_addr,
            size,
            writes,
        })
    }

    /// Every place where a write lands on bytes put down by an earlier write, in
    /// write order. When several earlier writes are involved only the one whose bytes
    /// are actually replaced is reported.
    pub fn overlaps(&self) -> Vec<Overlap> {
        let mut result = Vec::new();
        let mut owners: RangeMap<u64, usize> = RangeMap::new();
        for (i, write) in self.writes.iter().enumerate() {
            let Some(range) = write.range() else {
                continue; // apply will complain about this one
            };
            if range.is_empty() {
                continue;
            }

            for (owned, &j) in owners.overlapping(&range) {
                let earlier = &self.writes[j];
                let start = owned.start.max(range.start);
                let end = owned.end.min(range.end);
                let old = slice_at(earlier, start..end);
                let new = slice_at(write, start..end);
                result.push(Overlap {
                    earlier: earlier.kind,
                    later: write.kind,
                    range: start..end,
                    conflicting: old != new,
                });
            }
            owners.insert(range, i);
        }
        result
    }

    /// Allocates the zero filled image and performs each write.
    pub fn apply(&self) -> Result<FlatImage, ConvertError> {
        let size = usize::try_from(self.size).map_err(|_| ConvertError::ImageTooLarge {
            size: self.size,
            max: usize::MAX as u64,
        })?;

        let mut buffer = vec![0u8; size];
        for write in self.writes.iter() {
            match write.range() {
                Some(range) if range.end <= self.size => {
                    buffer[range.start as usize..range.end as usize].copy_from_slice(&write.bytes)
                }
                _ => {
                    return Err(ConvertError::OversizedAddress {
                        dest: write.dest,
                        len: write.len(),
                        size: self.size,
                    });
                }
            }
        }
        Ok(FlatImage::new(buffer))
    }
}

// range must be within the write.
fn slice_at<'b>(write: &'b Write, range: Range<u64>) -> &'b [u8] {
    let start = (range.start - write.dest) as usize;
    let end = (range.end - write.dest) as usize;
    &write.bytes[start..end]
}

/// The highest address used by a segment (including any zero filled tail) or the GOT.
/// Note that the stub doesn't count.
pub fn end_address(segments: &[Segment], got: Option<&GotSection>) -> Result<u64, ConvertError> {
    let extents = segments
        .iter()
        .map(|s| (s.vaddr, s.mem_size))
        .chain(got.map(|g| (g.addr, g.size)));

    let mut end_addr = 0;
    for (start, size) in extents {
        let end = start.checked_add(size).ok_or_else(|| {
            ConvertError::malformed(format!(
                "{size:#x} bytes at {start:#x} run past the end of memory"
            ))
        })?;
        end_addr = end_addr.max(end);
    }
    Ok(end_addr)
}
