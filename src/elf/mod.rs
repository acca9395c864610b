//! Just enough ELF support to turn an executable into a flat image. Both 32 and 64-bit
//! files are supported in either byte order.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The architecture, e.g. MIPS.
//! * The entry point, i.e. the address of the first instruction to execute.
//! * The offset to and number of program headers.
//! * The offset to and number of section headers.
//!
//! Program headers identify segments. Segments are used by loaders to get an exe into
//! memory. Only Load segments matter here: each one has a virtual address, a size in
//! memory, and the bytes from the file to put there.
//!
//! Section headers identify sections. Sections are used for static linking and are
//! ignored except for the GOT which is located by name.
pub mod elf_file;
pub mod header;
pub mod io;
pub mod primitives;
pub mod sections;
pub mod segments;

#[cfg(test)]
pub mod test_elf;

pub use elf_file::*;
pub use header::*;
pub use io::*;
pub use primitives::*;
pub use sections::*;
pub use segments::*;
