//! What elf2flat does once the command line has been parsed.
pub mod convert;
pub mod tables;

pub use convert::*;
