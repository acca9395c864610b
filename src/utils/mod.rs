pub mod styles;

pub use styles::*;

use std::error::Error;

pub fn require(predicate: bool, err: &str) -> Result<(), Box<dyn Error>> {
    if predicate { Ok(()) } else { Err(err.into()) }
}

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// Round n up to the next multiple of align, which must be a power of two. None on
/// overflow.
pub fn align_up(n: u64, align: u64) -> Option<u64> {
    debug_assert!(align.is_power_of_two());
    n.checked_add(align - 1).map(|n| n & !(align - 1))
}

/// Parse a decimal or 0x prefixed hex number, e.g. for sizes on the command line.
pub fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.replace('_', "");
    let result = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse::<u64>()
    };
    result.map_err(|e| format!("bad number '{s}': {e}"))
}

/// writeln! for diagnostic output. Diagnostics are best effort so errors (e.g. a
/// closed stdout) are dropped.
macro_rules! uwriteln {
    ($out:expr) => {
        let _ = writeln!($out);
    };
    ($out:expr, $($arg:tt)*) => {
        let _ = writeln!($out, $($arg)*);
    };
}
pub(crate) use uwriteln;

/// Remove escape sequences from the string (e.g. for colors).
#[cfg(test)]
pub fn strip_escapes(s: &str) -> String {
    // The tabled crate adds escape sequences to reset modes even when a style is
    // empty so it's simpler to strip everything than to disable styling in tests.
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    // Note that escape sequences can be fairly gnarly, e.g. for RGB colors.
    // See https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797
    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_to_pages() {
        assert_eq!(align_up(0, 0x1000), Some(0));
        assert_eq!(align_up(1, 0x1000), Some(0x1000));
        assert_eq!(align_up(0x1000, 0x1000), Some(0x1000));
        assert_eq!(align_up(0x1020, 0x1000), Some(0x2000));
        assert_eq!(align_up(u64::MAX, 0x1000), None);
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(parse_number("4096"), Ok(4096));
        assert_eq!(parse_number("0x1000"), Ok(0x1000));
        assert_eq!(parse_number("0x100_0000"), Ok(16 * 1024 * 1024));
        assert!(parse_number("sixteen").is_err());
        assert!(parse_number("0xg").is_err());
    }

    #[test]
    fn strips_escapes() {
        assert_eq!(strip_escapes("\x1b[1;31mentry\x1b[0m: 0x400"), "entry: 0x400");
    }
}
