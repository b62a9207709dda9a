//! Small formatting helpers.

use core::fmt;

/// Render a byte buffer as hex, truncated after 16 bytes so heap dumps stay
/// readable in debug output.
pub(crate) fn fmt_truncated_hex(data: &Vec<u8>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    const SHOWN: usize = 16;

    write!(f, "0x")?;
    for byte in data.iter().take(SHOWN) {
        write!(f, "{byte:02x}")?;
    }
    if data.len() > SHOWN {
        write!(f, "...{} bytes total", data.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dump(Vec<u8>);

    impl fmt::Debug for Dump {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt_truncated_hex(&self.0, f)
        }
    }

    #[test]
    fn short_buffers_print_in_full() {
        assert_eq!(format!("{:?}", Dump(vec![0xab, 0x01])), "0xab01");
    }

    #[test]
    fn long_buffers_truncate() {
        let s = format!("{:?}", Dump(vec![0u8; 40]));
        assert!(s.ends_with("...40 bytes total"));
    }
}
