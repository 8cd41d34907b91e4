//! Binary-coded decimal
//!
//! One decimal digit per nibble. Register values with a nibble above 9
//! are outside what the clock produces; they decode arithmetically and
//! are not rejected.

/// Decode a BCD byte: high nibble * 10 + low nibble
pub const fn decode(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Encode 0..=99 as BCD; larger values wrap modulo 100
pub const fn encode(value: u8) -> u8 {
    let value = value % 100;
    ((value / 10) << 4) | (value % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(decode(0x00), 0);
        assert_eq!(decode(0x59), 59);
        assert_eq!(decode(0x99), 99);
    }

    #[test]
    fn test_decode_out_of_range_nibble() {
        // 0x0A: 0 * 10 + 10
        assert_eq!(decode(0x0A), 10);
        assert_eq!(decode(0xFF), 165);
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(0), 0x00);
        assert_eq!(encode(59), 0x59);
        assert_eq!(encode(123), 0x23);
    }
}
