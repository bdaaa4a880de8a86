//! CTA-2045 frame checksum
//!
//! Two running 8-bit sums modulo 255, seeded with `0xAA` and `0x00`. The
//! second sum accumulates the first after every byte, so the result depends
//! on byte order. The two check bytes are derived from the final sums and
//! packed high byte first.
//!
//! The same function validates received frames and stamps outgoing ones;
//! in both cases it runs over every byte that precedes the checksum field.

/// Seed of the first accumulator
pub const CHECKSUM_SEED: u8 = 0xAA;

const MODULUS: u16 = 255;

/// Compute the 16-bit checksum of `bytes`
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut c1 = CHECKSUM_SEED as u16;
    let mut c2 = 0u16;

    for &byte in bytes {
        c1 = (c1 + byte as u16) % MODULUS;
        c2 = (c2 + c1) % MODULUS;
    }

    let high = MODULUS - ((c1 + c2) % MODULUS);
    let low = MODULUS - ((c1 + high) % MODULUS);

    (high << 8) | low
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        // c1 = 0xAA, c2 = 0 -> high = 0x55, low = 0xFF
        assert_eq!(checksum(&[]), 0x55FF);
    }

    #[test]
    fn test_all_zero_four_bytes() {
        assert_eq!(checksum(&[0x00, 0x00, 0x00, 0x00]), 0xAAAA);
    }

    #[test]
    fn test_basic_app_ack_header() {
        // 08 01 | 00 02 | 03 00
        assert_eq!(checksum(&[0x08, 0x01, 0x00, 0x02, 0x03, 0x00]), 0x0641);
    }

    #[test]
    fn test_known_frames() {
        assert_eq!(checksum(&[0x08, 0x03, 0x00, 0x02, 0x18, 0x00]), 0xBA75);
        assert_eq!(checksum(&[0x08, 0x03, 0x00, 0x02, 0x19, 0x07]), 0xA97E);
        assert_eq!(checksum(&[0x08, 0x02, 0x00, 0x02, 0x02, 0x00]), 0x0344);
    }

    #[test]
    fn test_order_sensitive() {
        let forward = checksum(&[0x01, 0x02, 0x03]);
        let reversed = checksum(&[0x03, 0x02, 0x01]);
        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_deterministic() {
        let data = [0x08, 0x01, 0x00, 0x02, 0x11, 0x00];
        assert_eq!(checksum(&data), checksum(&data));
        assert_eq!(checksum(&data), 0xDB5D);
    }

    #[test]
    fn test_bytes_never_zero() {
        // Both check bytes are computed as 255 - x with x < 255
        for len in 0..64u8 {
            let data: [u8; 64] = core::array::from_fn(|i| (i as u8).wrapping_mul(len));
            let sum = checksum(&data[..len as usize]);
            assert_ne!(sum >> 8, 0);
            assert_ne!(sum & 0xFF, 0);
        }
    }
}
