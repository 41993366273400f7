//! CRC-24 checksum validation for Mode S messages

/// CRC-24 generator polynomial used in Mode S (0x1FFF409 without its x^24 term)
pub const GENERATOR: u32 = 0xFFF409;

const CRC_BITS: u32 = 24;
const CRC_MASK: u32 = (1 << CRC_BITS) - 1;
const TOP_BYTE_SHIFT: u32 = CRC_BITS - 8;

/// Shared calculator for the Mode S generator, built at compile time
pub static MODE_S_CRC: Crc24 = Crc24::new(GENERATOR);

/// Byte-at-a-time CRC-24 calculator
#[derive(Debug, Clone)]
pub struct Crc24 {
    generator: u32,
    table: [u32; 256],
}

impl Crc24 {
    /// Build the 256-entry table for the 24 low bits of `generator`
    pub const fn new(generator: u32) -> Self {
        let generator = generator & CRC_MASK;
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            table[i] = bitwise_byte(i as u8, generator);
            i += 1;
        }
        Self { generator, table }
    }

    /// Compute the CRC-24 of `bytes` using the table
    pub fn crc(&self, bytes: &[u8]) -> u32 {
        let mut crc = 0u32;
        for &b in bytes {
            crc = ((crc << 8) | b as u32) ^ self.table[self.top_byte(crc)];
            crc &= CRC_MASK;
        }
        // Flush the three register bytes
        for _ in 0..CRC_BITS / 8 {
            crc = (crc << 8) ^ self.table[self.top_byte(crc)];
            crc &= CRC_MASK;
        }
        crc
    }

    /// Reference bit-serial computation, one input bit at a time
    pub fn crc_bitwise(&self, bytes: &[u8]) -> u32 {
        let mut crc = 0u32;
        for &b in bytes {
            for i in (0..8).rev() {
                crc = bitwise_step(crc, (b as u32 >> i) & 1, self.generator);
            }
        }
        for _ in 0..CRC_BITS {
            crc = bitwise_step(crc, 0, self.generator);
        }
        crc
    }

    #[inline(always)]
    fn top_byte(&self, crc: u32) -> usize {
        ((crc >> TOP_BYTE_SHIFT) & 0xFF) as usize
    }
}

impl Default for Crc24 {
    fn default() -> Self {
        Self::new(GENERATOR)
    }
}

const fn bitwise_step(crc: u32, bit: u32, generator: u32) -> u32 {
    let feedback = if (crc >> (CRC_BITS - 1)) & 1 == 1 {
        generator
    } else {
        0
    };
    (((crc << 1) | bit) ^ feedback) & CRC_MASK
}

const fn bitwise_byte(byte: u8, generator: u32) -> u32 {
    let mut crc = 0u32;
    let mut i = 8;
    while i > 0 {
        i -= 1;
        crc = bitwise_step(crc, (byte as u32 >> i) & 1, generator);
    }
    let mut i = 0;
    while i < CRC_BITS {
        crc = bitwise_step(crc, 0, generator);
        i += 1;
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc24() {
        // Known-good DF17 identification frame
        let msg = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        assert_eq!(MODE_S_CRC.crc(&msg), 0); // Valid message should have CRC of 0
    }

    #[test]
    fn test_crc24_of_payload_is_parity_field() {
        let msg = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        assert_eq!(MODE_S_CRC.crc(&msg[..11]), 0x576098);
    }

    #[test]
    fn test_table_entries() {
        let crc = Crc24::new(GENERATOR);
        assert_eq!(crc.table[0], 0);
        assert_eq!(crc.table[1], GENERATOR);
        assert_eq!(crc.table[255], 0xFA0480);
    }

    #[test]
    fn test_table_matches_bitwise() {
        let crc = Crc24::default();
        let mut inputs: Vec<Vec<u8>> = vec![vec![], vec![0; 14], vec![0xFF; 14]];
        let frame = hex::decode("8D4D2228234994B7284820323B81").unwrap();
        for len in 1..=frame.len() {
            inputs.push(frame[..len].to_vec());
        }
        // Cheap deterministic pseudo-random bytes
        let mut state = 0x1234_5678u32;
        for len in 0..=20 {
            let bytes: Vec<u8> = (0..len)
                .map(|_| {
                    state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    (state >> 16) as u8
                })
                .collect();
            inputs.push(bytes);
        }
        for bytes in &inputs {
            assert_eq!(crc.crc(bytes), crc.crc_bitwise(bytes), "input {:02X?}", bytes);
        }
        assert_eq!(crc.crc(&[0xFF; 14]), 0xE48114);
    }

    #[test]
    fn test_single_bit_corruption_detected() {
        let msg = hex::decode("8D40621D58C382D690C8AC2863A7").unwrap();
        for bit in 0..112 {
            let mut corrupted = msg.clone();
            corrupted[bit / 8] ^= 0x80 >> (bit % 8);
            assert_ne!(MODE_S_CRC.crc(&corrupted), 0, "bit {} flip undetected", bit);
        }
    }
}
