//! Key-to-slot computation.
//!
//! Slot values are a network-visible contract shared with the server cluster:
//! the hash must be bit-for-bit CRC16-CCITT (XModem, polynomial 0x1021) or
//! keys get silently misrouted. Everything here is pure and stateless.

/// Total number of slots in Redis Cluster (16384)
pub const SLOT_COUNT: u16 = 16384;

/// Compute the CRC16-CCITT (XModem) checksum of `data`.
///
/// Init 0x0000, polynomial 0x1021, no reflection, no final xor. The check
/// value for `"123456789"` is `0x31C3`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Extract the portion of `key` that participates in slot hashing.
///
/// If the key contains a non-empty hash tag (`{...}` between the first `{`
/// and the next `}` after it), only the tag is hashed, so callers can force
/// related keys into one slot. Otherwise the whole key is hashed. An empty
/// tag (`{}`) falls back to the whole key: collapsing every such key into
/// the slot of the empty string would be a silent routing hazard.
pub fn hash_input(key: &[u8]) -> &[u8] {
    let Some(open) = key.iter().position(|&b| b == b'{') else {
        return key;
    };
    let Some(close) = key[open + 1..].iter().position(|&b| b == b'}') else {
        return key;
    };
    if close == 0 {
        // "{}" with nothing between the braces
        return key;
    }
    &key[open + 1..open + 1 + close]
}

/// Compute the slot owning `key`, in `[0, 16384)`.
pub fn key_to_slot(key: &[u8]) -> u16 {
    crc16(hash_input(key)) % SLOT_COUNT
}
