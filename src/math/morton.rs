//! Morton encoding (Z-order curve) for packed block keys
//!
//! Signed world coordinates are mapped onto `u32` by flipping the sign bit,
//! which keeps their order, then interleaved in two 21/11-bit halves so the
//! whole `i32` range of every axis has a key.

const MASK_21: u32 = 0x1f_ffff;
const SIGN_BIT: u32 = 0x8000_0000;
/// Bit offset of the high-half interleave inside a signed key
const HIGH_SHIFT: u32 = 63;
const LOW_MASK: u128 = (1 << HIGH_SHIFT) - 1;

/// Spread bits of a 21-bit integer into every third bit of a 64-bit integer
fn spread_bits(x: u32) -> u64 {
    let mut x = x as u64 & MASK_21 as u64;
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Compact every third bit of a 64-bit integer into a 21-bit integer
fn compact_bits(x: u64) -> u32 {
    let mut x = x & 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x | (x >> 4)) & 0x100f00f00f00f00f;
    x = (x | (x >> 8)) & 0x1f0000ff0000ff;
    x = (x | (x >> 16)) & 0x1f00000000ffff;
    x = (x | (x >> 32)) & MASK_21 as u64;
    x as u32
}

/// Encode unsigned 3D coordinates into a Morton code
/// Each coordinate can be up to 21 bits (0..2097151)
pub fn encode_morton_3d(x: u32, y: u32, z: u32) -> u64 {
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}

/// Decode Morton code back to unsigned 3D coordinates
pub fn decode_morton_3d(code: u64) -> (u32, u32, u32) {
    (
        compact_bits(code),
        compact_bits(code >> 1),
        compact_bits(code >> 2),
    )
}

/// Encode a signed world coordinate; every `i32` triple has a distinct key
pub fn encode_signed(x: i32, y: i32, z: i32) -> u128 {
    let (x, y, z) = (to_ordered(x), to_ordered(y), to_ordered(z));
    let low = encode_morton_3d(x & MASK_21, y & MASK_21, z & MASK_21);
    let high = encode_morton_3d(x >> 21, y >> 21, z >> 21);
    low as u128 | ((high as u128) << HIGH_SHIFT)
}

/// Inverse of [`encode_signed`]
pub fn decode_signed(code: u128) -> (i32, i32, i32) {
    let (lx, ly, lz) = decode_morton_3d((code & LOW_MASK) as u64);
    let (hx, hy, hz) = decode_morton_3d((code >> HIGH_SHIFT) as u64);
    (
        from_ordered(lx | (hx << 21)),
        from_ordered(ly | (hy << 21)),
        from_ordered(lz | (hz << 21)),
    )
}

fn to_ordered(v: i32) -> u32 {
    (v as u32) ^ SIGN_BIT
}

fn from_ordered(v: u32) -> i32 {
    (v ^ SIGN_BIT) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert_eq!(encode_morton_3d(0, 0, 0), 0);
        assert_eq!(encode_morton_3d(1, 0, 0), 1);
        assert_eq!(encode_morton_3d(0, 1, 0), 2);
        assert_eq!(encode_morton_3d(0, 0, 1), 4);
        assert_eq!(encode_morton_3d(1, 1, 1), 7);
    }

    #[test]
    fn test_signed_keys_distinct_for_neighbors() {
        let a = encode_signed(-1, 5, 0);
        let b = encode_signed(0, 5, 0);
        let c = encode_signed(0, 5, -1);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_signed_decode() {
        let cases = [
            (0, 0, 0),
            (-17, 63, 4),
            (1_000_000, 12, -1_000_000),
            (1_100_000, 10, 0),
            (i32::MIN, 0, i32::MAX),
            (-(1 << 21), 1 << 21, (1 << 21) - 1),
        ];
        for &(x, y, z) in &cases {
            assert_eq!(decode_signed(encode_signed(x, y, z)), (x, y, z));
        }
    }

    #[test]
    fn test_wide_coordinates_do_not_alias() {
        // Differ only in the high half of x
        assert_ne!(encode_signed(5, 0, 0), encode_signed(5 + (1 << 21), 0, 0));
        assert_ne!(encode_signed(i32::MAX, 0, 0), encode_signed(0, 0, i32::MAX));
    }
}
