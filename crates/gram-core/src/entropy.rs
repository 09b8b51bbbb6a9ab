//! Uniform sampling over big-integer ranges, and the fractional-bit
//! threshold arithmetic used when targeting an entropy level.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use rand::RngCore;

/// Draw a uniform sample in `[0, range)` by rejection.
///
/// Takes `ceil(bits/8)` bytes from the source, masks the leading byte down
/// to `bits mod 8` bits, interprets the buffer big-endian and retries while
/// the value is not below `range`. Every accepted value is exactly
/// uniform; the expected number of draws is below 2.
///
/// # Panics
///
/// Panics if `range` is zero.
pub fn sample_below<R: RngCore>(rng: &mut R, range: &BigUint) -> BigUint {
    assert!(!range.is_zero(), "empty sample range");
    let bits = range.bits();
    let nbytes = ((bits + 7) / 8) as usize;
    let mut buf = vec![0u8; nbytes];
    loop {
        rng.fill_bytes(&mut buf);
        let spare = (8 - (bits % 8) as u32) % 8;
        buf[0] >>= spare;
        let out = BigUint::from_bytes_be(&buf);
        if out < *range {
            return out;
        }
    }
}

/// Smallest integer ≥ `2^bits` for a (possibly fractional, possibly large)
/// exponent. Used to turn an entropy target into a count threshold.
pub fn pow2_big(bits: f64) -> BigUint {
    if bits <= 0.0 {
        return BigUint::one();
    }
    let floor = bits.floor();
    let frac = bits - floor;
    let floor = floor as u64;
    // 53-bit mantissa of 2^frac, then shift into place with ceiling.
    let mant = (frac.exp2() * (1u64 << 52) as f64).ceil() as u64;
    if floor >= 52 {
        BigUint::from(mant) << (floor - 52)
    } else {
        let down = 52 - floor;
        let mask = (1u64 << down) - 1;
        let mut shifted = mant >> down;
        if mant & mask != 0 {
            shifted += 1;
        }
        BigUint::from(shifted)
    }
}

/// Approximate log2 of a positive big integer, for reporting.
pub fn log2_big(n: &BigUint) -> f64 {
    let bits = n.bits();
    if bits == 0 {
        return f64::NEG_INFINITY;
    }
    if bits <= 53 {
        let v = n.to_u64().unwrap_or(u64::MAX) as f64;
        return v.log2();
    }
    let top = (n >> (bits - 53)).to_u64().unwrap_or(u64::MAX) as f64;
    top.log2() + (bits - 53) as f64
}
