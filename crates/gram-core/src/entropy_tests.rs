use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::entropy::{log2_big, pow2_big, sample_below};

#[test]
fn sample_below_one_is_zero() {
    let mut rng = StdRng::seed_from_u64(1);
    let r = sample_below(&mut rng, &BigUint::one());
    assert_eq!(r, BigUint::from(0u32));
}

#[test]
fn samples_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(2);
    let range = BigUint::from(6u32);
    for _ in 0..1000 {
        assert!(sample_below(&mut rng, &range) < range);
    }
}

#[test]
fn samples_are_roughly_uniform() {
    let mut rng = StdRng::seed_from_u64(3);
    let range = BigUint::from(3u32);
    let n = 60_000usize;
    let mut buckets = [0usize; 3];
    for _ in 0..n {
        let s = sample_below(&mut rng, &range);
        let idx = s.to_u32().expect("sample fits in u32");
        buckets[idx as usize] += 1;
    }
    for &b in &buckets {
        // Expected 20_000 per bucket; allow 5%.
        assert!((19_000..=21_000).contains(&b), "bucket count {b}");
    }
}

#[test]
fn large_ranges_sample() {
    let mut rng = StdRng::seed_from_u64(4);
    let range = BigUint::from(1u8) << 200;
    let s = sample_below(&mut rng, &range);
    assert!(s < range);
}

#[test]
fn pow2_integral_exponents_are_exact() {
    assert_eq!(pow2_big(0.0), BigUint::one());
    assert_eq!(pow2_big(1.0), BigUint::from(2u32));
    assert_eq!(pow2_big(10.0), BigUint::from(1024u32));
    assert_eq!(pow2_big(64.0), BigUint::from(1u8) << 64);
    assert_eq!(pow2_big(200.0), BigUint::from(1u8) << 200);
}

#[test]
fn pow2_fractional_exponents_round_up() {
    // 2^1.5 ≈ 2.828 → threshold 3.
    assert_eq!(pow2_big(1.5), BigUint::from(3u32));
    // 2^2.1 ≈ 4.287 → threshold 5.
    assert_eq!(pow2_big(2.1), BigUint::from(5u32));
}

#[test]
fn log2_matches_bit_length() {
    assert_eq!(log2_big(&BigUint::one()), 0.0);
    assert_eq!(log2_big(&BigUint::from(1024u32)), 10.0);
    let big = BigUint::from(1u8) << 100;
    assert!((log2_big(&big) - 100.0).abs() < 1e-9);
}
