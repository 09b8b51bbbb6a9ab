use crate::varint::{read_uint, write_uint, VarintError};

fn encode(n: u64) -> Vec<u8> {
    let mut out = Vec::new();
    write_uint(&mut out, n);
    out
}

#[test]
fn single_byte_values() {
    assert_eq!(encode(0), vec![0x00]);
    assert_eq!(encode(1), vec![0x01]);
    assert_eq!(encode(127), vec![0x7f]);
}

#[test]
fn multi_byte_values_are_msb_first() {
    // 128 = 1<<7: high group 1, low group 0.
    assert_eq!(encode(128), vec![0x81, 0x00]);
    // 300 = 0b10_0101100: groups 0b10 then 0b0101100.
    assert_eq!(encode(300), vec![0x82, 0x2c]);
    // 16384 = 1<<14: three groups.
    assert_eq!(encode(16384), vec![0x81, 0x80, 0x00]);
}

#[test]
fn round_trip() {
    for n in [
        0u64,
        1,
        127,
        128,
        255,
        16383,
        16384,
        1 << 21,
        (1 << 35) + 12345,
        u64::MAX,
    ] {
        let bytes = encode(n);
        let (back, used) = read_uint(&bytes).unwrap();
        assert_eq!(back, n);
        assert_eq!(used, bytes.len());
    }
}

#[test]
fn read_leaves_trailing_bytes() {
    let mut bytes = encode(300);
    bytes.extend_from_slice(&[0xaa, 0xbb]);
    let (value, used) = read_uint(&bytes).unwrap();
    assert_eq!(value, 300);
    assert_eq!(used, 2);
}

#[test]
fn truncated_input_is_an_error() {
    assert_eq!(read_uint(&[]), Err(VarintError::Truncated));
    assert_eq!(read_uint(&[0x81]), Err(VarintError::Truncated));
}

#[test]
fn overlong_input_is_an_error() {
    // Eleven continuation groups exceed 64 payload bits.
    let bytes = [0xff; 11];
    assert_eq!(read_uint(&bytes), Err(VarintError::Overflow));
}
