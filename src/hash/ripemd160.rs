//! RIPEMD-160 compression: two parallel 80-round lines with distinct
//! selection functions, constants and permutation/rotation tables, folded
//! into the chain state after each block.

use crate::bits;

const INIT: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

const K1: [u32; 5] = [0x00000000, 0x5a827999, 0x6ed9eba1, 0x8f1bbcdc, 0xa953fd4e];
const K2: [u32; 5] = [0x50a28be6, 0x5c4dd124, 0x6d703ef3, 0x7a6d76e9, 0x00000000];

#[rustfmt::skip]
const R1: [usize; 80] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
    7, 4, 13, 1, 10, 6, 15, 3, 12, 0, 9, 5, 2, 14, 11, 8,
    3, 10, 14, 4, 9, 15, 8, 1, 2, 7, 0, 6, 13, 11, 5, 12,
    1, 9, 11, 10, 0, 8, 12, 4, 13, 3, 7, 15, 14, 5, 6, 2,
    4, 0, 5, 9, 7, 12, 2, 10, 14, 1, 3, 8, 11, 6, 15, 13,
];

#[rustfmt::skip]
const R2: [usize; 80] = [
    5, 14, 7, 0, 9, 2, 11, 4, 13, 6, 15, 8, 1, 10, 3, 12,
    6, 11, 3, 7, 0, 13, 5, 10, 14, 15, 8, 12, 4, 9, 1, 2,
    15, 5, 1, 3, 7, 14, 6, 9, 11, 8, 12, 2, 10, 0, 4, 13,
    8, 6, 4, 1, 3, 11, 15, 0, 5, 12, 2, 13, 9, 7, 10, 14,
    12, 15, 10, 4, 1, 5, 8, 7, 6, 2, 13, 14, 0, 3, 9, 11,
];

#[rustfmt::skip]
const S1: [u32; 80] = [
    11, 14, 15, 12, 5, 8, 7, 9, 11, 13, 14, 15, 6, 7, 9, 8,
    7, 6, 8, 13, 11, 9, 7, 15, 7, 12, 15, 9, 11, 7, 13, 12,
    11, 13, 6, 7, 14, 9, 13, 15, 14, 8, 13, 6, 5, 12, 7, 5,
    11, 12, 14, 15, 14, 15, 9, 8, 9, 14, 5, 6, 8, 6, 5, 12,
    9, 15, 5, 11, 6, 8, 13, 12, 5, 12, 13, 14, 11, 8, 5, 6,
];

#[rustfmt::skip]
const S2: [u32; 80] = [
    8, 9, 9, 11, 13, 15, 15, 5, 7, 7, 8, 11, 14, 14, 12, 6,
    9, 13, 15, 7, 12, 8, 9, 11, 7, 7, 12, 7, 6, 15, 13, 11,
    9, 7, 15, 11, 8, 6, 6, 14, 12, 13, 5, 14, 13, 13, 7, 5,
    15, 5, 8, 11, 14, 14, 6, 14, 6, 9, 12, 9, 12, 5, 15, 8,
    8, 5, 12, 9, 12, 5, 14, 6, 8, 13, 6, 5, 15, 13, 11, 11,
];

fn f(j: usize, x: u32, y: u32, z: u32) -> u32 {
    match j / 16 {
        0 => x ^ y ^ z,
        1 => (x & y) | (!x & z),
        2 => (x | !y) ^ z,
        3 => (x & z) | (y & !z),
        _ => x ^ (y | !z),
    }
}

pub(crate) fn core(mut words: Vec<u32>, claimed_bits: u64) -> Vec<u32> {
    bits::pad_le(&mut words, claimed_bits);

    let [mut h0, mut h1, mut h2, mut h3, mut h4] = INIT;
    for x in words.chunks_exact(16) {
        let (mut a1, mut b1, mut c1, mut d1, mut e1) = (h0, h1, h2, h3, h4);
        let (mut a2, mut b2, mut c2, mut d2, mut e2) = (h0, h1, h2, h3, h4);

        for j in 0..80 {
            let t = a1
                .wrapping_add(f(j, b1, c1, d1))
                .wrapping_add(x[R1[j]])
                .wrapping_add(K1[j / 16])
                .rotate_left(S1[j])
                .wrapping_add(e1);
            (a1, b1, c1, d1, e1) = (e1, t, b1, c1.rotate_left(10), d1);

            let t = a2
                .wrapping_add(f(79 - j, b2, c2, d2))
                .wrapping_add(x[R2[j]])
                .wrapping_add(K2[j / 16])
                .rotate_left(S2[j])
                .wrapping_add(e2);
            (a2, b2, c2, d2, e2) = (e2, t, b2, c2.rotate_left(10), d2);
        }

        let t = h1.wrapping_add(c1).wrapping_add(d2);
        h1 = h2.wrapping_add(d1).wrapping_add(e2);
        h2 = h3.wrapping_add(e1).wrapping_add(a2);
        h3 = h4.wrapping_add(a1).wrapping_add(b2);
        h4 = h0.wrapping_add(b1).wrapping_add(c2);
        h0 = t;
    }
    vec![h0, h1, h2, h3, h4]
}

#[cfg(test)]
mod tests {
    use crate::bits::to_hex;
    use crate::hash::HashKind;

    #[test]
    fn test_rmd160_reference_vectors() {
        let cases = [
            ("", "9c1185a5c5e9fc54612808977ee8f548b2258d31"),
            ("a", "0bdc9d2d256b3ee9daae347be6f4dc835a467ffe"),
            ("abc", "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"),
            ("message digest", "5d0689ef49d2fae572b881b123a85ffa21595f36"),
            (
                "abcdefghijklmnopqrstuvwxyz",
                "f71c27109c692c1b56bbdceb5b9d2865b3708dbc",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(to_hex(&HashKind::Ripemd160.digest(input.as_bytes())), expected);
        }
    }

    #[test]
    fn test_rmd160_matches_rustcrypto_across_block_sizes() {
        use ripemd::{Digest, Ripemd160};
        for len in [0, 1, 55, 56, 63, 64, 65, 128, 1000] {
            let input: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
            let reference = Ripemd160::digest(&input);
            assert_eq!(
                crate::hash::HashKind::Ripemd160.digest(&input),
                reference.as_slice(),
                "length {}",
                len
            );
        }
    }
}
