//! SHA-1 compression per FIPS 180-1.

use crate::bits;

const INIT: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

fn ft(t: usize, b: u32, c: u32, d: u32) -> u32 {
    match t {
        0..=19 => (b & c) | (!b & d),
        20..=39 => b ^ c ^ d,
        40..=59 => (b & c) | (b & d) | (c & d),
        _ => b ^ c ^ d,
    }
}

fn kt(t: usize) -> u32 {
    match t {
        0..=19 => 0x5a827999,
        20..=39 => 0x6ed9eba1,
        40..=59 => 0x8f1bbcdc,
        _ => 0xca62c1d6,
    }
}

pub(crate) fn core(mut words: Vec<u32>, claimed_bits: u64) -> Vec<u32> {
    bits::pad_be(&mut words, claimed_bits);

    let mut state = INIT;
    for block in words.chunks_exact(16) {
        let mut w = [0u32; 80];
        w[..16].copy_from_slice(block);
        for t in 16..80 {
            w[t] = (w[t - 3] ^ w[t - 8] ^ w[t - 14] ^ w[t - 16]).rotate_left(1);
        }

        let [mut a, mut b, mut c, mut d, mut e] = state;
        for t in 0..80 {
            let tmp = a
                .rotate_left(5)
                .wrapping_add(ft(t, b, c, d))
                .wrapping_add(e)
                .wrapping_add(w[t])
                .wrapping_add(kt(t));
            (a, b, c, d, e) = (tmp, a, b.rotate_left(30), c, d);
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
        state[4] = state[4].wrapping_add(e);
    }
    state.to_vec()
}

#[cfg(test)]
mod tests {
    use crate::bits::to_hex;
    use crate::hash::HashKind;

    #[test]
    fn test_sha1_fips_vectors() {
        let cases = [
            ("", "da39a3ee5e6b4b0d3255bfef95601890afd80709"),
            ("abc", "a9993e364706816aba3e25717850c26c9cd0d89d"),
            (
                "abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
                "84983e441c3bd26ebaae4aa1f95129e5e54670f1",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(to_hex(&HashKind::Sha1.digest(input.as_bytes())), expected);
        }
    }

    #[test]
    fn test_sha1_matches_rustcrypto_across_block_sizes() {
        use sha1::{Digest, Sha1};
        for len in [0, 1, 55, 56, 63, 64, 65, 128, 1000] {
            let input: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
            let reference = Sha1::digest(&input);
            assert_eq!(
                crate::hash::HashKind::Sha1.digest(&input),
                reference.as_slice(),
                "length {}",
                len
            );
        }
    }
}
