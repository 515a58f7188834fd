//! MD4 compression per RFC 1320.

use crate::bits;

const INIT: [u32; 4] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476];

const R2: u32 = 0x5a827999;
const R3: u32 = 0x6ed9eba1;

// Message word order and shift amounts for rounds 2 and 3.
const G_ORDER: [usize; 16] = [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15];
const H_ORDER: [usize; 16] = [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];

fn op(f: u32, a: u32, x: u32, s: u32, t: u32) -> u32 {
    a.wrapping_add(f).wrapping_add(x).wrapping_add(t).rotate_left(s)
}

pub(crate) fn core(mut words: Vec<u32>, claimed_bits: u64) -> Vec<u32> {
    bits::pad_le(&mut words, claimed_bits);

    let mut state = INIT;
    for x in words.chunks_exact(16) {
        let [mut a, mut b, mut c, mut d] = state;

        for i in 0..16 {
            let s = [3, 7, 11, 19][i % 4];
            let f = (b & c) | (!b & d);
            let t = op(f, a, x[i], s, 0);
            (a, b, c, d) = (d, t, b, c);
        }
        for i in 0..16 {
            let s = [3, 5, 9, 13][i % 4];
            let f = (b & c) | (b & d) | (c & d);
            let t = op(f, a, x[G_ORDER[i]], s, R2);
            (a, b, c, d) = (d, t, b, c);
        }
        for i in 0..16 {
            let s = [3, 9, 11, 15][i % 4];
            let f = b ^ c ^ d;
            let t = op(f, a, x[H_ORDER[i]], s, R3);
            (a, b, c, d) = (d, t, b, c);
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
    }
    state.to_vec()
}
