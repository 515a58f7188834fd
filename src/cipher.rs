//! Rijndael (AES-256 over a 128-bit block) in ECB and CBC modes, bundled
//! for callers that want to encrypt saved settings. The derivation engine
//! never touches this module.
//!
//! Plaintext is zero-padded to whole blocks; decryption does not strip the
//! padding. CBC draws a random IV from the OS and transmits it as the
//! first ciphertext block.

use anyhow::{Result, bail};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const BLOCK_LEN: usize = 16;

const NK: usize = 8;
const NR: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ecb,
    Cbc,
}

#[rustfmt::skip]
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

#[rustfmt::skip]
const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

const RCON: [u8; 7] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40];

fn xtime(x: u8) -> u8 {
    (x << 1) ^ (((x >> 7) & 1) * 0x1b)
}

fn gmul(a: u8, b: u8) -> u8 {
    let mut product = 0;
    let mut a = a;
    let mut b = b;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    product
}

/// 15 round keys of 16 bytes each, column-major like the state.
fn expand_key(key: &[u8; KEY_LEN]) -> Zeroizing<[[u8; BLOCK_LEN]; NR + 1]> {
    let mut w = [[0u8; 4]; 4 * (NR + 1)];
    for (i, chunk) in key.chunks_exact(4).enumerate() {
        w[i].copy_from_slice(chunk);
    }
    for i in NK..w.len() {
        let mut temp = w[i - 1];
        if i % NK == 0 {
            temp.rotate_left(1);
            for byte in &mut temp {
                *byte = SBOX[*byte as usize];
            }
            temp[0] ^= RCON[i / NK - 1];
        } else if i % NK == 4 {
            for byte in &mut temp {
                *byte = SBOX[*byte as usize];
            }
        }
        for (out, prev) in temp.iter_mut().zip(w[i - NK]) {
            *out ^= prev;
        }
        w[i] = temp;
    }

    let mut round_keys = Zeroizing::new([[0u8; BLOCK_LEN]; NR + 1]);
    for (round, words) in w.chunks_exact(4).enumerate() {
        for (c, word) in words.iter().enumerate() {
            round_keys[round][c * 4..c * 4 + 4].copy_from_slice(word);
        }
    }
    round_keys
}

fn add_round_key(state: &mut [u8; BLOCK_LEN], round_key: &[u8; BLOCK_LEN]) {
    for (s, k) in state.iter_mut().zip(round_key) {
        *s ^= k;
    }
}

// Row r lives at byte positions r, r+4, r+8, r+12 of the column-major state.
fn shift_rows(state: &mut [u8; BLOCK_LEN]) {
    for r in 1..4 {
        let row = [state[r], state[r + 4], state[r + 8], state[r + 12]];
        for c in 0..4 {
            state[r + c * 4] = row[(c + r) % 4];
        }
    }
}

fn inv_shift_rows(state: &mut [u8; BLOCK_LEN]) {
    for r in 1..4 {
        let row = [state[r], state[r + 4], state[r + 8], state[r + 12]];
        for c in 0..4 {
            state[r + c * 4] = row[(c + 4 - r) % 4];
        }
    }
}

fn mix_columns(state: &mut [u8; BLOCK_LEN]) {
    for column in state.chunks_exact_mut(4) {
        let [a, b, c, d] = [column[0], column[1], column[2], column[3]];
        column[0] = xtime(a) ^ xtime(b) ^ b ^ c ^ d;
        column[1] = a ^ xtime(b) ^ xtime(c) ^ c ^ d;
        column[2] = a ^ b ^ xtime(c) ^ xtime(d) ^ d;
        column[3] = xtime(a) ^ a ^ b ^ c ^ xtime(d);
    }
}

fn inv_mix_columns(state: &mut [u8; BLOCK_LEN]) {
    for column in state.chunks_exact_mut(4) {
        let [a, b, c, d] = [column[0], column[1], column[2], column[3]];
        column[0] = gmul(a, 14) ^ gmul(b, 11) ^ gmul(c, 13) ^ gmul(d, 9);
        column[1] = gmul(a, 9) ^ gmul(b, 14) ^ gmul(c, 11) ^ gmul(d, 13);
        column[2] = gmul(a, 13) ^ gmul(b, 9) ^ gmul(c, 14) ^ gmul(d, 11);
        column[3] = gmul(a, 11) ^ gmul(b, 13) ^ gmul(c, 9) ^ gmul(d, 14);
    }
}

fn encrypt_block(state: &mut [u8; BLOCK_LEN], round_keys: &[[u8; BLOCK_LEN]; NR + 1]) {
    add_round_key(state, &round_keys[0]);
    for round in 1..NR {
        for byte in state.iter_mut() {
            *byte = SBOX[*byte as usize];
        }
        shift_rows(state);
        mix_columns(state);
        add_round_key(state, &round_keys[round]);
    }
    for byte in state.iter_mut() {
        *byte = SBOX[*byte as usize];
    }
    shift_rows(state);
    add_round_key(state, &round_keys[NR]);
}

fn decrypt_block(state: &mut [u8; BLOCK_LEN], round_keys: &[[u8; BLOCK_LEN]; NR + 1]) {
    add_round_key(state, &round_keys[NR]);
    for round in (1..NR).rev() {
        inv_shift_rows(state);
        for byte in state.iter_mut() {
            *byte = INV_SBOX[*byte as usize];
        }
        add_round_key(state, &round_keys[round]);
        inv_mix_columns(state);
    }
    inv_shift_rows(state);
    for byte in state.iter_mut() {
        *byte = INV_SBOX[*byte as usize];
    }
    add_round_key(state, &round_keys[0]);
}

fn check_key(key: &[u8]) -> Result<&[u8; KEY_LEN]> {
    key.try_into()
        .map_err(|_| anyhow::anyhow!("Cipher key must be {} bytes, got {}", KEY_LEN, key.len()))
}

/// Encrypt `plaintext` under a 32-byte key. The plaintext is zero-padded
/// to whole blocks. In CBC mode the ciphertext is one block longer than
/// the padded plaintext; that leading block is the IV.
pub fn encrypt(plaintext: &[u8], key: &[u8], mode: Mode) -> Result<Vec<u8>> {
    let round_keys = expand_key(check_key(key)?);

    let mut padded = Zeroizing::new(plaintext.to_vec());
    padded.resize(plaintext.len().div_ceil(BLOCK_LEN) * BLOCK_LEN, 0);

    match mode {
        Mode::Ecb => {
            let mut out = padded.to_vec();
            for block in out.chunks_exact_mut(BLOCK_LEN) {
                encrypt_block(block.try_into().expect("exact chunk"), &round_keys);
            }
            Ok(out)
        }
        Mode::Cbc => {
            let mut iv = [0u8; BLOCK_LEN];
            OsRng.fill_bytes(&mut iv);

            let mut out = Vec::with_capacity(BLOCK_LEN + padded.len());
            out.extend_from_slice(&iv);
            let mut previous = iv;
            for block in padded.chunks_exact(BLOCK_LEN) {
                let mut state: [u8; BLOCK_LEN] = block.try_into().expect("exact chunk");
                for (s, p) in state.iter_mut().zip(previous) {
                    *s ^= p;
                }
                encrypt_block(&mut state, &round_keys);
                out.extend_from_slice(&state);
                previous = state;
            }
            Ok(out)
        }
    }
}

/// Decrypt `ciphertext` under a 32-byte key. Zero padding added at
/// encryption time is not stripped. In CBC mode the first block is
/// consumed as the IV.
pub fn decrypt(ciphertext: &[u8], key: &[u8], mode: Mode) -> Result<Vec<u8>> {
    let round_keys = expand_key(check_key(key)?);

    if !ciphertext.len().is_multiple_of(BLOCK_LEN) {
        bail!(
            "Ciphertext length {} is not a multiple of the {}-byte block",
            ciphertext.len(),
            BLOCK_LEN
        );
    }

    match mode {
        Mode::Ecb => {
            let mut out = ciphertext.to_vec();
            for block in out.chunks_exact_mut(BLOCK_LEN) {
                decrypt_block(block.try_into().expect("exact chunk"), &round_keys);
            }
            Ok(out)
        }
        Mode::Cbc => {
            if ciphertext.is_empty() {
                bail!("CBC ciphertext is missing its IV block");
            }
            let (iv, body) = ciphertext.split_at(BLOCK_LEN);
            let mut out = Vec::with_capacity(body.len());
            let mut previous: [u8; BLOCK_LEN] = iv.try_into().expect("exact block");
            for block in body.chunks_exact(BLOCK_LEN) {
                let mut state: [u8; BLOCK_LEN] = block.try_into().expect("exact chunk");
                decrypt_block(&mut state, &round_keys);
                for (s, p) in state.iter_mut().zip(previous) {
                    *s ^= p;
                }
                out.extend_from_slice(&state);
                previous = block.try_into().expect("exact chunk");
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::from_hex;

    #[test]
    fn test_fips_197_aes256_block() {
        let key = from_hex("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f")
            .unwrap();
        let plaintext = from_hex("00112233445566778899aabbccddeeff").unwrap();
        let ciphertext = encrypt(&plaintext, &key, Mode::Ecb).unwrap();
        assert_eq!(
            ciphertext,
            from_hex("8ea2b7ca516745bfeafc49904b496089").unwrap()
        );
        assert_eq!(decrypt(&ciphertext, &key, Mode::Ecb).unwrap(), plaintext);
    }

    #[test]
    fn test_ecb_zero_pads_to_whole_blocks() {
        let key = [7u8; KEY_LEN];
        let ciphertext = encrypt(b"short", &key, Mode::Ecb).unwrap();
        assert_eq!(ciphertext.len(), BLOCK_LEN);
        let mut padded = b"short".to_vec();
        padded.resize(BLOCK_LEN, 0);
        assert_eq!(decrypt(&ciphertext, &key, Mode::Ecb).unwrap(), padded);
    }

    #[test]
    fn test_cbc_round_trip_with_fresh_iv() {
        let key = [42u8; KEY_LEN];
        let plaintext = b"settings blob spanning more than a single cipher block";
        let a = encrypt(plaintext, &key, Mode::Cbc).unwrap();
        let b = encrypt(plaintext, &key, Mode::Cbc).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), BLOCK_LEN + plaintext.len().div_ceil(BLOCK_LEN) * BLOCK_LEN);

        let recovered = decrypt(&a, &key, Mode::Cbc).unwrap();
        assert_eq!(&recovered[..plaintext.len()], plaintext);
        assert!(recovered[plaintext.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rejects_bad_key_and_ciphertext_sizes() {
        assert!(encrypt(b"data", &[0u8; 16], Mode::Ecb).is_err());
        assert!(decrypt(&[0u8; 15], &[0u8; KEY_LEN], Mode::Ecb).is_err());
        assert!(decrypt(&[], &[0u8; KEY_LEN], Mode::Cbc).is_err());
    }

    #[test]
    fn test_empty_plaintext() {
        let key = [1u8; KEY_LEN];
        assert!(encrypt(&[], &key, Mode::Ecb).unwrap().is_empty());
        // CBC of nothing still carries its IV block.
        let ct = encrypt(&[], &key, Mode::Cbc).unwrap();
        assert_eq!(ct.len(), BLOCK_LEN);
        assert!(decrypt(&ct, &key, Mode::Cbc).unwrap().is_empty());
    }
}
