mod md4;
mod md5;
mod ripemd160;
mod sha1;
mod sha256;

use crate::bits;
use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

/// HMAC block size shared by every member of the family.
const BLOCK_BYTES: usize = 64;

/// The five digest cores. Each works on 32-bit words in its native byte
/// order and is driven by a claimed bit length, so keyed variants can feed
/// it word arrays that do not correspond to any byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Md4,
    Md5,
    Sha1,
    Sha256,
    Ripemd160,
}

impl HashKind {
    pub fn digest_bytes(self) -> usize {
        match self {
            HashKind::Md4 | HashKind::Md5 => 16,
            HashKind::Sha1 | HashKind::Ripemd160 => 20,
            HashKind::Sha256 => 32,
        }
    }

    fn big_endian(self) -> bool {
        matches!(self, HashKind::Sha1 | HashKind::Sha256)
    }

    fn pack(self, bytes: &[u8]) -> Vec<u32> {
        if self.big_endian() {
            bits::bytes_to_words_be(bytes)
        } else {
            bits::bytes_to_words_le(bytes)
        }
    }

    fn unpack(self, words: &[u32]) -> Vec<u8> {
        if self.big_endian() {
            bits::words_to_bytes_be(words)
        } else {
            bits::words_to_bytes_le(words)
        }
    }

    fn core(self, words: Vec<u32>, claimed_bits: u64) -> Vec<u32> {
        match self {
            HashKind::Md4 => md4::core(words, claimed_bits),
            HashKind::Md5 => md5::core(words, claimed_bits),
            HashKind::Sha1 => sha1::core(words, claimed_bits),
            HashKind::Sha256 => sha256::core(words, claimed_bits),
            HashKind::Ripemd160 => ripemd160::core(words, claimed_bits),
        }
    }

    /// Plain digest of a byte string.
    pub fn digest(self, msg: &[u8]) -> Vec<u8> {
        let words = self.pack(msg);
        let state = self.core(words, msg.len() as u64 * 8);
        self.unpack(&state)
    }

    /// Standard HMAC: block size 64, over-long keys replaced by their own
    /// digest, 0x36/0x5c pads.
    pub fn hmac(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        self.hmac_claiming(key, data, self.digest_bytes() as u64 * 8)
    }

    /// HMAC whose outer compression is told the inner hash is
    /// `inner_claim_bits` long. With the true digest width this is textbook
    /// HMAC; `hmac-sha256-legacy` passes 160 to reproduce the historically
    /// shipped output.
    pub(crate) fn hmac_claiming(self, key: &[u8], data: &[u8], inner_claim_bits: u64) -> Vec<u8> {
        let folded;
        let key = if key.len() > BLOCK_BYTES {
            folded = self.digest(key);
            &folded[..]
        } else {
            key
        };

        let mut block = [0u8; BLOCK_BYTES];
        block[..key.len()].copy_from_slice(key);
        let ipad: Vec<u8> = block.iter().map(|b| b ^ 0x36).collect();
        let opad: Vec<u8> = block.iter().map(|b| b ^ 0x5c).collect();

        let mut inner = self.pack(&ipad);
        inner.extend(self.pack(data));
        let inner_state = self.core(inner, 512 + data.len() as u64 * 8);

        // The inner state words are appended as words, not bytes; the outer
        // padding is then placed by the claimed width.
        let mut outer = self.pack(&opad);
        outer.extend(inner_state);
        let outer_state = self.core(outer, 512 + inner_claim_bits);
        self.unpack(&outer_state)
    }
}

/// The selectable algorithm tags, exactly the set deployed passwords were
/// generated with. Dispatch is exhaustive; an unknown tag can only exist as
/// a string, and only until [`Algorithm::from_str`] rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha256,
    HmacSha256,
    /// `hmac-sha256` with the outer hash told the inner digest is 160 bits
    /// wide. Wrong, shipped, and kept selectable for old passwords.
    HmacSha256Legacy,
    Sha1,
    HmacSha1,
    Md4,
    HmacMd4,
    Md5,
    /// Alias of [`Algorithm::Md5`]; an old release carried a second,
    /// bit-identical MD5 implementation under this tag.
    Md5Legacy,
    HmacMd5,
    /// Alias of [`Algorithm::HmacMd5`].
    HmacMd5Legacy,
    Rmd160,
    HmacRmd160,
}

pub const ALGORITHMS: [Algorithm; 13] = [
    Algorithm::Sha256,
    Algorithm::HmacSha256,
    Algorithm::HmacSha256Legacy,
    Algorithm::Sha1,
    Algorithm::HmacSha1,
    Algorithm::Md4,
    Algorithm::HmacMd4,
    Algorithm::Md5,
    Algorithm::Md5Legacy,
    Algorithm::HmacMd5,
    Algorithm::HmacMd5Legacy,
    Algorithm::Rmd160,
    Algorithm::HmacRmd160,
];

impl Algorithm {
    pub fn kind(self) -> HashKind {
        match self {
            Algorithm::Sha256 | Algorithm::HmacSha256 | Algorithm::HmacSha256Legacy => {
                HashKind::Sha256
            }
            Algorithm::Sha1 | Algorithm::HmacSha1 => HashKind::Sha1,
            Algorithm::Md4 | Algorithm::HmacMd4 => HashKind::Md4,
            Algorithm::Md5 | Algorithm::Md5Legacy | Algorithm::HmacMd5 | Algorithm::HmacMd5Legacy => {
                HashKind::Md5
            }
            Algorithm::Rmd160 | Algorithm::HmacRmd160 => HashKind::Ripemd160,
        }
    }

    pub fn is_hmac(self) -> bool {
        matches!(
            self,
            Algorithm::HmacSha256
                | Algorithm::HmacSha256Legacy
                | Algorithm::HmacSha1
                | Algorithm::HmacMd4
                | Algorithm::HmacMd5
                | Algorithm::HmacMd5Legacy
                | Algorithm::HmacRmd160
        )
    }

    /// Digest the derivation material: keyed variants run HMAC over
    /// (key, data), unkeyed ones digest the already-folded key.
    pub fn hash(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        let kind = self.kind();
        match self {
            Algorithm::HmacSha256Legacy => kind.hmac_claiming(key, data, 160),
            _ if self.is_hmac() => kind.hmac(key, data),
            _ => kind.digest(key),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::HmacSha256 => "hmac-sha256",
            Algorithm::HmacSha256Legacy => "hmac-sha256-legacy",
            Algorithm::Sha1 => "sha1",
            Algorithm::HmacSha1 => "hmac-sha1",
            Algorithm::Md4 => "md4",
            Algorithm::HmacMd4 => "hmac-md4",
            Algorithm::Md5 => "md5",
            Algorithm::Md5Legacy => "md5-legacy",
            Algorithm::HmacMd5 => "hmac-md5",
            Algorithm::HmacMd5Legacy => "hmac-md5-legacy",
            Algorithm::Rmd160 => "rmd160",
            Algorithm::HmacRmd160 => "hmac-rmd160",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        for algorithm in ALGORITHMS {
            if algorithm.name() == s {
                return Ok(algorithm);
            }
        }
        bail!("Unknown algorithm {:?}", s);
    }
}
