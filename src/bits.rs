use anyhow::{Result, bail};

/// Encode text as UTF-8 by the standard range thresholds. Rust strings
/// cannot hold unpaired surrogates, so every scalar maps to 1-4 bytes and
/// the result matches `str::as_bytes` for all valid input.
pub fn utf8_bytes(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let x = ch as u32;
        if x <= 0x7f {
            out.push(x as u8);
        } else if x <= 0x7ff {
            out.push(0xc0 | (x >> 6) as u8);
            out.push(0x80 | (x & 0x3f) as u8);
        } else if x <= 0xffff {
            out.push(0xe0 | (x >> 12) as u8);
            out.push(0x80 | ((x >> 6) & 0x3f) as u8);
            out.push(0x80 | (x & 0x3f) as u8);
        } else {
            out.push(0xf0 | (x >> 18) as u8);
            out.push(0x80 | ((x >> 12) & 0x3f) as u8);
            out.push(0x80 | ((x >> 6) & 0x3f) as u8);
            out.push(0x80 | (x & 0x3f) as u8);
        }
    }
    out
}

/// Pack bytes into 32-bit words, byte 0 in the low byte (MD4/MD5/RIPEMD-160).
/// A trailing partial word is zero-filled.
pub fn bytes_to_words_le(bytes: &[u8]) -> Vec<u32> {
    let mut words = vec![0u32; bytes.len().div_ceil(4)];
    for (i, &b) in bytes.iter().enumerate() {
        words[i >> 2] |= u32::from(b) << ((i % 4) * 8);
    }
    words
}

/// Pack bytes into 32-bit words, byte 0 in the high byte (SHA-1/SHA-256).
pub fn bytes_to_words_be(bytes: &[u8]) -> Vec<u32> {
    let mut words = vec![0u32; bytes.len().div_ceil(4)];
    for (i, &b) in bytes.iter().enumerate() {
        words[i >> 2] |= u32::from(b) << (24 - (i % 4) * 8);
    }
    words
}

pub fn words_to_bytes_le(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

pub fn words_to_bytes_be(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Merkle-Damgård padding for the little-endian word layout, driven by a
/// *claimed* bit length. The 0x80 marker is OR-ed into whatever word sits at
/// the claimed end of the message and the low 32 bits of the length land at
/// word `((claimed+64)>>9<<4)+14`; the array is extended to whole 16-word
/// blocks but never truncated. A claim shorter than the actual data is legal
/// and leaves the surplus words inside the padded region, which is exactly
/// what the hmac-sha256-legacy variant relies on.
pub fn pad_le(words: &mut Vec<u32>, claimed_bits: u64) {
    let marker = (claimed_bits >> 5) as usize;
    let len_at = ((((claimed_bits + 64) >> 9) << 4) + 14) as usize;
    let total = len_at + 2;
    if words.len() < total {
        words.resize(total, 0);
    }
    words[marker] |= 0x80u32 << (claimed_bits % 32);
    words[len_at] = claimed_bits as u32;
}

/// Big-endian counterpart of [`pad_le`]: marker bit at `24 - claimed%32`,
/// length at word `((claimed+64)>>9<<4)+15`.
pub fn pad_be(words: &mut Vec<u32>, claimed_bits: u64) {
    let marker = (claimed_bits >> 5) as usize;
    let len_at = ((((claimed_bits + 64) >> 9) << 4) + 15) as usize;
    let total = len_at + 1;
    if words.len() < total {
        words.resize(total, 0);
    }
    words[marker] |= 0x80u32 << (24 - (claimed_bits % 32) as u32);
    words[len_at] = claimed_bits as u32;
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

pub fn from_hex(input: &str) -> Result<Vec<u8>> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.len() % 2 != 0 {
        bail!("Hex input must have even length, got {}", digits.len());
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.as_bytes().chunks_exact(2) {
        let s = std::str::from_utf8(pair)?;
        let b = u8::from_str_radix(s, 16)
            .map_err(|_| anyhow::anyhow!("Invalid hex digits: {:?}", s))?;
        bytes.push(b);
    }
    Ok(bytes)
}
