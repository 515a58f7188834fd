//! Re-expresses a digest as digits over an arbitrary alphabet.
//!
//! The digest bytes are read as big-endian 16-bit words forming one large
//! non-negative integer, which is repeatedly long-divided by the alphabet
//! size; the remainders, last first, index the alphabet. Output length
//! therefore varies with the numeric magnitude of the digest; the
//! derivation engine loops over rounds to cover any requested length.

/// Encode `bytes` with the given alphabet. The caller guarantees at least
/// two symbols; a single-symbol radix would never terminate the division.
/// An all-zero digest encodes to the single first symbol.
pub fn encode(bytes: &[u8], alphabet: &[char]) -> String {
    debug_assert!(alphabet.len() >= 2);
    let divisor = alphabet.len() as u64;

    let mut dividend: Vec<u64> = bytes
        .chunks(2)
        .map(|pair| {
            let hi = u64::from(pair[0]) << 8;
            let lo = pair.get(1).copied().map(u64::from).unwrap_or(0);
            hi | lo
        })
        .collect();

    let mut remainders = Vec::new();
    while !dividend.is_empty() {
        let mut quotient = Vec::with_capacity(dividend.len());
        let mut carry = 0u64;
        for &word in &dividend {
            let x = (carry << 16) + word;
            let q = x / divisor;
            carry = x - q * divisor;
            if !quotient.is_empty() || q > 0 {
                quotient.push(q);
            }
        }
        remainders.push(carry);
        dividend = quotient;
    }

    remainders
        .iter()
        .rev()
        .map(|&r| alphabet[r as usize])
        .collect()
}
