//! Leetspeak obfuscation, applied before hashing, after hashing, both, or
//! not at all. Nine graduated substitution tables over the 26 lowercase
//! letters; higher levels are harder to read.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// When the leet pass runs relative to hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeetTiming {
    #[default]
    None,
    BeforeHashing,
    AfterHashing,
    Both,
}

impl LeetTiming {
    pub fn before(self) -> bool {
        matches!(self, LeetTiming::BeforeHashing | LeetTiming::Both)
    }

    pub fn after(self) -> bool {
        matches!(self, LeetTiming::AfterHashing | LeetTiming::Both)
    }

    pub fn name(self) -> &'static str {
        match self {
            LeetTiming::None => "none",
            LeetTiming::BeforeHashing => "before-hashing",
            LeetTiming::AfterHashing => "after-hashing",
            LeetTiming::Both => "both",
        }
    }
}

impl fmt::Display for LeetTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LeetTiming {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s {
            "none" => LeetTiming::None,
            "before-hashing" => LeetTiming::BeforeHashing,
            "after-hashing" => LeetTiming::AfterHashing,
            "both" => LeetTiming::Both,
            _ => bail!("Unknown leet timing {:?}", s),
        })
    }
}

#[rustfmt::skip]
const LEVELS: [[&str; 26]; 9] = [
    ["4", "b", "c", "d", "3", "f", "g", "h", "i", "j", "k", "1", "m",
     "n", "0", "p", "9", "r", "s", "7", "u", "v", "w", "x", "y", "z"],
    ["4", "b", "c", "d", "3", "f", "g", "h", "1", "j", "k", "1", "m",
     "n", "0", "p", "9", "r", "5", "7", "u", "v", "w", "x", "y", "2"],
    ["4", "8", "c", "d", "3", "f", "6", "h", "'", "j", "k", "1", "m",
     "n", "0", "p", "9", "r", "5", "7", "u", "v", "w", "x", "'/", "2"],
    ["@", "8", "c", "d", "3", "f", "6", "h", "'", "j", "k", "1", "m",
     "n", "0", "p", "9", "r", "5", "7", "u", "v", "w", "x", "'/", "2"],
    ["@", "|3", "c", "d", "3", "f", "6", "#", "!", "7", "|<", "1", "m",
     "n", "0", "|>", "9", "|2", "$", "7", "u", "\\/", "w", "x", "'/", "2"],
    ["@", "|3", "c", "|)", "&", "|=", "6", "#", "!", ",|", "|<", "1", "m",
     "n", "0", "|>", "9", "|2", "$", "7", "u", "\\/", "w", "x", "'/", "2"],
    ["@", "|3", "[", "|)", "&", "|=", "6", "#", "!", ",|", "|<", "1", "^^",
     "^/", "0", "|*", "9", "|2", "5", "7", "(_)", "\\/", "\\/\\/", "><", "'/", "2"],
    ["@", "8", "(", "|)", "&", "|=", "6", "|-|", "!", "_|", "|(", "1", "|\\/|",
     "|\\|", "()", "|>", "(,)", "|2", "$", "|", "|_|", "\\/", "\\^/", ")(", "'/", "\"/_"],
    ["@", "8", "(", "|)", "&", "|=", "6", "|-|", "!", "_|", "|{", "|_", "/\\/\\",
     "|\\|", "()", "|>", "(,)", "|2", "$", "|", "|_|", "\\/", "\\^/", ")(", "'/", "\"/_"],
];

/// Rewrite `message` at the given leet level. Negative levels are a
/// passthrough; levels above 8 clamp to the last table (the CLI validates
/// the -1..=8 range up front). The input is lowercased once and every
/// character is mapped through a snapshot of that lowered text, so a token
/// emitted for one letter is never re-substituted by a later rule.
pub fn transform(level: i8, message: &str) -> String {
    if level < 0 {
        return message.to_string();
    }
    let table = &LEVELS[(level as usize).min(LEVELS.len() - 1)];
    let lowered = message.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() {
            out.push_str(table[ch as usize - 'a' as usize]);
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_level_is_passthrough() {
        assert_eq!(transform(-1, "Secret"), "Secret");
        assert_eq!(transform(-1, "MiXeD 123 !"), "MiXeD 123 !");
    }

    #[test]
    fn test_level_zero_classic() {
        assert_eq!(transform(0, "leet"), "1337");
        assert_eq!(transform(0, "password"), "p4ssw0rd");
    }

    #[test]
    fn test_input_is_lowercased_first() {
        assert_eq!(transform(0, "LeEt"), "1337");
        assert_eq!(transform(3, "A"), "@");
    }

    #[test]
    fn test_non_letters_pass_through() {
        assert_eq!(transform(8, "a-1 ø"), "@-1 ø");
    }

    #[test]
    fn test_substitution_uses_a_snapshot() {
        // Level 1 maps both i and l to "1"; a second pass over the output
        // would find no letters left to rewrite, but the point is that
        // tokens are emitted from the original text only.
        assert_eq!(transform(1, "il"), "11");
        // "7" produced for j at level 4 must not trip the t rule.
        assert_eq!(transform(4, "jt"), "77");
    }

    #[test]
    fn test_highest_level_tokens() {
        assert_eq!(transform(8, "mz"), "/\\/\\\"/_");
        assert_eq!(transform(7, "kv"), "|(\\/");
    }

    #[test]
    fn test_all_levels_cover_alphabet() {
        let alphabet = "abcdefghijklmnopqrstuvwxyz";
        for level in 0..=8 {
            let out = transform(level, alphabet);
            assert!(!out.is_empty());
            assert_eq!(out, transform(level, alphabet));
        }
    }
}
