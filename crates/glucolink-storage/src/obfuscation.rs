// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reversible XOR obfuscation of stored settings values.
//!
//! **This is not encryption.** It only keeps credentials from sitting in the
//! settings file as plain text, which defeats a naive grep and nothing
//! more. Anyone with the file and this source can recover every value.
//! Integrators that need real confidentiality should replace the settings
//! store with an OS keychain or an encrypted vault.
//!
//! Both functions are involutions: applying them twice returns the input,
//! so the same call encodes and decodes.

const CHAR_KEY: u32 = 0x42;
const INT_KEY: i64 = 0x4242_4242;

/// XORs every character's code point with `0x42`.
///
/// Only the low seven bits change, so the result is always a valid `char`
/// (the surrogate range is aligned to 0x800 and cannot be entered).
pub fn obfuscate_str(s: &str) -> String {
    s.chars()
        .map(|c| char::from_u32(c as u32 ^ CHAR_KEY).unwrap_or(c))
        .collect()
}

/// XORs an integer with `0x42424242`.
pub fn obfuscate_i64(n: i64) -> i64 {
    n ^ INT_KEY
}
