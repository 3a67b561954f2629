//! core::codec
//!
//! Wire encoding for typed metadata values.
//!
//! # Overview
//!
//! The metadata service only stores strings. Typed accessors encode their
//! values to a canonical string before sending and decode the string they
//! get back:
//!
//! - Booleans use exactly two literals, `"true"` and `"false"`, read
//!   case-insensitively.
//! - Integers use base-10 decimal text.
//!
//! # Decode Policies
//!
//! The two types deliberately decode under different policies:
//!
//! - [`decode_bool`] treats anything other than the two literals as store
//!   corruption and panics.
//! - [`decode_int`] falls back to the caller's default on malformed text.
//!
//! The non-panicking parsers [`parse_bool`] and [`parse_int`] are exposed
//! for callers that want to inspect a raw value themselves.
//!
//! # Example
//!
//! ```
//! use dirmeta::core::codec::{decode_int, encode_bool, encode_int, parse_bool};
//!
//! assert_eq!(encode_bool(true), "true");
//! assert_eq!(parse_bool("FALSE"), Some(false));
//! assert_eq!(encode_int(-7), "-7");
//! assert_eq!(decode_int(" 42 ", 0), 42);
//! assert_eq!(decode_int("12x", 5), 5);
//! ```

/// Wire literal for `true`.
pub const TRUE_LITERAL: &str = "true";

/// Wire literal for `false`.
pub const FALSE_LITERAL: &str = "false";

/// Encode a boolean as its wire literal.
pub fn encode_bool(value: bool) -> &'static str {
    if value {
        TRUE_LITERAL
    } else {
        FALSE_LITERAL
    }
}

/// Parse a wire literal into a boolean.
///
/// Matching is ASCII case-insensitive. Surrounding whitespace is not
/// accepted.
pub fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case(TRUE_LITERAL) {
        Some(true)
    } else if text.eq_ignore_ascii_case(FALSE_LITERAL) {
        Some(false)
    } else {
        None
    }
}

/// Decode a boolean read back from the metadata store.
///
/// # Panics
///
/// Panics if `text` is neither wire literal. A boolean key holding any
/// other value means the store is corrupt.
pub fn decode_bool(text: &str) -> bool {
    match parse_bool(text) {
        Some(value) => value,
        None => panic!(
            "boolean metadata with value other than true or false: {:?}",
            text
        ),
    }
}

/// Encode an integer as base-10 text.
pub fn encode_int(value: i32) -> String {
    value.to_string()
}

/// Parse base-10 text into an integer.
///
/// Leading and trailing ASCII whitespace is ignored and an optional sign is
/// accepted. Any other character, an empty string, or a value outside the
/// `i32` range yields `None`.
pub fn parse_int(text: &str) -> Option<i32> {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
        .parse::<i32>()
        .ok()
}

/// Decode an integer read back from the metadata store.
///
/// Malformed text yields `default`.
pub fn decode_int(text: &str, default: i32) -> i32 {
    parse_int(text).unwrap_or(default)
}
