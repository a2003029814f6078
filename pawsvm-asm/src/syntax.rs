//! Token-level rules of the assembly language.
//!
//! A token counts as a register only when it is `pc`, `sp`, `acc`, or `r`
//! followed by a digit. Other identifiers that start with `r`, such as
//! `result`, are labels. An unknown `r<digit>` token such as `r13` is an
//! illegal register, and register-shaped names cannot be defined as labels.

use pawsvm_core::Register;

pub const COMMENT_CHAR: char = ';';
pub const LABEL_SUFFIX: char = ':';
pub const IMMEDIATE_PREFIX: char = '#';
pub const SECTION_PREFIX: char = '.';
pub const TEXT_SECTION: &str = ".text";
pub const REGISTER_SIGIL: char = 'r';

pub const IMMEDIATE_MIN: i64 = -(1 << 31);
pub const IMMEDIATE_MAX: i64 = u32::MAX as i64;

/// Drops a trailing `;` comment and surrounding whitespace.
pub fn strip_comment(line: &str) -> &str {
    line.split(COMMENT_CHAR).next().unwrap_or_default().trim()
}

pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// The label a line defines, if it is exactly `identifier:`.
pub fn label_definition(line: &str) -> Option<&str> {
    line.strip_suffix(LABEL_SUFFIX)
        .filter(|label| is_identifier(label))
}

/// Whether a token is written as a register: a special register name, or the
/// sigil followed by a digit. It may still name a register that does not exist.
pub fn looks_like_register(token: &str) -> bool {
    matches!(token, "pc" | "sp" | "acc")
        || token
            .strip_prefix(REGISTER_SIGIL)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
}

pub fn parse_register(token: &str) -> Option<Register> {
    Register::from_name(token)
}

/// Parses the text after `#`: decimal, `0x`, `0o` or `0b`, optionally
/// negative, within `[-2^31, 2^32 - 1]`.
pub fn parse_immediate(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let lower = digits.to_ascii_lowercase();
    let (radix, digits) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else {
        (10, lower.as_str())
    };
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    (IMMEDIATE_MIN..=IMMEDIATE_MAX)
        .contains(&value)
        .then_some(value)
}
